use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};
use prep_core::model::QuestionDraft;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub mod ai;
pub mod questions;
pub mod sessions;

pub const HEALTH_TEXT: &str = "Interview Prep AI Backend Running";

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/api/sessions/create", post(sessions::create_session))
        .route("/api/sessions/my-sessions", get(sessions::my_sessions))
        .route(
            "/api/sessions/:id",
            get(sessions::session_by_id).delete(sessions::delete_session),
        )
        .route("/api/questions/add", post(questions::add_questions))
        .route("/api/questions/:id/pin", post(questions::toggle_pin))
        .route("/api/questions/:id/note", post(questions::update_note))
        .route("/api/ai/generate-questions", post(ai::generate_questions))
        .route("/api/ai/generate-explanation", post(ai::generate_explanation))
}

async fn health() -> &'static str {
    HEALTH_TEXT
}

/// Topics arrive either as one comma-separated string or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TopicList {
    Joined(String),
    List(Vec<String>),
}

impl Default for TopicList {
    fn default() -> Self {
        TopicList::List(Vec::new())
    }
}

impl TopicList {
    #[must_use]
    pub fn into_topics(self) -> Vec<String> {
        match self {
            TopicList::Joined(joined) => joined
                .split(',')
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect(),
            TopicList::List(list) => list,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionBody {
    pub question: String,
    pub answer: String,
}

impl From<QuestionBody> for QuestionDraft {
    fn from(body: QuestionBody) -> Self {
        QuestionDraft::new(body.question, body.answer)
    }
}

fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid id: {raw}")))
}
