//! Response bodies.

use chrono::{DateTime, Utc};
use prep_core::model::{ExperienceLevel, Question, SessionId, UserId};
use serde::Serialize;
use services::{GeneratedQuestion, SessionDetail};

/// Success envelope: `{"success": true, ...payload}`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

pub fn success<T: Serialize>(payload: T) -> axum::Json<Success<T>> {
    axum::Json(Success {
        success: true,
        payload,
    })
}

/// A session with its question references resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView<'a> {
    id: SessionId,
    user: &'a UserId,
    role: &'a str,
    experience_level: ExperienceLevel,
    topics_to_focus_on: &'a [String],
    description: &'a str,
    questions: &'a [Question],
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a SessionDetail> for SessionView<'a> {
    fn from(detail: &'a SessionDetail) -> Self {
        let session = &detail.session;
        Self {
            id: session.id(),
            user: session.owner(),
            role: session.role(),
            experience_level: session.experience_level(),
            topics_to_focus_on: session.topics(),
            description: session.description(),
            questions: &detail.questions,
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionPayload<'a> {
    pub session: SessionView<'a>,
}

#[derive(Debug, Serialize)]
pub struct SessionsPayload<'a> {
    pub sessions: Vec<SessionView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuestionPayload {
    pub question: Question,
}

#[derive(Debug, Serialize)]
pub struct QuestionsPayload {
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedPayload {
    pub data: Vec<GeneratedQuestion>,
}
