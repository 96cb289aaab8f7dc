use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use services::QuestionRequest;

use super::TopicList;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use crate::views::{GeneratedPayload, success};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateQuestionsBody {
    pub role: String,
    pub experience: String,
    pub topics_to_focus: TopicList,
    pub number_of_questions: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExplanationBody {
    pub question: String,
}

pub async fn generate_questions(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<GenerateQuestionsBody>,
) -> Result<Response, ApiError> {
    let request = QuestionRequest::new(
        body.role,
        body.experience,
        body.topics_to_focus.into_topics(),
        body.number_of_questions,
    )?;
    let data = state.ai.generate_questions(&request).await?;
    Ok(success(GeneratedPayload { data }).into_response())
}

pub async fn generate_explanation(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<ExplanationBody>,
) -> Result<Response, ApiError> {
    let explanation = state.ai.explain_concept(&body.question).await?;
    Ok(success(explanation).into_response())
}
