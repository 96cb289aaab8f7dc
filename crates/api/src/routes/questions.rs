use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prep_core::model::{QuestionDraft, QuestionId, SessionId};
use serde::Deserialize;

use super::{QuestionBody, parse_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use crate::views::{QuestionPayload, QuestionsPayload, success};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionsBody {
    pub session_id: String,
    pub questions: Vec<QuestionBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteBody {
    pub note: Option<String>,
}

impl NoteBody {
    /// An empty body clears the note, like an absent `note` field.
    fn from_bytes(raw: &[u8]) -> Result<Self, ApiError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

pub async fn add_questions(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<AddQuestionsBody>,
) -> Result<Response, ApiError> {
    let session_id: SessionId = parse_id(&body.session_id)?;
    let drafts = body.questions.into_iter().map(QuestionDraft::from).collect();

    let questions = state.sessions.append_questions(session_id, drafts).await?;
    Ok((StatusCode::CREATED, success(QuestionsPayload { questions })).into_response())
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: QuestionId = parse_id(&id)?;
    let question = state.sessions.toggle_pin(id).await?;
    Ok(success(QuestionPayload { question }).into_response())
}

pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id: QuestionId = parse_id(&id)?;
    let body = NoteBody::from_bytes(&body)?;
    let question = state.sessions.set_note(id, body.note).await?;
    Ok(success(QuestionPayload { question }).into_response())
}
