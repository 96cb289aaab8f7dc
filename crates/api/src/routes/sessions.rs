use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prep_core::model::{QuestionDraft, SessionDraft, SessionId};
use serde::Deserialize;

use super::{QuestionBody, TopicList, parse_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use crate::views::{MessagePayload, SessionPayload, SessionView, SessionsPayload, success};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateSessionBody {
    pub role: String,
    pub experience_level: String,
    pub topics_to_focus_on: TopicList,
    pub description: Option<String>,
    pub questions: Vec<QuestionBody>,
}

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateSessionBody>,
) -> Result<Response, ApiError> {
    let draft = SessionDraft {
        role: body.role,
        experience_level: body.experience_level,
        topics: body.topics_to_focus_on.into_topics(),
        description: body.description,
    };
    let initial = body.questions.into_iter().map(QuestionDraft::from).collect();

    let detail = state.sessions.create_session(&user, draft, initial).await?;
    let session = SessionView::from(&detail);
    Ok((StatusCode::CREATED, success(SessionPayload { session })).into_response())
}

pub async fn my_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, ApiError> {
    let details = state.sessions.list_sessions(&user).await?;
    let sessions = details.iter().map(SessionView::from).collect();
    Ok(success(SessionsPayload { sessions }).into_response())
}

pub async fn session_by_id(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: SessionId = parse_id(&id)?;
    let detail = state.sessions.session_detail(id).await?;
    let session = SessionView::from(&detail);
    Ok(success(SessionPayload { session }).into_response())
}

pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: SessionId = parse_id(&id)?;
    state.sessions.delete_session(id, &user).await?;
    Ok(success(MessagePayload {
        message: "Session deleted",
    })
    .into_response())
}
