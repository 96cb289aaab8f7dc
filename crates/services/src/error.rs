//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{QuestionId, QuestionValidationError, SessionId, SessionValidationError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the AI generation gateway.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI gateway is not configured")]
    NotConfigured,
    #[error("{0}")]
    InvalidRequest(&'static str),
    #[error("API quota exceeded")]
    QuotaExceeded { payload: String },
    #[error("AI provider rejected the API key (status {status})")]
    Auth { status: reqwest::StatusCode },
    #[error("AI provider timed out")]
    Timeout,
    #[error("AI provider request failed with status {status}")]
    Upstream {
        status: reqwest::StatusCode,
        payload: String,
    },
    #[error("AI returned invalid JSON: {reason}")]
    MalformedResponse { raw: String, reason: String },
    #[error("AI provider unreachable: {0}")]
    Transport(String),
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

impl AiError {
    /// Whether a later retry of the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::QuotaExceeded { .. } | AiError::Timeout | AiError::Transport(_)
        )
    }
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error(transparent)]
    InvalidSession(#[from] SessionValidationError),
    #[error(transparent)]
    InvalidQuestion(#[from] QuestionValidationError),
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),
    #[error("not authorized to modify this session")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionServiceError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionServiceError::InvalidSession(_) | SessionServiceError::InvalidQuestion(_)
        )
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SessionServiceError::SessionNotFound(_) | SessionServiceError::QuestionNotFound(_)
        )
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Ai(#[from] AiError),
}
