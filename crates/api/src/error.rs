use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use services::{AiError, SessionServiceError};
use thiserror::Error;
use tracing::{error, warn};

/// Everything a handler can fail with. Converted to the failure envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Not authorized")]
    Unauthorized,
    #[error(transparent)]
    Session(#[from] SessionServiceError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the failure envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

impl Failure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
            raw: None,
        }
    }

    fn with_error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }
}

/// Upstream bodies are passed through as JSON when they parse, else as text.
fn upstream_payload(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_owned()))
}

impl ApiError {
    fn parts(&self) -> (StatusCode, Failure) {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, Failure::new(message)),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, Failure::new("Not authorized")),
            ApiError::Session(e) => session_parts(e),
            ApiError::Ai(e) => ai_parts(e),
        }
    }
}

fn session_parts(e: &SessionServiceError) -> (StatusCode, Failure) {
    match e {
        SessionServiceError::InvalidSession(_) | SessionServiceError::InvalidQuestion(_) => {
            (StatusCode::BAD_REQUEST, Failure::new(e.to_string()))
        }
        SessionServiceError::SessionNotFound(_) => {
            (StatusCode::NOT_FOUND, Failure::new("Session not found"))
        }
        SessionServiceError::QuestionNotFound(_) => {
            (StatusCode::NOT_FOUND, Failure::new("Question not found"))
        }
        SessionServiceError::Forbidden => (StatusCode::FORBIDDEN, Failure::new("Not authorized")),
        other => {
            error!(error = %other, "session operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Failure::new("Server error").with_error(Value::String(other.to_string())),
            )
        }
    }
}

fn ai_parts(e: &AiError) -> (StatusCode, Failure) {
    match e {
        AiError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, Failure::new(*message)),
        AiError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            Failure::new("AI generation is not configured"),
        ),
        AiError::QuotaExceeded { payload } => (
            StatusCode::TOO_MANY_REQUESTS,
            Failure::new("API quota exceeded").with_error(upstream_payload(payload)),
        ),
        AiError::Auth { .. } => (
            StatusCode::UNAUTHORIZED,
            Failure::new("Invalid AI provider API key"),
        ),
        AiError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            Failure::new("AI provider timed out"),
        ),
        AiError::Upstream { payload, .. } => (
            StatusCode::BAD_GATEWAY,
            Failure::new("AI provider error").with_error(upstream_payload(payload)),
        ),
        AiError::Transport(message) => (
            StatusCode::BAD_GATEWAY,
            Failure::new("AI provider error").with_error(Value::String(message.clone())),
        ),
        AiError::MalformedResponse { raw, .. } => {
            let mut failure = Failure::new("AI returned invalid JSON");
            failure.raw = Some(raw.clone());
            (StatusCode::BAD_GATEWAY, failure)
        }
        other => {
            error!(error = %other, "AI gateway failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Failure::new("Server error").with_error(Value::String(other.to_string())),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        if status.is_client_error() {
            warn!(status = %status, message = %body.message, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}
