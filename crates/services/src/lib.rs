#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod error;
pub mod session_service;
pub mod session_view;

pub use prep_core::Clock;

pub use ai::{AiConfig, AiGateway, ConceptExplanation, GeneratedQuestion, QuestionRequest};
pub use app_services::AppServices;
pub use error::{AiError, AppServicesError, SessionServiceError};
pub use session_service::SessionService;
pub use session_view::SessionDetail;
