use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::ai::{AiConfig, AiGateway};
use crate::error::AppServicesError;
use crate::session_service::SessionService;

/// Assembles the services the HTTP layer depends on.
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<SessionService>,
    ai: Arc<AiGateway>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or AI client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        ai: Option<AiConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock, ai)
    }

    /// Build services backed by in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Ai` if the AI client cannot be built.
    pub fn in_memory(clock: Clock, ai: Option<AiConfig>) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock, ai)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Ai` if the AI client cannot be built.
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        ai: Option<AiConfig>,
    ) -> Result<Self, AppServicesError> {
        let sessions = Arc::new(SessionService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.questions),
        ));
        let ai = Arc::new(AiGateway::new(ai)?);
        Ok(Self { sessions, ai })
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn ai(&self) -> Arc<AiGateway> {
        Arc::clone(&self.ai)
    }
}
