use std::sync::Arc;

use services::{AiGateway, AppServices, SessionService};

use crate::auth::Authenticator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub ai: Arc<AiGateway>,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    #[must_use]
    pub fn new(services: &AppServices, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            sessions: services.sessions(),
            ai: services.ai(),
            auth,
        }
    }
}
