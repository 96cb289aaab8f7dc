//! HTTP boundary for the interview prep service.
//!
//! Every route except the health check requires a bearer token. Handlers
//! resolve the caller, call into `services`, and wrap the result in the
//! `{success, ...}` envelope.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use services::{AppServices, AppServicesError, Clock};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod views;

use auth::{TokenTable, TokenTableError};
use config::{Config, ConfigError};
use state::AppState;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    AuthTokens(#[from] TokenTableError),
    #[error("invalid PREP_CORS_ORIGIN: {0}")]
    CorsOrigin(#[from] axum::http::header::InvalidHeaderValue),
    #[error(transparent)]
    Services(#[from] AppServicesError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Build the application router with CORS and request tracing.
///
/// # Errors
///
/// Returns `StartupError::CorsOrigin` if `cors_origin` is not a valid header value.
pub fn router(state: AppState, cors_origin: Option<&str>) -> Result<Router, StartupError> {
    let origin = match cors_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Ok(routes::api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Load configuration, open storage, and serve until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns `StartupError` if configuration, storage, or binding fails.
pub async fn start_server() -> Result<(), StartupError> {
    let dotenv = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::load()?;

    info!("Opening storage at {}", config.db_url);
    let services =
        AppServices::new_sqlite(&config.db_url, Clock::default_clock(), config.ai.clone()).await?;
    if !services.ai().enabled() {
        warn!("AI routes will answer 503 until PREP_AI_API_KEY is set");
    }

    let tokens = TokenTable::parse(&config.auth_tokens)?;
    if tokens.is_empty() {
        warn!("PREP_AUTH_TOKENS is empty, every protected route will answer 401");
    }
    let state = AppState::new(&services, Arc::new(tokens));
    let app = router(state, config.cors_origin.as_deref())?;

    let address = SocketAddr::new(config.bind_addr, config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
