use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use services::AiConfig;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub db_url: String,
    pub cors_origin: Option<String>,
    pub auth_tokens: String,
    pub ai: Option<AiConfig>,
}

impl Config {
    pub const DEFAULT_PORT: &'static str = "5000";
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0";
    pub const DEFAULT_DB_URL: &'static str = "sqlite:interview_prep.sqlite3?mode=rwc";

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but unparsable.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = try_load(&lookup, "PORT", Self::DEFAULT_PORT)?;
        let bind_addr = try_load(&lookup, "PREP_BIND_ADDR", Self::DEFAULT_BIND_ADDR)?;
        let db_url = non_blank(&lookup, "PREP_DB_URL")
            .unwrap_or_else(|| Self::DEFAULT_DB_URL.to_owned());
        let cors_origin = non_blank(&lookup, "PREP_CORS_ORIGIN");
        let auth_tokens = lookup("PREP_AUTH_TOKENS").unwrap_or_default();

        Ok(Self {
            bind_addr,
            port,
            db_url,
            cors_origin,
            auth_tokens,
            ai: ai_config(&lookup)?,
        })
    }
}

fn ai_config(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<AiConfig>, ConfigError> {
    let Some(api_key) = non_blank(lookup, "PREP_AI_API_KEY") else {
        info!("PREP_AI_API_KEY not set, AI generation disabled");
        return Ok(None);
    };

    let mut config = AiConfig::new(api_key);
    if let Some(base_url) = non_blank(lookup, "PREP_AI_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(model) = non_blank(lookup, "PREP_AI_MODEL") {
        config.model = model;
    }
    let secs: u64 = try_load(lookup, "PREP_AI_TIMEOUT_SECS", "15")?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "PREP_AI_TIMEOUT_SECS",
            value: secs.to_string(),
            reason: "must be positive".into(),
        });
    }
    config.timeout = Duration::from_secs(secs);
    Ok(Some(config))
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = non_blank(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    match value.parse() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
