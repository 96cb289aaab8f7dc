//! Bearer-token authentication.
//!
//! Token issuance lives outside this service; the table only maps presented
//! tokens to the user ids they were issued for.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use prep_core::model::UserId;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolves a bearer token to the identity it belongs to.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<UserId>;
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TokenTableError {
    #[error("auth token entry {0:?} must look like user:token")]
    MalformedEntry(String),
}

/// Static token table parsed from `user:token,user:token`.
///
/// Only SHA-256 digests of the tokens are kept in memory.
#[derive(Debug, Default, Clone)]
pub struct TokenTable {
    digests: HashMap<String, UserId>,
}

impl TokenTable {
    /// # Errors
    ///
    /// Returns `TokenTableError::MalformedEntry` for an entry without a user or a token.
    pub fn parse(raw: &str) -> Result<Self, TokenTableError> {
        let mut table = Self::default();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let malformed = || TokenTableError::MalformedEntry(entry.to_owned());
            let (user, token) = entry.split_once(':').ok_or_else(malformed)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(malformed());
            }
            let user = UserId::new(user).map_err(|_| malformed())?;
            table.insert(user, token);
        }
        Ok(table)
    }

    pub fn insert(&mut self, user: UserId, token: &str) {
        self.digests.insert(digest(token), user);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl Authenticator for TokenTable {
    fn authenticate(&self, token: &str) -> Option<UserId> {
        self.digests.get(&digest(token)).cloned()
    }
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// The caller's identity, required by every protected handler.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    debug!(error = %e, "missing or malformed bearer token");
                    ApiError::Unauthorized
                })?;

        state
            .auth
            .authenticate(bearer.token())
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_resolves_tokens() {
        let table = TokenTable::parse(" alice:tok-a , bob:tok-b,").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.authenticate("tok-a").unwrap().as_str(), "alice");
        assert_eq!(table.authenticate("tok-b").unwrap().as_str(), "bob");
        assert!(table.authenticate("tok-c").is_none());
    }

    #[test]
    fn rejects_incomplete_entries() {
        assert!(matches!(
            TokenTable::parse("alice"),
            Err(TokenTableError::MalformedEntry(_))
        ));
        assert!(TokenTable::parse("alice:").is_err());
        assert!(TokenTable::parse(":tok").is_err());
        assert!(TokenTable::parse("").unwrap().is_empty());
    }

    #[test]
    fn stores_digests_not_tokens() {
        let table = TokenTable::parse("alice:super-secret").unwrap();
        assert!(table.digests.keys().all(|k| k.len() == 64 && k != "super-secret"));
    }
}
