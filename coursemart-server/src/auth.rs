//! Bearer-token check for administrative routes.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The set of bearer tokens allowed to mutate events.
///
/// An empty set accepts nobody.
#[derive(Debug, Clone, Default)]
pub struct AdminTokens(Arc<HashSet<String>>);

impl AdminTokens {
    /// Parse a comma-separated token list, ignoring blank entries.
    pub fn parse(raw: &str) -> Self {
        Self(Arc::new(
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }

    /// Whether `token` is in the set.
    pub fn accepts(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// `true` when no token is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Proof that the request carried an accepted bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingToken)?;

        if state.admin_tokens().accepts(token) {
            Ok(Self)
        } else {
            debug!("[auth] rejected unknown bearer token");
            Err(ApiError::InvalidToken)
        }
    }
}
