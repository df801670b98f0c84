//! Bearer-session extraction for authenticated routes.

use super::AppState;
use crate::{auth::User, errors::Error};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

/// The signed-in admin behind the request's bearer token.
///
/// The token is checked against the auth service on every request; a missing,
/// unknown or expired token rejects with `401`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Resolved account
    pub user: User,
    /// The raw bearer token
    pub access_token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
        let user = state
            .auth
            .current_user(token)
            .await?
            .ok_or(Error::Unauthorized)?;

        Ok(Self {
            user,
            access_token: token.to_string(),
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
