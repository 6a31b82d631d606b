//! Token and session authentication.
//!
//! Protected handlers take an [`AuthUser`]. A request is authenticated by an
//! `Authorization: Token <key>` header or, failing that, by a `sessionid`
//! cookie. A `Token` header that does not resolve is rejected outright
//! instead of falling through to the cookie.

pub mod password;
pub mod tokens;
pub mod users;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::debug;

use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

const TOKEN_KEYWORD: &str = "Token";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
            let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
            let mut words = value.split_whitespace();

            if words.next() == Some(TOKEN_KEYWORD) {
                let (Some(key), None) = (words.next(), words.next()) else {
                    debug!("malformed token header");
                    return Err(AppError::Unauthorized);
                };

                return match tokens::user_for_token(state, key) {
                    Some(user) => Ok(AuthUser(user)),
                    None => {
                        debug!("unknown api token");
                        Err(AppError::Unauthorized)
                    }
                };
            }
        }

        if let Some(secret) = tokens::session_from_cookies(&parts.headers) {
            if let Some(user) = tokens::user_for_session(state, &secret) {
                return Ok(AuthUser(user));
            }
            debug!("stale or unknown session cookie");
        }

        Err(AppError::Unauthorized)
    }
}
