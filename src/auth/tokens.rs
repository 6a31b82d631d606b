use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::user::User;
use crate::state::{AppState, Session};

pub const SESSION_COOKIE: &str = "sessionid";

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Hashes a session secret with SHA256 for storage.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Returns the user's API token, creating one on first use.
pub fn issue_token(state: &AppState, user_id: Uuid) -> String {
    state
        .user_tokens
        .entry(user_id)
        .or_insert_with(|| {
            let key: String = random_bytes::<20>()
                .iter()
                .map(|byte| format!("{byte:02x}"))
                .collect();
            state.tokens.insert(key.clone(), user_id);
            key
        })
        .value()
        .clone()
}

pub fn revoke_token(state: &AppState, user_id: Uuid) {
    if let Some((_, key)) = state.user_tokens.remove(&user_id) {
        state.tokens.remove(&key);
    }
}

pub fn user_for_token(state: &AppState, key: &str) -> Option<User> {
    let user_id = *state.tokens.get(key)?;
    state.users.get(&user_id).map(|user| user.value().clone())
}

/// Opens a session and returns the raw cookie value. Only its hash is kept.
pub fn start_session(state: &AppState, user_id: Uuid) -> String {
    let secret = URL_SAFE_NO_PAD.encode(random_bytes::<32>());
    let session = Session {
        user_id,
        expires_at: Utc::now() + Duration::hours(state.config.session_ttl_hours),
    };
    state.sessions.insert(hash_secret(&secret), session);
    secret
}

pub fn end_session(state: &AppState, secret: &str) {
    state.sessions.remove(&hash_secret(secret));
}

pub fn user_for_session(state: &AppState, secret: &str) -> Option<User> {
    let hash = hash_secret(secret);
    let user_id = {
        let session = state.sessions.get(&hash)?;
        if session.expires_at < Utc::now() {
            None
        } else {
            Some(session.user_id)
        }
    };

    let Some(user_id) = user_id else {
        state.sessions.remove(&hash);
        return None;
    };

    state.users.get(&user_id).map(|user| user.value().clone())
}

pub fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

pub fn session_cookie(secret: &str, ttl_hours: i64) -> String {
    format!(
        "{SESSION_COOKIE}={secret}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl_hours * 3600
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}
