use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::auth::AuthUser;
use crate::auth::password::password_problems;
use crate::auth::tokens::{
    end_session, expired_session_cookie, issue_token, revoke_token, session_cookie,
    session_from_cookies, start_session,
};
use crate::auth::users::{NewUser, authenticate, create_user, username_taken};
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::schema::{Field, FieldError, FieldErrors, FieldKind, validate};
use crate::state::AppState;

const fn text(
    name: &'static str,
    title: &'static str,
    required: bool,
    min_length: usize,
    max_length: usize,
) -> Field {
    Field {
        name,
        title,
        description: None,
        required,
        kind: FieldKind::Text {
            min_length,
            max_length,
        },
    }
}

pub const LOGIN_FIELDS: &[Field] = &[
    text("username", "Username", true, 1, 150),
    text("password", "Password", true, 1, 128),
];

/// `role` is checked separately since it is a choice, not free text.
pub const REGISTRATION_FIELDS: &[Field] = &[
    text("username", "Username", true, 1, 150),
    text("email", "Email address", false, 0, 254),
    text("password1", "Password", true, 1, 128),
    text("password2", "Password confirmation", true, 1, 128),
    text("first_name", "First name", false, 0, 150),
    text("last_name", "Last name", false, 0, 150),
    text("phone_number", "Phone number", false, 0, 32),
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rest-auth/login/", post(login))
        .route("/rest-auth/logout/", post(logout))
        .route("/rest-auth/user/", get(current_user))
        .route("/rest-auth/registration/", post(register))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct KeyResponse {
    pub key: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    validate(LOGIN_FIELDS, &payload).map_err(AppError::Validation)?;
    let payload: LoginRequest = serde_json::from_value(payload)
        .map_err(|err| AppError::BadRequest(format!("invalid login: {err}")))?;

    let Some(user) = authenticate(&state, &payload.username, &payload.password) else {
        state.metrics.logins_total.with_label_values(&["failure"]).inc();
        return Err(AppError::Validation(single_error(
            "non_field_errors",
            "Unable to log in with provided credentials.",
        )));
    };

    let key = issue_token(&state, user.id);
    let secret = start_session(&state, user.id);
    state.metrics.logins_total.with_label_values(&["success"]).inc();
    info!(user_id = %user.id, "user logged in");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&secret, state.config.session_ttl_hours),
        )],
        Json(KeyResponse { key }),
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(AuthUser(user)) = user {
        revoke_token(&state, user.id);
        info!(user_id = %user.id, "user logged out");
    }
    if let Some(secret) = session_from_cookies(&headers) {
        end_session(&state, &secret);
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "detail": "Successfully logged out." })),
    )
}

async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<KeyResponse>), AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let mut errors = validate(REGISTRATION_FIELDS, &payload).err().unwrap_or_default();
    if let Some(role) = payload.get("role") {
        if serde_json::from_value::<Role>(role.clone()).is_err() {
            add_error(&mut errors, "role", &format!("{role} is not a valid choice."));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let payload: RegistrationRequest = serde_json::from_value(payload)
        .map_err(|err| AppError::BadRequest(format!("invalid registration: {err}")))?;

    let username = payload.username.trim();
    if username_taken(&state, username) {
        add_error(
            &mut errors,
            "username",
            "A user with that username already exists.",
        );
    }

    if !payload.email.is_empty() && !looks_like_email(&payload.email) {
        add_error(&mut errors, "email", "Enter a valid email address.");
    }

    for problem in password_problems(&payload.password1, username, &payload.email) {
        add_error(&mut errors, "password1", &problem);
    }

    if payload.password1 != payload.password2 {
        add_error(
            &mut errors,
            "non_field_errors",
            "The two password fields didn't match.",
        );
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user = create_user(
        &state,
        NewUser {
            username: username.to_string(),
            password: payload.password1,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
            role: payload.role,
            is_staff: false,
        },
    )?;

    let key = issue_token(&state, user.id);
    Ok((StatusCode::CREATED, Json(KeyResponse { key })))
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

fn add_error(errors: &mut FieldErrors, field: &str, message: &str) {
    let entry = errors
        .entry(field.to_string())
        .or_insert_with(|| FieldError::Messages(Vec::new()));
    if let FieldError::Messages(messages) = entry {
        messages.push(message.to_string());
    }
}

fn single_error(field: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    add_error(&mut errors, field, message);
    errors
}
