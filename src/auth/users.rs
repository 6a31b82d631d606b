use chrono::Utc;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub is_staff: bool,
}

/// Stores a new user. Usernames are unique regardless of case.
pub fn create_user(state: &AppState, new: NewUser) -> Result<User, AppError> {
    let username = new.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("username cannot be empty".to_string()));
    }

    let password_hash = hash_password(&new.password)?;

    let user = User {
        id: Uuid::new_v4(),
        username,
        email: new.email,
        first_name: new.first_name,
        last_name: new.last_name,
        phone_number: new.phone_number,
        role: new.role,
        is_staff: new.is_staff,
        date_joined: Utc::now(),
        password_hash,
    };

    match state.usernames.entry(user.username.to_lowercase()) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }
        Entry::Vacant(slot) => {
            slot.insert(user.id);
        }
    }

    state.users.insert(user.id, user.clone());
    tracing::info!(user_id = %user.id, role = ?user.role, "user created");

    Ok(user)
}

pub fn username_taken(state: &AppState, username: &str) -> bool {
    state
        .usernames
        .contains_key(&username.trim().to_lowercase())
}

/// Looks the user up by username and checks the password.
pub fn authenticate(state: &AppState, username: &str, password: &str) -> Option<User> {
    let user_id = *state.usernames.get(&username.trim().to_lowercase())?;
    let user = state.users.get(&user_id)?.value().clone();

    verify_password(password, &user.password_hash).then_some(user)
}
