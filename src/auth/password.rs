use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "password", "password1", "password123",
    "qwerty", "qwertyui", "qwerty123", "abc123", "abcdefgh", "iloveyou", "11111111", "00000000",
    "letmein", "letmein1", "welcome", "welcome1", "monkey", "dragon", "sunshine", "princess",
    "football", "baseball", "superman", "trustno1", "passw0rd", "master", "changeme",
    "starwars", "whatever", "admin123", "salasana", "qwertyuiop", "1q2w3e4r",
];

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Runs the password validators, returning every complaint.
pub fn password_problems(password: &str, username: &str, email: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let lowered = password.to_lowercase();

    if too_similar(&lowered, username) {
        problems.push("The password is too similar to the username.".to_string());
    } else if too_similar(&lowered, email.split('@').next().unwrap_or_default()) {
        problems.push("The password is too similar to the email address.".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }

    if COMMON_PASSWORDS.contains(&lowered.trim()) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

fn too_similar(lowered_password: &str, attribute: &str) -> bool {
    let attribute = attribute.trim().to_lowercase();
    if attribute.chars().count() < 3 {
        return false;
    }
    lowered_password.contains(&attribute) || attribute.contains(lowered_password)
}
