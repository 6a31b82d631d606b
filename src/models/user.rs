use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Sender,
    Courier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl User {
    pub fn is_sender(&self) -> bool {
        self.role == Role::Sender
    }
}
