use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::models::package::Package;
use crate::models::user::User;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub struct AppState {
    pub config: Config,
    pub users: DashMap<Uuid, User>,
    /// Lowercased username to user id.
    pub usernames: DashMap<String, Uuid>,
    /// API token key to user id.
    pub tokens: DashMap<String, Uuid>,
    /// User id to that user's single API token key.
    pub user_tokens: DashMap<Uuid, String>,
    /// SHA-256 of the session cookie value to session.
    pub sessions: DashMap<String, Session>,
    pub packages: DashMap<Uuid, Package>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            users: DashMap::new(),
            usernames: DashMap::new(),
            tokens: DashMap::new(),
            user_tokens: DashMap::new(),
            sessions: DashMap::new(),
            packages: DashMap::new(),
            metrics: Metrics::new(),
        }
    }

    /// Packages accepted by `predicate`, oldest first.
    pub fn packages_matching<F>(&self, predicate: F) -> Vec<Package>
    where
        F: Fn(&Package) -> bool,
    {
        let mut packages: Vec<Package> = self
            .packages
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        packages.sort_by_key(|package| (package.created_at, package.id));
        packages
    }
}
