/// API route handlers
///
/// Handlers only translate HTTP to service calls; every rule lives in
/// `workboard_shared::services`.
///
/// - `health`: store liveness
/// - `auth`: signup, login, refresh
/// - `users`: the caller's profile
/// - `organizations`: organizations and invitations
/// - `projects`, `tasks`, `comments`, `tags`: the work hierarchy
/// - `audit`: audit log queries

pub mod audit;
pub mod auth;
pub mod comments;
pub mod health;
pub mod organizations;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod users;

use serde::Serialize;

/// Body of delete-style endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
