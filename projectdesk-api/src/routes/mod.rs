/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: health check and liveness probe
/// - `auth`: registration, login, token verification
/// - `projects`: projects and their members
/// - `tasks`: tasks and task statistics
/// - `users`: user administration and per-user views

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Confirmation body for operations that return no resource
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route")
}
