/// Bootstrap data
///
/// A fresh install needs one administrator to create everyone else. The
/// account is inserted only when its email is not registered yet, so
/// restarting never resets a changed password.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::password::{hash_password, PasswordError};
use crate::models::user::{CreateUser, User, UserRole};

/// Credentials of the default administrator
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            name: "Administrador".to_string(),
            email: "admin@projeto.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// Error type for seeding
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Creates the administrator if missing
///
/// Returns true when a new account was inserted.
pub async fn ensure_admin_user(pool: &SqlitePool, seed: &AdminSeed) -> Result<bool, SeedError> {
    let email = seed.email.trim().to_lowercase();

    if User::find_by_email(pool, &email).await?.is_some() {
        debug!(email = %email, "Administrator already present");
        return Ok(false);
    }

    let admin = User::create(
        pool,
        CreateUser {
            name: seed.name.clone(),
            email,
            password_hash: hash_password(&seed.password)?,
            role: UserRole::Admin,
        },
    )
    .await?;

    info!(user_id = admin.id, email = %admin.email, "Default administrator created");
    Ok(true)
}
