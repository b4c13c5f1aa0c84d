/// Database models for ProjectDesk
///
/// Each model owns its SQL: handlers never build statements themselves.
///
/// # Models
///
/// - `user`: accounts, credentials and the global role
/// - `project`: projects and their read-side views
/// - `task`: tasks and their read-side views
/// - `project_member`: user-project memberships
/// - `stats`: aggregate counters for dashboards
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use projectdesk_shared::models::user::{CreateUser, User, UserRole};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::User,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod project_member;
pub mod stats;
pub mod task;
pub mod user;

/// Returned when text does not name a variant of one of the model enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed (e.g. "priority")
    pub kind: &'static str,

    /// The rejected text
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
