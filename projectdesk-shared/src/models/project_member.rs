/// Project membership model and database operations
///
/// Many-to-many link between users and projects. A user appears at most once
/// per project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     project_id INTEGER NOT NULL REFERENCES projects(id),
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     role TEXT NOT NULL DEFAULT 'member',
///     joined_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     UNIQUE (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **manager**: the project's manager, enrolled automatically on creation
/// - **member**: everyone added afterwards unless told otherwise
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::project_member::{CreateProjectMember, MemberRole, ProjectMember};
/// use projectdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let membership = ProjectMember::create(&pool, CreateProjectMember {
///     project_id: 1,
///     user_id: 2,
///     role: MemberRole::Member,
/// }).await?;
///
/// let members = ProjectMember::list_for_project(&pool, 1).await?;
/// # Ok(())
/// # }
/// ```

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::UnknownVariant;

/// Role within a single project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Manager,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Manager => "manager",
        }
    }
}

impl FromStr for MemberRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(MemberRole::Member),
            "manager" => Ok(MemberRole::Manager),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
    pub joined_at: NaiveDateTime,
}

/// Member listing entry: the user's identity plus their project role
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberDetail {
    /// User id
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub joined_at: NaiveDateTime,
}

/// Input for adding a user to a project
#[derive(Debug, Clone)]
pub struct CreateProjectMember {
    pub project_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
}

impl ProjectMember {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// - unique violation if the user is already a member
    /// - foreign key violation if the project or user does not exist
    pub async fn create(pool: &SqlitePool, data: CreateProjectMember) -> Result<Self, sqlx::Error> {
        let id = sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES (?, ?, ?)")
            .bind(data.project_id)
            .bind(data.user_id)
            .bind(data.role)
            .execute(pool)
            .await?
            .last_insert_rowid();

        sqlx::query_as::<_, ProjectMember>(
            "SELECT id, project_id, user_id, role, joined_at FROM project_members WHERE id = ?",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = ? AND user_id = ?
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Members of a project in the order they joined
    pub async fn list_for_project(
        pool: &SqlitePool,
        project_id: i64,
    ) -> Result<Vec<MemberDetail>, sqlx::Error> {
        sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT u.id, u.name, u.email, pm.role, pm.joined_at
            FROM project_members pm
            INNER JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = ?
            ORDER BY pm.joined_at, pm.id
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_project(pool: &SqlitePool, project_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_members WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
