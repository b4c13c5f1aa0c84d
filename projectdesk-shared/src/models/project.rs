/// Project model and database operations
///
/// A project always has exactly one manager (`manager_id`). The manager is
/// also recorded as a `manager` row in `project_members` when the project is
/// created, so membership listings include them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'active',
///     priority TEXT NOT NULL DEFAULT 'medium',
///     start_date TEXT,
///     end_date TEXT,
///     budget REAL,
///     manager_id INTEGER NOT NULL REFERENCES users(id),
///     created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::project_member::MemberRole;
use super::UnknownVariant;

/// Project lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "paused" => Ok(ProjectStatus::Paused),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// Priority shared by projects and tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort rank, higher is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// SQL expression yielding [`Priority::rank`] for a priority column
    pub fn rank_sql(column: &str) -> String {
        let arms: Vec<String> = Priority::ALL
            .iter()
            .map(|priority| format!("WHEN '{}' THEN {}", priority.as_str(), priority.rank()))
            .collect();

        format!("CASE {} {} ELSE 0 END", column, arms.join(" "))
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(UnknownVariant::new("priority", other)),
        }
    }
}

/// Project row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,

    /// ISO date, kept as sent
    pub start_date: Option<String>,
    pub end_date: Option<String>,

    pub budget: Option<f64>,

    /// User responsible for the project
    pub manager_id: i64,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Project list entry with its manager's name and task counters
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,

    pub manager_name: Option<String>,
    pub task_count: i64,
    pub completed_tasks: i64,
}

/// Single project with its manager's name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,

    pub manager_name: Option<String>,
}

/// Project seen from one of its members
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberProject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,

    pub member_role: MemberRole,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub manager_id: i64,
}

/// Allow-listed changes to a project
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
    pub budget: Option<Option<f64>>,
}

impl Project {
    /// Creates a project and enrolls its manager as a `manager` member
    ///
    /// Both inserts happen in one transaction.
    pub async fn create(pool: &SqlitePool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO projects (name, description, priority, start_date, end_date, budget, manager_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.budget)
        .bind(data.manager_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES (?, ?, ?)")
            .bind(id)
            .bind(data.manager_id)
            .bind(MemberRole::Manager)
            .execute(&mut *tx)
            .await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, priority, start_date, end_date, budget,
                   manager_id, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, priority, start_date, end_date, budget,
                   manager_id, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let (found,): (i64,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM projects WHERE id = ?)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(found != 0)
    }

    /// Project with its manager's name
    pub async fn find_detail(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<ProjectDetail>, sqlx::Error> {
        sqlx::query_as::<_, ProjectDetail>(
            r#"
            SELECT p.*, u.name AS manager_name
            FROM projects p
            LEFT JOIN users u ON u.id = p.manager_id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All projects, newest first, with manager name and task counters
    pub async fn list_overview(pool: &SqlitePool) -> Result<Vec<ProjectOverview>, sqlx::Error> {
        sqlx::query_as::<_, ProjectOverview>(
            r#"
            SELECT p.*,
                   u.name AS manager_name,
                   COUNT(t.id) AS task_count,
                   COALESCE(SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_tasks
            FROM projects p
            LEFT JOIN users u ON u.id = p.manager_id
            LEFT JOIN tasks t ON t.project_id = p.id
            GROUP BY p.id
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Projects a user belongs to, with their role in each
    pub async fn list_for_member(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<MemberProject>, sqlx::Error> {
        sqlx::query_as::<_, MemberProject>(
            r#"
            SELECT p.*, pm.role AS member_role
            FROM projects p
            INNER JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Applies the supplied fields and stamps `updated_at`
    ///
    /// Returns `None` when no project has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE projects SET updated_at = CURRENT_TIMESTAMP");

        if let Some(name) = data.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(start_date) = data.start_date {
            builder.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            builder.push(", end_date = ").push_bind(end_date);
        }
        if let Some(budget) = data.budget {
            builder.push(", budget = ").push_bind(budget);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Deletes a project with its tasks and memberships
    ///
    /// Runs in one transaction. Returns false if the project did not exist.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM project_members WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
