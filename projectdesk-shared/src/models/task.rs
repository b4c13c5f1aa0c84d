/// Task model and database operations
///
/// Tasks belong to exactly one project and may be assigned to one user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'pending',
///     priority TEXT NOT NULL DEFAULT 'medium',
///     due_date TEXT,
///     assigned_to INTEGER REFERENCES users(id),
///     project_id INTEGER NOT NULL REFERENCES projects(id),
///     created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```
///
/// # Ordering
///
/// Listings sort by due date (earliest first, undated last) and then by
/// priority rank, high before medium before low.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::project::Priority;
use super::UnknownVariant;

/// `ORDER BY` clause shared by the task listings
fn list_order() -> String {
    format!(
        " ORDER BY t.due_date IS NULL, t.due_date ASC, {} DESC, t.id ASC",
        Priority::rank_sql("t.priority")
    )
}

/// Task progress state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,

    /// ISO date, kept as sent
    pub due_date: Option<String>,

    pub assigned_to: Option<i64>,
    pub project_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Task with assignee and project names resolved
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    pub assigned_to_name: Option<String>,
    pub project_name: Option<String>,
}

/// Task assigned to a user, with its project's name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignedTask {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    pub project_name: Option<String>,
}

/// Task together with the manager of the project it belongs to
///
/// This is what the access policy needs to decide on a task.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskWithManager {
    #[sqlx(flatten)]
    pub task: Task,

    pub project_manager_id: i64,
}

/// Optional listing filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub assigned_to: Option<i64>,
    pub project_id: i64,
}

/// Allow-listed changes to a task
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<String>>,
    pub assigned_to: Option<Option<i64>>,
}

impl Task {
    pub async fn create(pool: &SqlitePool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, priority, due_date, assigned_to, project_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.assigned_to)
        .bind(data.project_id)
        .execute(pool)
        .await?
        .last_insert_rowid();

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date, assigned_to, project_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_detail(pool: &SqlitePool, id: i64) -> Result<Option<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(
            r#"
            SELECT t.*, u.name AS assigned_to_name, p.name AS project_name
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assigned_to
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE t.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads a task along with its project's manager id
    pub async fn find_with_manager(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<TaskWithManager>, sqlx::Error> {
        sqlx::query_as::<_, TaskWithManager>(
            r#"
            SELECT t.*, p.manager_id AS project_manager_id
            FROM tasks t
            INNER JOIN projects p ON p.id = t.project_id
            WHERE t.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks matching every supplied filter
    pub async fn list(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT t.*, u.name AS assigned_to_name, p.name AS project_name
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assigned_to
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE 1 = 1
            "#,
        );

        if let Some(project_id) = filter.project_id {
            builder.push(" AND t.project_id = ").push_bind(project_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND t.status = ").push_bind(status);
        }
        if let Some(assigned_to) = filter.assigned_to {
            builder.push(" AND t.assigned_to = ").push_bind(assigned_to);
        }

        builder.push(list_order());

        builder.build_query_as::<TaskDetail>().fetch_all(pool).await
    }

    /// Tasks assigned to a user, with project names
    pub async fn list_assigned_to(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<AssignedTask>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT t.*, p.name AS project_name
            FROM tasks t
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE t.assigned_to = ?
            {}
            "#,
            list_order()
        );

        sqlx::query_as::<_, AssignedTask>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Applies the supplied fields and stamps `updated_at`
    ///
    /// Returns `None` when no task has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE tasks SET updated_at = CURRENT_TIMESTAMP");

        if let Some(title) = data.title {
            builder.push(", title = ").push_bind(title);
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
        if let Some(due_date) = data.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            builder.push(", assigned_to = ").push_bind(assigned_to);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Marks a task completed
    pub async fn complete(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            id,
            UpdateTask {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns false if the task did not exist
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
