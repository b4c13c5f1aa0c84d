/// Aggregate counters for dashboards
///
/// Counts come straight from SQL; empty sets yield zeros, never NULL.

use serde::Serialize;
use sqlx::SqlitePool;

/// Task counts by status and priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TaskStats {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
    pub cancelled_tasks: i64,
    pub high_priority_tasks: i64,
    pub medium_priority_tasks: i64,
    pub low_priority_tasks: i64,
}

impl TaskStats {
    /// Counts all tasks, or only those of one project
    pub async fn overview(
        pool: &SqlitePool,
        project_id: Option<i64>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT
                COUNT(*) AS total_tasks,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_tasks,
                COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress_tasks,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_tasks,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled_tasks,
                COALESCE(SUM(CASE WHEN priority = 'high' THEN 1 ELSE 0 END), 0) AS high_priority_tasks,
                COALESCE(SUM(CASE WHEN priority = 'medium' THEN 1 ELSE 0 END), 0) AS medium_priority_tasks,
                COALESCE(SUM(CASE WHEN priority = 'low' THEN 1 ELSE 0 END), 0) AS low_priority_tasks
            FROM tasks
            WHERE (?1 IS NULL OR project_id = ?1)
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }
}

/// Per-user counters shown on the profile page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserStats {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
}

impl UserStats {
    pub async fn for_user(pool: &SqlitePool, user_id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM project_members WHERE user_id = ?1) AS total_projects,
                COUNT(*) AS total_tasks,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_tasks,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_tasks,
                COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress_tasks
            FROM tasks
            WHERE assigned_to = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
