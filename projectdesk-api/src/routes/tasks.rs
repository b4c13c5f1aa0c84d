/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - List tasks, filtered by `project_id`, `status`, `assigned_to`
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks/stats/overview` - Task counters, optionally for one project
/// - `GET /api/tasks/projects/:id/tasks` - Tasks of one project
/// - `GET /api/tasks/:id` - Get one task
/// - `PUT /api/tasks/:id` - Update a task (project manager, assignee or admin)
/// - `DELETE /api/tasks/:id` - Delete a task (project manager or admin)
/// - `PATCH /api/tasks/:id/complete` - Mark a task completed (project manager, assignee or admin)
///
/// Listings are ordered by due date (undated last), then priority, high first.

use axum::{extract::State, http::StatusCode, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_access, Action, Resource},
        middleware::AuthContext,
    },
    models::{
        project::{Priority, Project},
        stats::TaskStats,
        task::{CreateTask, Task, TaskDetail, TaskFilter, TaskStatus, TaskWithManager, UpdateTask},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{empty_as_none, nullable, nullable_id, JsonBody, PathParam, QueryParams},
    validation::{
        nullable_str, validate_not_blank, validate_priority, validate_request,
        validate_task_status,
    },
};

/// Query string for `GET /api/tasks`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskListQuery {
    pub project_id: Option<i64>,

    #[validate(custom(function = "validate_task_status"))]
    pub status: Option<String>,

    pub assigned_to: Option<i64>,
}

/// Query string for `GET /api/tasks/stats/overview`
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub project_id: Option<i64>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(
        required(message = "Priority is required"),
        custom(function = "validate_priority")
    )]
    pub priority: Option<String>,

    pub due_date: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub assigned_to: Option<i64>,

    #[validate(required(message = "Project id is required"))]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub project_id: Option<i64>,
}

/// Update task request
///
/// Absent fields are left alone; `null` clears nullable ones, so
/// `"assigned_to": null` (or `""`) unassigns the task.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[validate(custom(function = "validate_task_status"))]
    pub status: Option<String>,

    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable_id")]
    pub assigned_to: Option<Option<i64>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub message: String,

    #[serde(rename = "taskId")]
    pub task_id: i64,

    pub task: TaskDetail,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskDetail,
}

impl TaskListQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        validate_request(&self, &[])?;

        Ok(TaskFilter {
            project_id: self.project_id,
            status: self.status.as_deref().map(str::parse::<TaskStatus>).transpose()?,
            assigned_to: self.assigned_to,
        })
    }
}

impl UpdateTaskRequest {
    fn into_update(self) -> ApiResult<UpdateTask> {
        validate_request(&self, &[("due_date", nullable_str(&self.due_date))])?;

        Ok(UpdateTask {
            title: self.title.map(|title| title.trim().to_string()),
            description: self.description,
            status: self.status.as_deref().map(str::parse::<TaskStatus>).transpose()?,
            priority: self.priority.as_deref().map(str::parse::<Priority>).transpose()?,
            due_date: self.due_date,
            assigned_to: self.assigned_to,
        })
    }
}

fn task_resource(task: &TaskWithManager) -> Resource {
    Resource::Task {
        project_manager_id: task.project_manager_id,
        assigned_to: task.task.assigned_to,
    }
}

async fn load_task(state: &AppState, id: i64) -> ApiResult<TaskWithManager> {
    Task::find_with_manager(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))
}

async fn load_detail(state: &AppState, id: i64) -> ApiResult<TaskDetail> {
    Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))
}

/// Fails with 404 unless the assignee exists
async fn ensure_assignee(state: &AppState, user_id: i64) -> ApiResult<()> {
    if User::exists(&state.db, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("Assigned user"))
    }
}

/// List tasks with optional filters
pub async fn list_tasks(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    let filter = query.into_filter()?;
    let tasks = Task::list(&state.db, &filter).await?;
    Ok(Json(tasks))
}

/// Create a task
///
/// # Response (201)
///
/// ```json
/// { "message": "Task created successfully", "taskId": 12, "task": { ... } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `404 Not Found`: no such project or assignee
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<CreateTaskResponse>)> {
    validate_request(&req, &[("due_date", req.due_date.as_deref())])?;

    let project_id = req.project_id.unwrap_or_default();
    if !Project::exists(&state.db, project_id).await? {
        return Err(ApiError::not_found("Project"));
    }
    if let Some(assignee) = req.assigned_to {
        ensure_assignee(&state, assignee).await?;
    }

    let priority = req.priority.as_deref().unwrap_or_default().parse::<Priority>()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title.unwrap_or_default().trim().to_string(),
            description: req.description,
            priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            project_id,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, project_id, user_id = auth.user_id, "Task created");

    let task = load_detail(&state, task.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            message: "Task created successfully".to_string(),
            task_id: task.task.id,
            task,
        }),
    ))
}

/// Get one task with assignee and project names
pub async fn get_task(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(load_detail(&state, id).await?))
}

/// List the tasks of one project
pub async fn list_project_tasks(
    State(state): State<AppState>,
    PathParam(project_id): PathParam<i64>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    if !Project::exists(&state.db, project_id).await? {
        return Err(ApiError::not_found("Project"));
    }

    let filter = TaskFilter {
        project_id: Some(project_id),
        ..Default::default()
    };
    Ok(Json(Task::list(&state.db, &filter).await?))
}

/// Update a task
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `403 Forbidden`: caller is not the project manager, the assignee or an admin
/// - `404 Not Found`: no such task, or the new assignee does not exist
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let update = req.into_update()?;

    let task = load_task(&state, id).await?;
    require_access(&auth, &task_resource(&task), Action::Update)?;

    if let Some(Some(assignee)) = update.assigned_to {
        ensure_assignee(&state, assignee).await?;
    }

    Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!(task_id = id, user_id = auth.user_id, "Task updated");

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task: load_detail(&state, id).await?,
    }))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let task = load_task(&state, id).await?;
    require_access(&auth, &task_resource(&task), Action::Delete)?;

    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Task"));
    }

    tracing::info!(task_id = id, user_id = auth.user_id, "Task deleted");

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

/// Mark a task completed
pub async fn complete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = load_task(&state, id).await?;
    require_access(&auth, &task_resource(&task), Action::Complete)?;

    Task::complete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!(task_id = id, user_id = auth.user_id, "Task completed");

    Ok(Json(TaskResponse {
        message: "Task marked as completed".to_string(),
        task: load_detail(&state, id).await?,
    }))
}

/// Task counters across all tasks, or one project's
pub async fn task_stats(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<StatsQuery>,
) -> ApiResult<Json<TaskStats>> {
    let stats = TaskStats::overview(&state.db, query.project_id).await?;
    Ok(Json(stats))
}
