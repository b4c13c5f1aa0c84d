/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - List projects with task counters
/// - `POST /api/projects` - Create a project managed by the caller
/// - `GET /api/projects/:id` - Get one project
/// - `PUT /api/projects/:id` - Update a project (manager or admin)
/// - `DELETE /api/projects/:id` - Delete a project and its tasks (manager or admin)
/// - `GET /api/projects/:id/members` - List members
/// - `POST /api/projects/:id/members` - Add a member (manager or admin)

use axum::{extract::State, http::StatusCode, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_access, Action, Resource},
        middleware::AuthContext,
    },
    models::{
        project::{CreateProject, Priority, Project, ProjectDetail, ProjectOverview, ProjectStatus, UpdateProject},
        project_member::{CreateProjectMember, MemberDetail, MemberRole, ProjectMember},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{nullable, JsonBody, PathParam},
    validation::{
        nullable_str, validate_member_role, validate_not_blank, validate_priority,
        validate_project_status, validate_request,
    },
};

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(
        required(message = "Priority is required"),
        custom(function = "validate_priority")
    )]
    pub priority: Option<String>,

    pub start_date: Option<String>,

    pub end_date: Option<String>,

    #[validate(range(min = 0.0, message = "Budget must not be negative"))]
    pub budget: Option<f64>,
}

/// Update project request
///
/// Absent fields are left alone; `null` clears nullable ones.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[validate(custom(function = "validate_project_status"))]
    pub status: Option<String>,

    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub budget: Option<Option<f64>>,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(required(message = "User id is required"))]
    pub user_id: Option<i64>,

    /// Defaults to `member`
    #[validate(custom(function = "validate_member_role"))]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    pub message: String,

    #[serde(rename = "projectId")]
    pub project_id: i64,

    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub message: String,
    pub project: Project,
}

impl UpdateProjectRequest {
    fn validate_all(&self) -> ApiResult<()> {
        validate_request(
            self,
            &[
                ("start_date", nullable_str(&self.start_date)),
                ("end_date", nullable_str(&self.end_date)),
            ],
        )?;

        if let Some(Some(budget)) = self.budget {
            if budget < 0.0 {
                return Err(ApiError::invalid_field("budget", "Budget must not be negative"));
            }
        }

        Ok(())
    }

    fn into_update(self) -> ApiResult<UpdateProject> {
        Ok(UpdateProject {
            name: self.name.map(|name| name.trim().to_string()),
            description: self.description,
            status: self.status.as_deref().map(str::parse::<ProjectStatus>).transpose()?,
            priority: self.priority.as_deref().map(str::parse::<Priority>).transpose()?,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
        })
    }
}

/// Loads a project or fails with 404
async fn load_project(state: &AppState, id: i64) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// List all projects, newest first
///
/// Each entry carries `manager_name`, `task_count` and `completed_tasks`.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectOverview>>> {
    let projects = Project::list_overview(&state.db).await?;
    Ok(Json(projects))
}

/// Create a project
///
/// The caller becomes the project's manager and its first member.
///
/// # Response (201)
///
/// ```json
/// { "message": "Project created successfully", "projectId": 3, "project": { ... } }
/// ```
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(req): JsonBody<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreateProjectResponse>)> {
    validate_request(
        &req,
        &[
            ("start_date", req.start_date.as_deref()),
            ("end_date", req.end_date.as_deref()),
        ],
    )?;

    let priority = req.priority.as_deref().unwrap_or_default().parse::<Priority>()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name.unwrap_or_default().trim().to_string(),
            description: req.description,
            priority,
            start_date: req.start_date,
            end_date: req.end_date,
            budget: req.budget,
            manager_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, manager_id = auth.user_id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            message: "Project created successfully".to_string(),
            project_id: project.id,
            project,
        }),
    ))
}

/// Get one project with its manager's name
pub async fn get_project(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = Project::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;

    Ok(Json(project))
}

/// Update a project
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `403 Forbidden`: caller is neither the manager nor an admin
/// - `404 Not Found`: no such project
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    req.validate_all()?;

    let project = load_project(&state, id).await?;
    require_access(
        &auth,
        &Resource::Project {
            manager_id: project.manager_id,
        },
        Action::Update,
    )?;

    let project = Project::update(&state.db, id, req.into_update()?)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;

    tracing::info!(project_id = id, user_id = auth.user_id, "Project updated");

    Ok(Json(ProjectResponse {
        message: "Project updated successfully".to_string(),
        project,
    }))
}

/// Delete a project together with its tasks and memberships
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state, id).await?;
    require_access(
        &auth,
        &Resource::Project {
            manager_id: project.manager_id,
        },
        Action::Delete,
    )?;

    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Project"));
    }

    tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");

    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// List a project's members in join order
pub async fn list_members(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Vec<MemberDetail>>> {
    if !Project::exists(&state.db, id).await? {
        return Err(ApiError::not_found("Project"));
    }

    let members = ProjectMember::list_for_project(&state.db, id).await?;
    Ok(Json(members))
}

/// Add a user to a project
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the user is already a member
/// - `403 Forbidden`: caller is neither the manager nor an admin
/// - `404 Not Found`: no such project or user
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    validate_request(&req, &[])?;

    let project = load_project(&state, id).await?;
    require_access(
        &auth,
        &Resource::Project {
            manager_id: project.manager_id,
        },
        Action::ManageMembers,
    )?;

    let user_id = req.user_id.unwrap_or_default();
    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("User"));
    }

    if ProjectMember::find(&state.db, id, user_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    let role = req
        .role
        .as_deref()
        .map(str::parse::<MemberRole>)
        .transpose()?
        .unwrap_or_default();

    ProjectMember::create(
        &state.db,
        CreateProjectMember {
            project_id: id,
            user_id,
            role,
        },
    )
    .await?;

    tracing::info!(project_id = id, member_id = user_id, role = role.as_str(), "Member added");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Member added successfully")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_name_and_priority() {
        let req: CreateProjectRequest = serde_json::from_str("{}").unwrap();

        match validate_request(&req, &[]).unwrap_err() {
            ApiError::ValidationError(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "priority"]);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdateProjectRequest = serde_json::from_value(serde_json::json!({
            "description": null,
            "status": "paused"
        }))
        .unwrap();

        req.validate_all().unwrap();
        let update = req.into_update().unwrap();

        assert_eq!(update.description, Some(None));
        assert_eq!(update.status, Some(ProjectStatus::Paused));
        assert_eq!(update.name, None);
        assert_eq!(update.budget, None);
    }

    #[test]
    fn test_update_request_rejects_bad_date_and_budget() {
        let req: UpdateProjectRequest = serde_json::from_value(serde_json::json!({
            "end_date": "next week"
        }))
        .unwrap();
        assert!(matches!(req.validate_all(), Err(ApiError::ValidationError(_))));

        let req: UpdateProjectRequest =
            serde_json::from_value(serde_json::json!({ "budget": -10.0 })).unwrap();
        assert!(matches!(req.validate_all(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let req: UpdateProjectRequest = serde_json::from_value(serde_json::json!({
            "manager_id": 99,
            "id": 5
        }))
        .unwrap();

        let update = req.into_update().unwrap();
        assert!(update.name.is_none() && update.status.is_none());
    }
}
