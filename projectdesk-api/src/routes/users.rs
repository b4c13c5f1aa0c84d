/// User endpoints
///
/// # Endpoints
///
/// - `GET /api/users` - List users (admin)
/// - `GET /api/users/:id` - Get a profile (self or admin)
/// - `PUT /api/users/:id` - Update a profile (self or admin; `role` is admin only)
/// - `DELETE /api/users/:id` - Delete a user (admin)
/// - `GET /api/users/:id/projects` - Projects the user belongs to
/// - `GET /api/users/:id/tasks` - Tasks assigned to the user
/// - `GET /api/users/:id/stats` - Per-user counters

use axum::{extract::State, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_access, Action, Resource},
        middleware::AuthContext,
        password,
    },
    models::{
        project::{MemberProject, Project},
        stats::UserStats,
        task::{AssignedTask, Task},
        user::{UpdateUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam},
    validation::{normalize_email, validate_not_blank, validate_request, validate_user_role},
};

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    /// Admin only
    #[validate(custom(function = "validate_user_role"))]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

/// Fails with 403 unless `auth` may perform `action` on user `id`
fn authorize(auth: &AuthContext, id: i64, action: Action) -> ApiResult<()> {
    require_access(auth, &Resource::User { id }, action)?;
    Ok(())
}

async fn ensure_user(state: &AppState, id: i64) -> ApiResult<()> {
    if User::exists(&state.db, id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("User"))
    }
}

/// List all users, ordered by name
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(User::list(&state.db).await?))
}

/// Get a user's profile
///
/// The password hash is never serialized.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<User>> {
    authorize(&auth, id, Action::Read)?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

/// Update a user's profile
///
/// A new password is hashed before storage. Only admins may change `role`.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the email belongs to another user
/// - `403 Forbidden`: not self or admin, or a non-admin sent `role`
/// - `404 Not Found`: no such user
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    validate_request(&req, &[])?;
    authorize(&auth, id, Action::Update)?;

    if req.role.is_some() && !auth.is_admin() {
        tracing::warn!(user_id = auth.user_id, target = id, "Non-admin tried to change a role");
        return Err(ApiError::Forbidden(
            "Only administrators can change roles".to_string(),
        ));
    }

    ensure_user(&state, id).await?;

    let email = req.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if let Some(existing) = User::find_by_email(&state.db, email).await? {
            if existing.id != id {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
        }
    }

    let password_hash = req
        .password
        .as_deref()
        .map(password::hash_password)
        .transpose()?;

    let update = UpdateUser {
        name: req.name.map(|name| name.trim().to_string()),
        email,
        password_hash,
        role: req.role.as_deref().map(str::parse::<UserRole>).transpose()?,
    };

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = id, updated_by = auth.user_id, "User updated");

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// Delete a user
///
/// The user's memberships are removed and their tasks unassigned.
///
/// # Errors
///
/// - `400 Bad Request`: deleting yourself, or a user who still manages projects
/// - `404 Not Found`: no such user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&auth, id, Action::Delete)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    ensure_user(&state, id).await?;

    let managed = User::count_managed_projects(&state.db, id).await?;
    if managed > 0 {
        return Err(ApiError::BadRequest(format!(
            "User manages {} project(s); reassign them before deleting",
            managed
        )));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(user_id = id, deleted_by = auth.user_id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Projects the user is a member of, with their project role
pub async fn user_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Vec<MemberProject>>> {
    authorize(&auth, id, Action::Read)?;
    ensure_user(&state, id).await?;

    Ok(Json(Project::list_for_member(&state.db, id).await?))
}

/// Tasks assigned to the user
pub async fn user_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Vec<AssignedTask>>> {
    authorize(&auth, id, Action::Read)?;
    ensure_user(&state, id).await?;

    Ok(Json(Task::list_assigned_to(&state.db, id).await?))
}

/// Per-user project and task counters
pub async fn user_stats(
    State(state): State<AppState>,
    auth: AuthContext,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<UserStats>> {
    authorize(&auth, id, Action::Read)?;
    ensure_user(&state, id).await?;

    Ok(Json(UserStats::for_user(&state.db, id).await?))
}
