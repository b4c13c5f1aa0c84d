/// Authentication layers for protected routes
///
/// [`require_auth`] runs the shared JWT middleware with the server's pool and
/// secret. [`require_admin`] stacks on top of it for admin-only routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use projectdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext};

use crate::app::AppState;
use crate::error::ApiError;

/// Requires a valid bearer token
///
/// # Errors
///
/// - 401 Unauthorized: missing, malformed, expired or tampered token, or the
///   token's user no longer exists
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    jwt_auth_middleware(state.db.clone(), state.jwt_secret().to_string(), request, next)
        .await
        .map_err(|e| {
            tracing::debug!(path = %path, error = %e, "Authentication failed");
            ApiError::from(e)
        })
}

/// Requires an authenticated administrator
///
/// Must run inside [`require_auth`].
///
/// # Errors
///
/// - 401 Unauthorized: no authenticated user on the request
/// - 403 Forbidden: the user is not an admin
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    if !context.is_admin() {
        tracing::warn!(
            user_id = context.user_id,
            path = %request.uri().path(),
            "Admin route denied"
        );
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
