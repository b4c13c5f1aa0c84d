/// Authentication middleware for Axum
///
/// Resolves the `Authorization: Bearer <token>` header to a live user and
/// stores the result in request extensions.
///
/// # Request Extensions
///
/// After successful authentication the middleware adds an [`AuthContext`]
/// holding the user's id, name, email and role as they are in the database
/// at request time, so a role change takes effect on the next request.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use projectdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
/// use sqlx::SqlitePool;
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.name)
/// }
///
/// fn router(pool: SqlitePool) -> Router {
///     Router::new()
///         .route("/protected", get(protected_handler))
///         .layer(middleware::from_fn(move |req, next| {
///             jwt_auth_middleware(pool.clone(), "secret".to_string(), req, next)
///         }))
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::jwt::{verify_token, JwtError};
use crate::models::user::{User, UserRole};

/// Authenticated caller, available to handlers as an extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Access token required")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Signature, issuer or expiry check failed
    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but its user is gone
    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::DatabaseError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": if status == StatusCode::UNAUTHORIZED { "unauthorized" } else { "internal_error" },
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Verifies the bearer token and loads its user
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] / [`AuthError::InvalidFormat`] for a bad header
/// - [`AuthError::InvalidToken`] when the token does not verify
/// - [`AuthError::UserNotFound`] when the user was deleted after issuance
pub async fn authenticate(
    pool: &SqlitePool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = verify_token(token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UserNotFound)?;

    Ok(AuthContext::from_user(&user))
}

/// JWT authentication middleware
///
/// Rejects the request with 401 unless the bearer token resolves to an
/// existing user; otherwise inserts the [`AuthContext`] and continues.
pub async fn jwt_auth_middleware(
    pool: SqlitePool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = authenticate(&pool, &secret, req.headers()).await?;

    tracing::debug!(user_id = context.user_id, role = context.role.as_str(), "Request authenticated");

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing() {
        let headers = HeaderMap::new();
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_bearer_token_empty() {
        let headers = headers_with("Bearer ");
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_jwt_errors_become_invalid_token() {
        assert!(matches!(AuthError::from(JwtError::Expired), AuthError::InvalidToken(msg) if msg == "Token expired"));
        assert!(matches!(
            AuthError::from(JwtError::ValidationError("bad".into())),
            AuthError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::MissingCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::DatabaseError("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let response = AuthError::InvalidToken("Invalid token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_context_admin_flag() {
        let context = AuthContext {
            user_id: 1,
            name: "Admin".to_string(),
            email: "admin@projeto.com".to_string(),
            role: UserRole::Admin,
        };
        assert!(context.is_admin());

        let context = AuthContext { role: UserRole::User, ..context };
        assert!(!context.is_admin());
    }
}
