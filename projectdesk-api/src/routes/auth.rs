/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new user and get a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `GET /api/auth/verify` - Check a bearer token

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use projectdesk_shared::{
    auth::{jwt, middleware::bearer_token, password},
    models::user::{CreateUser, User, UserRole, UserSummary},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    validation::{normalize_email, validate_not_blank, validate_request},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 1, message = "Password is required")
    )]
    pub password: Option<String>,
}

/// Token plus the identity it was issued for
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,

    /// Bearer token, valid for 24 hours
    pub token: String,

    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,

    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Register a new user
///
/// New accounts always get the `user` role.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "name": "Ana", "email": "ana@example.com", "password": "secret1" }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "User registered successfully",
///   "token": "eyJ...",
///   "user": { "id": 2, "name": "Ana", "email": "ana@example.com", "role": "user" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_request(&req, &[])?;

    let name = req.name.unwrap_or_default().trim().to_string();
    let email = normalize_email(&req.email.unwrap_or_default());
    let plain_password = req.password.unwrap_or_default();

    if User::find_by_email(&state.db, &email).await?.is_some() {
        tracing::info!(email = %email, "Registration rejected: email already registered");
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&plain_password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name,
            email,
            password_hash,
            role: UserRole::User,
        },
    )
    .await?;

    let token = jwt::issue_token(user.id, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// Login with email and password
///
/// Unknown emails and wrong passwords get the same 401 so responses do not
/// reveal which accounts exist.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    validate_request(&req, &[])?;

    let email = normalize_email(&req.email.unwrap_or_default());
    let plain_password = req.password.unwrap_or_default();

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => {
            tracing::warn!(email = %email, "Login failed: unknown email");
            return Err(invalid_credentials());
        }
    };

    if !password::verify_password(&plain_password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    let token = jwt::issue_token(user.id, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserSummary::from(&user),
    }))
}

/// Verify a bearer token
///
/// Checks signature, issuer and expiry only; the user row is not loaded.
///
/// # Errors
///
/// - `401 Unauthorized`: missing, malformed, expired or tampered token
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<VerifyResponse>> {
    let token = bearer_token(&headers)?;
    let claims = jwt::verify_token(token, state.jwt_secret())?;

    Ok(Json(VerifyResponse {
        valid: true,
        user_id: claims.sub,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorDetail;

    fn fields(err: ApiError) -> Vec<String> {
        match err {
            ApiError::ValidationError(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_requires_every_field() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        let err = validate_request(&req, &[]).unwrap_err();

        assert_eq!(fields(err), vec!["email", "name", "password"]);
    }

    #[test]
    fn test_register_rejects_bad_values() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "  ",
            "email": "not-an-email",
            "password": "12345"
        }))
        .unwrap();

        match validate_request(&req, &[]).unwrap_err() {
            ApiError::ValidationError(errors) => {
                assert!(errors.contains(&ValidationErrorDetail {
                    field: "password".to_string(),
                    message: "Password must be at least 6 characters".to_string(),
                }));
                assert!(errors.contains(&ValidationErrorDetail {
                    field: "email".to_string(),
                    message: "Invalid email format".to_string(),
                }));
                assert_eq!(errors.len(), 3);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_register_request() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "secret1"
        }))
        .unwrap();

        assert!(validate_request(&req, &[]).is_ok());
    }

    #[test]
    fn test_login_requires_password() {
        let req: LoginRequest =
            serde_json::from_value(serde_json::json!({ "email": "ana@example.com", "password": "" }))
                .unwrap();

        assert_eq!(fields(validate_request(&req, &[]).unwrap_err()), vec!["password"]);
    }

    #[test]
    fn test_verify_response_uses_camel_case_user_id() {
        let json = serde_json::to_value(VerifyResponse {
            valid: true,
            user_id: 7,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "valid": true, "userId": 7 }));
    }
}
