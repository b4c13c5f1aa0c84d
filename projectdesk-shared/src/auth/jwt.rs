/// JWT token issuance and verification
///
/// Access tokens are signed with HS256 and carry the user id as the `sub`
/// claim. Every token expires 24 hours after issuance; there are no refresh
/// tokens, a client simply logs in again.
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::jwt::{issue_token, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = issue_token(7, "your-secret-key")?;
/// let claims = verify_token(&token, "your-secret-key")?;
/// assert_eq!(claims.sub, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer stamped into and required from every token
pub const ISSUER: &str = "projectdesk";

/// Lifetime of an access token
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// JWT claims
///
/// - `sub`: user id
/// - `iss`: always [`ISSUER`]
/// - `iat` / `nbf`: issuance time (Unix seconds)
/// - `exp`: expiration time (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: i64,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for `user_id` expiring after [`TOKEN_LIFETIME_HOURS`]
    pub fn new(user_id: i64) -> Self {
        Self::with_expiration(user_id, Duration::hours(TOKEN_LIFETIME_HOURS))
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative duration yields claims that are already expired, which is
    /// how tests build stale tokens.
    pub fn with_expiration(user_id: i64, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token string (HS256)
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a 24 hour access token for a user
pub fn issue_token(user_id: i64, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(user_id), secret)
}

/// Verifies a token and returns its claims
///
/// # Errors
///
/// - [`JwtError::Expired`] when `exp` is in the past
/// - [`JwtError::InvalidIssuer`] when `iss` is not [`ISSUER`]
/// - [`JwtError::ValidationError`] for a bad signature or malformed token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(12);

        assert_eq!(claims.sub, 12);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_HOURS * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify_token() {
        let token = issue_token(99, SECRET).expect("Should create token");

        let claims = verify_token(&token, SECRET).expect("Should validate token");
        assert_eq!(claims.sub, 99);
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue_token(1, "secret1").unwrap();

        let result = verify_token(&token, "wrong-secret");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let claims = Claims::with_expiration(1, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_verify_foreign_issuer() {
        let mut claims = Claims::new(1);
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_verify_tampered_token() {
        let token = issue_token(5, SECRET).unwrap();

        // Swap the payload for one claiming a different user
        let forged_claims = create_token(&Claims::new(6), "attacker-secret").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = forged_claims.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert!(verify_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn test_verify_garbage() {
        assert!(verify_token("not-a-jwt", SECRET).is_err());
    }
}
