/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: signed access tokens with a fixed 24 hour lifetime
/// - [`middleware`]: bearer token authentication against the user table
/// - [`authorization`]: the owner-or-admin access policy shared by all handlers
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::password::{hash_password, verify_password};
/// use projectdesk_shared::auth::jwt::{issue_token, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret1")?;
/// assert!(verify_password("secret1", &hash)?);
///
/// let token = issue_token(42, "signing-secret")?;
/// let claims = verify_token(&token, "signing-secret")?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
