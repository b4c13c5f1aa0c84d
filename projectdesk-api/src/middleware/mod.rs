/// Middleware for the API server
///
/// - `auth`: bearer-token authentication and the admin gate
/// - `rate_limit`: per-IP token bucket
/// - `security`: hardening response headers

pub mod auth;
pub mod rate_limit;
pub mod security;
