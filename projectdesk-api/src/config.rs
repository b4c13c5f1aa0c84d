/// Configuration management for the API server
///
/// Configuration comes from environment variables, optionally seeded from a
/// `.env` file. Every variable has a default suitable for local development.
///
/// # Environment Variables
///
/// - `HOST` / `PORT`: bind address (default: 0.0.0.0:5000)
/// - `APP_ENV` (or `NODE_ENV`): development, production or test
/// - `DATABASE_URL`: SQLite URL (default: sqlite://database.sqlite)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `JWT_SECRET`: token signing secret (insecure default with a warning)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any
/// - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: requests per window per IP
/// - `CLIENT_BUILD_DIR`: client bundle served in production
/// - `ADMIN_NAME` / `ADMIN_EMAIL` / `ADMIN_PASSWORD`: bootstrap administrator
/// - `RUST_LOG`: log filter
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use projectdesk_shared::db::pool::DatabaseConfig as PoolConfig;
use projectdesk_shared::db::seed::AdminSeed;
use serde::{Deserialize, Serialize};

/// Signing secret used when `JWT_SECRET` is unset
///
/// Anyone who reads this file can forge tokens for a server running with it.
pub const DEFAULT_JWT_SECRET: &str = "projectdesk-development-secret-change-me";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub admin: AdminConfig,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => anyhow::bail!("Unknown environment: {}", other),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,

    /// Allowed CORS origins; a single `*` allows any
    pub cors_origins: Vec<String>,

    /// Directory of the built client, served in production
    pub client_build_dir: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Per-IP request budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

/// Bootstrap administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        let admin = AdminSeed::default();

        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                environment: Environment::Development,
                cors_origins: vec!["http://localhost:3000".to_string()],
                client_build_dir: "client/build".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://database.sqlite".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: DEFAULT_JWT_SECRET.to_string(),
            },
            rate_limit: RateLimitConfig {
                max_requests: 100,
                window_secs: 900,
            },
            admin: AdminConfig {
                name: admin.name,
                email: admin.email,
                password: admin.password,
            },
        }
    }
}

/// Reads `key`, falling back to `default` when unset
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable or the environment name does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")) {
            Ok(raw) => raw.parse::<Environment>()?,
            Err(_) => defaults.api.environment,
        };

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => defaults.api.cors_origins.clone(),
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => DEFAULT_JWT_SECRET.to_string(),
        };

        let rate_limit = RateLimitConfig {
            max_requests: env_or("RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?,
            window_secs: env_or("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs)?,
        };

        if rate_limit.max_requests == 0 || rate_limit.window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_MAX and RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        Ok(Self {
            api: ApiConfig {
                host: env_string("HOST", &defaults.api.host),
                port: env_or("PORT", defaults.api.port)?,
                environment,
                cors_origins,
                client_build_dir: env_string("CLIENT_BUILD_DIR", &defaults.api.client_build_dir),
            },
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", &defaults.database.url),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            rate_limit,
            admin: AdminConfig {
                name: env_string("ADMIN_NAME", &defaults.admin.name),
                email: env_string("ADMIN_EMAIL", &defaults.admin.email),
                password: env_string("ADMIN_PASSWORD", &defaults.admin.password),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Settings that are fine locally but unsafe in front of real users
    ///
    /// Logged once at startup, after tracing is initialized.
    pub fn security_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if self.jwt.secret == DEFAULT_JWT_SECRET {
            warnings.push("JWT_SECRET is not set; tokens are signed with the built-in development secret");
        }
        if self.is_production() && self.admin.password == AdminSeed::default().password {
            warnings.push("Bootstrap administrator still uses the default password");
        }

        warnings
    }

    pub fn is_production(&self) -> bool {
        self.api.environment == Environment::Production
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn admin_seed(&self) -> AdminSeed {
        AdminSeed {
            name: self.admin.name.clone(),
            email: self.admin.email.clone(),
            password: self.admin.password.clone(),
        }
    }
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
