/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::{app::AppState, config::Config};
/// use projectdesk_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = projectdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::middleware::{
    auth::{require_admin, require_auth},
    rate_limit::{rate_limit_layer, RateLimiter},
    security::SecurityHeadersLayer,
};
use crate::routes;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Per-IP request budget for `/api`
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let rate_limiter = RateLimiter::from_config(&config.rate_limit);

        Self {
            db,
            config: Arc::new(config),
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/                            # Rate limited per client IP
///     ├── GET  /test                   # Liveness probe (public)
///     ├── /auth/                       # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── GET  /verify
///     ├── /projects/                   # Authenticated
///     │   ├── GET, POST         /
///     │   ├── GET, PUT, DELETE  /:id
///     │   └── GET, POST         /:id/members
///     ├── /tasks/                      # Authenticated
///     │   ├── GET, POST         /
///     │   ├── GET               /stats/overview
///     │   ├── GET               /projects/:id/tasks
///     │   ├── GET, PUT, DELETE  /:id
///     │   └── PATCH             /:id/complete
///     └── /users/                      # Authenticated
///         ├── GET               /           (admin)
///         ├── GET, PUT          /:id        (self or admin)
///         ├── DELETE            /:id        (admin)
///         └── GET               /:id/{projects,tasks,stats}
/// ```
///
/// Anything else gets a JSON 404, or the client bundle in production.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Request tracing
/// 4. Rate limiting (`/api` only)
/// 5. Authentication and the admin gate (per route group)
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/verify", get(routes::auth::verify));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/stats/overview", get(routes::tasks::task_stats))
        .route("/projects/:id/tasks", get(routes::tasks::list_project_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", patch(routes::tasks::complete_task))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin_user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", axum::routing::delete(routes::users::delete_user))
        .route_layer(from_fn(require_admin));

    let user_routes = Router::new()
        .route(
            "/:id",
            get(routes::users::get_user).put(routes::users::update_user),
        )
        .route("/:id/projects", get(routes::users::user_projects))
        .route("/:id/tasks", get(routes::users::user_tasks))
        .route("/:id/stats", get(routes::users::user_stats))
        .merge(admin_user_routes)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .route("/test", get(routes::health::api_test))
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit_layer));

    let router = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes);

    let router = if state.config.is_production() {
        let client_dir = Path::new(&state.config.api.client_build_dir);
        tracing::info!(dir = %client_dir.display(), "Serving client bundle");

        router.fallback_service(
            ServeDir::new(client_dir).fallback(ServeFile::new(client_dir.join("index.html"))),
        )
    } else {
        router.fallback(routes::not_found)
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.is_production()))
        .with_state(state)
}

/// CORS for the configured origins; a `*` entry makes it permissive
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
