//! # ProjectDesk API Server
//!
//! REST API for ProjectDesk: users, projects, project members and tasks,
//! backed by SQLite.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Initialize tracing
//! 3. Open the database, apply migrations, make sure an admin exists
//! 4. Serve until Ctrl-C or SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p projectdesk-api
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use projectdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use projectdesk_shared::db::{
    migrations::{get_migration_status, run_migrations},
    pool::{close_pool, create_pool},
    seed::ensure_admin_user,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "projectdesk_api=debug,projectdesk_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(config.is_production());

    tracing::info!(
        environment = %config.api.environment,
        "ProjectDesk API v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    for warning in config.security_warnings() {
        tracing::warn!("{}", warning);
    }

    let pool = create_pool(config.pool_config())
        .await
        .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let migrations = get_migration_status(&pool).await?;
    tracing::info!(
        applied = migrations.applied_migrations,
        latest = ?migrations.latest_version,
        "Database schema ready"
    );

    ensure_admin_user(&pool, &config.admin_seed())
        .await
        .context("Failed to seed the administrator account")?;

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Server listening on http://{}/api", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
