mod app;
mod config;
mod db_migrations;
mod db_sqlx;
mod routes;
mod state;

extern crate self as sqlx;
pub use crate::db_sqlx::{PgPool, postgres, query, query_as};

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db = match config::database_url() {
        Some(database_url) => match connect_database(&database_url).await {
            Some(pool) => Some(pool),
            None => return,
        },
        None => {
            tracing::warn!("DATABASE_URL is not set; visit storage and leaderboard will return 503");
            None
        }
    };

    let state = AppState::new(db);
    tracing::info!(
        leaderboard_cache_ttl_secs = state.leaderboard_cache_ttl.as_secs(),
        leaderboard_max_limit = state.leaderboard_max_limit,
        "application state ready"
    );
    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Travel map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

/// Connects and applies migrations. Failures are logged and yield None.
async fn connect_database(database_url: &str) -> Option<PgPool> {
    let db_max_connections = config::db_max_connections();
    tracing::info!(db_max_connections, "Connecting to PostgreSQL...");
    let pool = match PgPoolOptions::new()
        .max_connections(db_max_connections)
        .connect(database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to PostgreSQL");
            return None;
        }
    };
    if let Err(e) = db_migrations::run(&pool).await {
        tracing::error!(error = %e, "failed to run migrations");
        return None;
    }
    tracing::info!("Database connected and migrations applied");
    Some(pool)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
