//! # MentorHero API Server
//!
//! This is the API server for MentorHero, a peer-tutoring marketplace:
//! learners browse tutors, request sessions, and both sides exchange
//! ratings after a session finalizes.
//!
//! ## Architecture
//!
//! The server is built with Axum and provides:
//! - Registration and login with JWT session tokens
//! - Profile and tutor directory endpoints with aggregated reputation
//! - The tutoring request lifecycle (create, accept/reject/cancel,
//!   finalize with rating)
//! - Public catalog data (majors and subjects)
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p mentorhero-api
//! ```

use mentorhero_api::{
    app::{build_router, AppState},
    config::Config,
};
use mentorhero_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mentorhero_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "MentorHero API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database pool
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    // Bring the schema up to date
    migrations::run_migrations(&db).await?;

    // Build Axum application
    let state = AppState::new(db.clone(), config.clone());
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    // Errors installing the handler leave no way to shut down cleanly
    // anyway, so treat them as an immediate shutdown
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {}", e);
    }
}
