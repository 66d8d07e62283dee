//! Scholarship Management API
//! Mission: Publish scholarships, collect applications, review them
//! Phase 1: Persistence, authentication and role gating

use anyhow::{Context, Result};
use scholarship_backend::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();

    init_tracing();

    info!("🎓 Scholarship API starting");
    info!("🗄️  Database: {}", config.database_path);

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config).context("Failed to initialise application state")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("🎯 API server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with an env-overridable filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholarship_backend=debug,scholarship=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
