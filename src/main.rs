use std::sync::Arc;

use kehilla_api::config::{config, CONFIG};
use kehilla_api::database::{DatabaseManager, PgStore};
use kehilla_api::router::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!("Starting Kehilla API in {:?} mode", config.environment);

    let pool = DatabaseManager::main_pool().await?;
    if CONFIG.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    let state = AppState::new(Arc::new(PgStore::new(pool)));
    let app = router::app(state);

    let bind_addr = format!("0.0.0.0:{}", CONFIG.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Kehilla API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    DatabaseManager::close_all().await;
    Ok(())
}
