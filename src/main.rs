//! census-ingest - Student Profile Ingest Service
//!
//! Accepts spreadsheet exports of student self-reported profile data,
//! normalizes and validates them, and stages clean/flagged partitions for
//! admin review.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use census_ingest::config::Config;
use census_ingest::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting census-ingest (Student Profile Ingest) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::resolve().map_err(|e| anyhow::anyhow!("configuration: {}", e))?;
    info!("Database: {}", config.database_path.display());

    let db_pool = census_ingest::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool);
    let app = census_ingest::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
