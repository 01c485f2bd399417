use tracing::info;
use tracing_subscriber::EnvFilter;

use sitor_server::{AppState, ServerConfig, Store};
use sitor_shared::constants::APP_NAME;
use sitor_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sitor_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration (missing DATABASE_PATH or SECRET_KEY is fatal)
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env()?;
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the document store before accepting any request
    // -----------------------------------------------------------------------
    let database = Database::open_at(&config.database_path)?;
    let store = Store::new(database);

    let http_addr = config.http_addr;
    let app_state = AppState::new(store, config);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until it fails or Ctrl+C drains it
    // -----------------------------------------------------------------------
    if let Err(e) = sitor_server::serve(app_state, http_addr).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    Ok(())
}
