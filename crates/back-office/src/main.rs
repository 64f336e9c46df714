//! Admin web interface for CasaEmOrdem.
//!
//! Serves the review dashboard and audit queue as server-rendered HTML
//! plus a JSON API, over the shared SQLite database. Identity arrives in
//! trusted headers set by the external auth proxy.

mod config;
mod error;
mod identity;
mod routes;
mod state;

use database::Database;
use notifier::Notifier;
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting back-office server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Webhook client for allocation notices
    let notifier = Notifier::new(config.webhook_url.clone());

    // Build application state
    let state = AppState::new(db, notifier);

    // Build router
    let app = routes::router()
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Back-office server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
