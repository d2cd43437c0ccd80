//! IELTS practice backend
//!
//! - Axum HTTP API over per-exercise practice sessions
//! - Upstream task API for generation and remote grading
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   IELTS_CONFIG_PATH          : optional TOML config
//!   PORT                       : u16 (default 3000)
//!   STATIC_DIR                 : SPA directory (default ./static)
//!   IELTS_API_BASE_URL         : upstream task API (default http://127.0.0.1:8000)
//!   IELTS_REQUEST_TIMEOUT_SECS : upstream timeout, unset or 0 for none
//!   IELTS_CACHE_DIR            : task cache directory (default ./.task-cache)
//!   IELTS_LANGUAGE             : explanation language sent upstream (default zh)
//!   LOG_LEVEL                  : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                 : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, warn};

use ielts_practice::{router, telemetry, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    telemetry::init_tracing();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(target: "ielts_practice", error = %e, "Ignoring unreadable .env file");
        }
    }

    let config = AppConfig::load()?;
    let port = config.server.port;
    let state = Arc::new(AppState::new(config).await?);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(target: "ielts_practice", %addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(target: "ielts_practice", error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target: "ielts_practice", "Shutting down");
}
