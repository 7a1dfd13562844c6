//! Streamable HTTP transport: MCP at `/mcp`, liveness at `/health`.

use std::future::Future;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::{Value, json};
use tracing::info;

use super::{KaliServer, SERVER_NAME, VERSION};

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": SERVER_NAME,
        "version": VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Each MCP session gets a clone of `server`; clones share one `Toolbox`.
pub fn router(server: KaliServer) -> Router {
    let mcp = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", mcp)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(server: KaliServer, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr().context("failed to read bound address")?;
    info!(addr = %local, "MCP streamable HTTP endpoint at http://{local}/mcp");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}
