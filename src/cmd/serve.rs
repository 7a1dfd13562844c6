/*!
`serve.rs`

Implements `kali-mcp-server serve [--transport stdio|http] [--bind HOST:PORT]`.

  stdio  MCP over stdin/stdout (default). Logs stay on stderr.
  http   Streamable HTTP at `/mcp` plus `/health`. The bind address defaults
         to the `eventStream` section of the server configuration.

Background processes (Burp launched with `burp_start`) are stopped when the
server exits.
*/

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use rmcp::ServiceExt;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::mcp::{KaliServer, SERVER_NAME, VERSION, http};
use crate::tools::Toolbox;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    /// MCP over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP
    Http,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Transport to expose the server on
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Bind address for the HTTP transport (default: eventStream host:port)
    #[arg(long, value_name = "HOST:PORT")]
    pub bind: Option<String>,
}

pub fn execute_serve(args: ServeArgs, config: &AppConfig) -> Result<()> {
    let bind = match args.transport {
        Transport::Http => Some(http_bind(&args, config)?),
        Transport::Stdio => None,
    };
    if config.server.socket_endpoint.enabled {
        warn!(
            addr = %config.server.socket_endpoint.address(),
            "socketEndpoint is enabled but no socket transport is provided; ignoring"
        );
    }

    let toolbox = Arc::new(Toolbox::new(config)?);
    let server = KaliServer::new(toolbox.clone());
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    info!(name = SERVER_NAME, version = VERSION, transport = ?args.transport, "starting MCP server");
    let result = rt.block_on(async {
        match bind {
            Some(addr) => http::serve(server, &addr, shutdown_signal()).await,
            None => serve_stdio(server).await,
        }
    });

    toolbox.runner().shutdown();
    info!("MCP server stopped");
    result
}

/// Resolve the HTTP bind address. `--bind` wins over the configuration,
/// which must have `eventStream` enabled otherwise.
fn http_bind(args: &ServeArgs, config: &AppConfig) -> Result<String> {
    if let Some(bind) = &args.bind {
        return Ok(bind.clone());
    }
    let endpoint = &config.server.event_stream;
    if !endpoint.enabled {
        bail!("eventStream is disabled in the server configuration; pass --bind to override");
    }
    Ok(endpoint.address())
}

async fn serve_stdio(server: KaliServer) -> Result<()> {
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start stdio transport")?;
    service.waiting().await.context("stdio transport error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
