//! Daemon entry point for the pathways MCP server.
//!
//! Loads configuration from the environment, loads the initial catalog
//! snapshot, and serves MCP over stdio and/or streamable HTTP alongside the
//! refresh endpoint.

mod catalog;
mod config;

use std::future::Future;
use std::pin::Pin;

use futures::future::try_join_all;
use pathways_core::control::PathwaysControlPlane;
use pathways_mcp::PathwaysMcp;
use pathways_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use pathways_refresh::{RefreshServer, RefreshServerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::build_catalog;
use crate::config::PathwaysConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Surface = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = PathwaysConfig::from_args()?;
    init_tracing(&config.log_filter);

    let catalog = build_catalog(&config)?;
    if catalog.has_source() {
        match catalog.refresh().await {
            Ok(report) => info!(
                snapshot_id = %report.snapshot_id,
                segments = report.stats.segments,
                "initial snapshot loaded"
            ),
            Err(err) => error!(error = %err, "initial snapshot load failed; serving unavailable until a refresh succeeds"),
        }
    } else {
        warn!("no snapshot path configured; waiting for a pushed snapshot");
    }
    let _refresher = catalog.clone().spawn_refresher();

    let control = PathwaysControlPlane::new(catalog.clone());
    let server = PathwaysMcp::new(control).with_response_limit(config.response_char_limit);

    let mut surfaces: Vec<Surface> = Vec::new();
    if config.refresh_serve {
        let refresh_config = RefreshServerConfig::new(config.refresh_addr)
            .with_request_timeout(config.refresh_timeout)
            .with_max_body_bytes(config.refresh_max_body_bytes);
        surfaces.push(Box::pin(RefreshServer::new(catalog, refresh_config).serve()));
    }
    if config.mcp_serve {
        let http_config = McpHttpServerConfig::new(config.mcp_http_addr)
            .with_stateful_mode(config.mcp_stateful)
            .with_sse_keep_alive(config.sse_keep_alive);
        surfaces.push(Box::pin(serve_streamable_http(server.clone(), http_config)));
    }
    if config.enable_stdio {
        surfaces.push(Box::pin(serve_stdio(server)));
    }

    try_join_all(surfaces).await?;
    Ok(())
}

/// Logs go to stderr so stdio MCP framing on stdout stays intact.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
