//! edge-proxy
//!
//! An authenticated reverse-proxy edge layer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 EDGE PROXY                    │
//!                    │                                               │
//!  Browser request   │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!  ──────────────────┼─▶│  http    │──▶│  auth    │──▶│ routing  │  │
//!  (session cookies) │  │  server  │   │  gate    │   │ resolver │  │
//!                    │  └──────────┘   └──────────┘   └────┬─────┘  │
//!                    │                                     │        │
//!                    │                                     ▼        │
//!  Browser response  │  ┌──────────┐   ┌──────────────────────────┐ │     Primary /
//!  ◀─────────────────┼──│ buffered │◀──│        forwarder         │◀┼──── AI upstream
//!  (JSON or SSE)     │  │or stream │   │ (credentials, relay)     │ │
//!                    │  └──────────┘   └──────────────────────────┘ │
//!                    │                                               │
//!                    │  cross-cutting: config snapshot, session      │
//!                    │  codec, structured logging, request IDs       │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_proxy::config::{load_config, ProxyConfig};
use edge_proxy::http::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "edge-proxy", about = "Authenticated reverse-proxy edge layer")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    // RUST_LOG wins; the configured level is the fallback.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "edge_proxy={},tower_http={}",
            config.observability.log_level, config.observability.log_level
        )
        .into()
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("edge-proxy v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        proxy_root = %config.proxy.root,
        public_paths = config.auth.public_paths.len(),
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
