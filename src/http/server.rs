//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (auth gate, tracing, request IDs)
//! - Bind server to listener, serve with graceful shutdown
//!
//! All state is read-only after construction: configuration, path policy,
//! resolver and client are built once and shared via `Arc`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{auth_gate, PathPolicy, SessionCodec};
use crate::config::ProxyConfig;
use crate::forward::Forwarder;
use crate::http::handlers;
use crate::routing::UpstreamResolver;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub policy: Arc<PathPolicy>,
    pub codec: SessionCodec,
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Build all subsystems from a configuration snapshot.
    pub fn from_config(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        // Connect timeout only. A total request timeout would cut off
        // long-lived streaming responses.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        let codec = SessionCodec::new(config.auth.secure_cookies);
        let resolver = UpstreamResolver::from_config(&config.upstream);
        let forwarder = Arc::new(Forwarder::new(client, resolver, Arc::new(codec.clone())));

        Ok(Self {
            policy: Arc::new(PathPolicy::from_config(&config.auth)),
            codec,
            forwarder,
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::from_config(config)?;
        let config = state.config.clone();
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let root = state.config.proxy.root.trim_end_matches('/').to_string();

        Router::new()
            .route(&format!("{root}/auth/login"), post(handlers::login))
            .route(&format!("{root}/auth/logout"), post(handlers::logout))
            .route(&format!("{root}/auth/me"), get(handlers::current_user))
            .route(&format!("{root}/chat"), post(handlers::chat))
            .route(&format!("{root}/ai/chat"), post(handlers::chat))
            .route(&root, any(handlers::forward_any))
            .route(&format!("{root}/{{*path}}"), any(handlers::forward_any))
            .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.proxy.root,
            primary = %self.config.upstream.primary.base_url,
            ai = %self.config.upstream.ai.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
