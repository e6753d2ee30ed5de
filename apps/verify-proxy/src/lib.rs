//! Verification Proxy
//!
//! A minimal stateless HTTP service that performs a single HEAD request
//! against an arbitrary target URL and reports `{alive, status, contentType}`.
//! Browsers cannot read response headers from arbitrary cross-origin hosts,
//! so the inspiration pipeline asks this proxy instead.
//!
//! # Endpoints
//! - `GET /verify?url=<percent-encoded target>`
//! - `GET /health`

pub mod verify;

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use verify::{ErrorResponse, VerifyParams, VerifyResponse};

/// Default listen port
pub const DEFAULT_PORT: u16 = 8787;

/// Default timeout for the upstream HEAD request, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Configuration for the proxy server
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: [u8; 4],
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: [0, 0, 0, 0],
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct ProxyState {
    pub client: reqwest::Client,
}

impl ProxyState {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("verify-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

/// Build the router with permissive CORS
pub fn create_router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/verify", get(verify::verify))
        .route("/health", get(verify::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the proxy and serve until the process exits
pub async fn serve(config: ProxyConfig) -> Result<()> {
    let state = ProxyState::new(config.timeout)?;
    let app = create_router(state);

    let addr = SocketAddr::from((config.host, config.port));
    tracing::info!(
        timeout_ms = config.timeout.as_millis() as u64,
        "Verification proxy listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
