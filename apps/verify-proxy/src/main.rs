//! Verification Proxy
//!
//! Reports liveness and content type of arbitrary URLs for callers that
//! cannot read cross-origin response headers themselves.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use verify_proxy::{ProxyConfig, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(name = "verify-proxy")]
#[command(about = "HEAD-check proxy for image liveness verification")]
struct Cli {
    /// Port to listen on
    #[arg(long, short, env = "VERIFY_PROXY_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Timeout for the upstream HEAD request in milliseconds
    #[arg(long, env = "VERIFY_PROXY_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Bind only to 127.0.0.1 instead of all interfaces
    #[arg(long)]
    local: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    inspire_common::init_tracing("verify_proxy")?;

    let cli = Cli::parse();

    let config = ProxyConfig {
        host: if cli.local { [127, 0, 0, 1] } else { [0, 0, 0, 0] },
        port: cli.port,
        timeout: Duration::from_millis(cli.timeout_ms),
    };

    verify_proxy::serve(config).await
}
