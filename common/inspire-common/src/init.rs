//! Tracing initialization shared by the MCP server and the verification proxy

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing to stderr
///
/// stdout is reserved for the MCP protocol, so every service logs to stderr:
/// - `RUST_LOG` filtering, with `<crate_name>=info` added as the default directive
/// - `LOG_FORMAT=json` switches to structured JSON lines
///
/// # Example
///
/// ```rust,ignore
/// inspire_common::init_tracing("verify_proxy")?;
/// ```
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    if json_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

fn json_requested(log_format: Option<&str>) -> bool {
    log_format
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
