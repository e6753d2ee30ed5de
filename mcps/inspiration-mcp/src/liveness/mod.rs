//! Liveness checking
//!
//! Decides whether a candidate's preview is a reachable image. Checks are
//! delegated to injected [`LivenessProbe`]s, tried in order:
//!
//! 1. [`ProxyProbe`] - the verification proxy, which can read headers of any host
//! 2. [`DirectProbe`] - a HEAD request from this process
//! 3. the file-extension heuristic when every probe fails

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Liveness;

pub mod checker;
pub mod direct;
pub mod heuristics;
pub mod proxy;

pub use checker::LivenessChecker;
pub use direct::DirectProbe;
pub use proxy::ProxyProbe;

/// A way of checking whether a URL is reachable
///
/// An `Err` means "no usable answer" and the next probe is tried; a
/// definitive "dead" answer is `Ok` with `alive: false`.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn check_alive(&self, url: &str) -> Result<Liveness>;
}
