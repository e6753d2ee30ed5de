//! Page screenshot service
//!
//! Used when a candidate is a page rather than an image: the rendered
//! screenshot becomes its preview.

use crate::config::SnapshotConfig;

#[derive(Debug, Clone)]
pub struct SnapshotService {
    base_url: Option<String>,
}

impl SnapshotService {
    pub fn new(config: &SnapshotConfig) -> Self {
        let base_url = (config.enabled && !config.base_url.is_empty())
            .then(|| config.base_url.clone());
        Self { base_url }
    }

    pub fn disabled() -> Self {
        Self { base_url: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Screenshot URL for `page_url`, or `None` when disabled
    pub fn snapshot_url(&self, page_url: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, page_url))
    }

    /// Whether `url` already points at this service
    pub fn is_snapshot(&self, url: &str) -> bool {
        self.base_url
            .as_ref()
            .is_some_and(|base| url.starts_with(base.as_str()))
    }
}
