//! Configuration loading for inspiration-mcp
//!
//! Configuration is loaded from:
//! 1. Environment variables (`GEMINI_API_KEY`, `GEMINI_MODEL`,
//!    `UNSPLASH_ACCESS_KEY`, `VERIFY_PROXY_URL`), highest priority
//! 2. Environment variable INSPIRATION_CONFIG_PATH
//! 3. ~/.inspire/inspiration.toml
//! 4. Default values

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Stock-photo provider (Unsplash)
    #[serde(default)]
    pub stock: StockConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Result count limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of results when the caller does not ask for a count
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Upper bound on requested results
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Candidates requested from sources per wanted result
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
}

/// Gemini configuration (vision, grounded search and free-text fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u64,
}

/// Stock-photo search configuration; an empty key disables the stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    #[serde(default, skip_serializing)]
    pub access_key: String,
    #[serde(default = "default_stock_url")]
    pub base_url: String,
}

/// Liveness checking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Verification proxy `/verify` endpoint; empty disables the proxy hop
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    /// Timeout per individual check
    #[serde(default = "default_check_timeout")]
    pub timeout_ms: u64,
    /// Fall back to a HEAD request from this process
    #[serde(default = "default_true")]
    pub direct_fallback: bool,
}

/// Page screenshot service used for previews of non-image pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// The page URL is appended verbatim to this prefix
    #[serde(default = "default_snapshot_url")]
    pub base_url: String,
}

/// Ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Trusted photography / architecture hosts (subdomains match too)
    #[serde(default = "default_preferred_hosts")]
    pub preferred_hosts: Vec<String>,
}

// Default value functions
fn default_count() -> usize {
    3
}

fn default_max_count() -> usize {
    12
}

fn default_candidate_multiplier() -> usize {
    3
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout() -> u64 {
    60
}

fn default_stock_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_proxy_url() -> String {
    "http://localhost:8787/verify".to_string()
}

fn default_check_timeout() -> u64 {
    3500
}

fn default_true() -> bool {
    true
}

fn default_snapshot_url() -> String {
    "https://image.thum.io/get/width/1200/".to_string()
}

fn default_preferred_hosts() -> Vec<String> {
    [
        "unsplash.com",
        "pexels.com",
        "archdaily.com",
        "dezeen.com",
        "designboom.com",
        "wikimedia.org",
        "flickr.com",
        "staticflickr.com",
        "behance.net",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            candidate_multiplier: default_candidate_multiplier(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_gemini_model(),
            base_url: default_gemini_url(),
            timeout_seconds: default_gemini_timeout(),
        }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            base_url: default_stock_url(),
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            timeout_ms: default_check_timeout(),
            direct_fallback: default_true(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_snapshot_url(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preferred_hosts: default_preferred_hosts(),
        }
    }
}

impl LivenessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_path();

        let mut config = if let Some(path) = config_path {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml(&content)?
            } else {
                tracing::info!("Config file not found, using defaults");
                Self::default()
            }
        } else {
            tracing::info!("No config path specified, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup`; empty values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(key) = get("UNSPLASH_ACCESS_KEY") {
            self.stock.access_key = key;
        }
        if let Some(url) = get("VERIFY_PROXY_URL") {
            self.liveness.proxy_url = url;
        }
    }

    /// Clamp a caller-requested count to `[0, max_count]`
    pub fn resolve_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.search.default_count)
            .min(self.search.max_count)
    }

    /// Find the configuration file path
    fn find_config_path() -> Option<PathBuf> {
        // 1. Check environment variable
        if let Ok(path) = std::env::var("INSPIRATION_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        // 2. Check ~/.inspire/inspiration.toml
        if let Ok(home) = std::env::var("HOME") {
            let path = PathBuf::from(home).join(".inspire").join("inspiration.toml");
            return Some(path);
        }

        None
    }
}
