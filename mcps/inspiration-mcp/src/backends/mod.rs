//! Collaborator capabilities
//!
//! The pipeline talks to its upstream services only through these traits so
//! tests and alternative providers can be swapped in without touching the
//! pipeline. Gemini covers vision, grounded search and the free-text
//! fallback; Unsplash covers stock photos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod gemini;
pub mod unsplash;

pub use gemini::GeminiBackend;
pub use unsplash::UnsplashBackend;

/// Describe an image given an instruction
#[async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    async fn describe(&self, image: &[u8], mime_type: &str, instruction: &str) -> Result<String>;
}

/// A source reference attached to a grounded answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
    /// Direct image link, when the provider embeds one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Free text plus whatever citations the provider attached
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundedResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Web search with citations
#[async_trait]
pub trait GroundedSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search_grounded(&self, prompt: &str) -> Result<GroundedResponse>;
}

/// Plain text generation
#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A photo record from a stock-photo provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockPhoto {
    pub id: String,
    /// Full-size direct image URL
    pub image_url: Option<String>,
    /// Smaller direct image URL for display
    pub preview_url: Option<String>,
    pub description: Option<String>,
    pub photographer: Option<String>,
}

/// Keyword search against a stock-photo provider
#[async_trait]
pub trait StockPhotoSearch: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a credential is configured; the stage is skipped otherwise
    fn is_available(&self) -> bool;

    async fn search_photos(&self, keywords: &str, per_page: usize) -> Result<Vec<StockPhoto>>;
}
