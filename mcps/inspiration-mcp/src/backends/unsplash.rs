//! Unsplash backend
//!
//! Implements [`StockPhotoSearch`] against the Unsplash search API.
//! See: https://unsplash.com/documentation#search-photos

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{StockPhoto, StockPhotoSearch};
use crate::config::StockConfig;
use crate::error::{InspirationError, Result};

/// Unsplash allows at most 30 results per page
const MAX_PER_PAGE: usize = 30;

/// Unsplash backend
pub struct UnsplashBackend {
    client: Client,
    config: StockConfig,
}

impl UnsplashBackend {
    pub fn new(config: StockConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("inspiration-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }
}

// Unsplash API response types
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    description: Option<String>,
    alt_description: Option<String>,
    urls: Option<PhotoUrls>,
    user: Option<PhotoUser>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: Option<String>,
}

impl From<UnsplashPhoto> for StockPhoto {
    fn from(photo: UnsplashPhoto) -> Self {
        let (image_url, preview_url) = photo
            .urls
            .map(|u| (u.regular, u.small))
            .unwrap_or((None, None));

        StockPhoto {
            id: photo.id,
            image_url,
            preview_url,
            description: photo.description.or(photo.alt_description),
            photographer: photo.user.and_then(|u| u.name),
        }
    }
}

#[async_trait]
impl StockPhotoSearch for UnsplashBackend {
    fn name(&self) -> &str {
        "unsplash"
    }

    fn is_available(&self) -> bool {
        !self.config.access_key.is_empty()
    }

    async fn search_photos(&self, keywords: &str, per_page: usize) -> Result<Vec<StockPhoto>> {
        if !self.is_available() {
            return Err(InspirationError::Config(
                "UNSPLASH_ACCESS_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/search/photos", self.config.base_url.trim_end_matches('/'));
        let per_page = per_page.clamp(1, MAX_PER_PAGE).to_string();

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.config.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", keywords),
                ("per_page", per_page.as_str()),
                ("content_filter", "high"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(InspirationError::Upstream {
                service: "unsplash".to_string(),
                status,
                body: text,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().map(StockPhoto::from).collect())
    }
}
