//! Gemini backend
//!
//! Implements [`VisionModel`], [`GroundedSearch`] and [`TextModel`] on top of
//! the `generateContent` REST endpoint.
//! See: https://ai.google.dev/api/generate-content

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Citation, GroundedResponse, GroundedSearch, TextModel, VisionModel};
use crate::config::GeminiConfig;
use crate::error::{InspirationError, Result};

/// Gemini backend
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("inspiration-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate_content(&self, body: Value) -> Result<GenerateResponse> {
        if !self.is_available() {
            return Err(InspirationError::Config(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(InspirationError::Upstream {
                service: "gemini".to_string(),
                status,
                body: text,
            });
        }

        Ok(response.json().await?)
    }
}

// Gemini API response types
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
    #[serde(alias = "imageUrl", alias = "image")]
    image_url: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// Web citations of the first candidate; chunks without a URI are skipped
    fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.as_ref().filter(|u| !u.is_empty())?;
                        Some(Citation {
                            uri: uri.clone(),
                            title: web.title.clone().unwrap_or_default(),
                            image_url: web.image_url.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionModel for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn describe(&self, image: &[u8], mime_type: &str, instruction: &str) -> Result<String> {
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inline_data": { "mime_type": mime_type, "data": data } },
                    { "text": instruction }
                ]
            }]
        });

        let response = self.generate_content(body).await?;
        Ok(response.text())
    }
}

#[async_trait]
impl GroundedSearch for GeminiBackend {
    fn name(&self) -> &str {
        "gemini-grounded"
    }

    async fn search_grounded(&self, prompt: &str) -> Result<GroundedResponse> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "tools": [{ "google_search": {} }]
        });

        let response = self.generate_content(body).await?;
        Ok(GroundedResponse {
            text: response.text(),
            citations: response.citations(),
        })
    }
}

#[async_trait]
impl TextModel for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let response = self.generate_content(body).await?;
        Ok(response.text())
    }
}
