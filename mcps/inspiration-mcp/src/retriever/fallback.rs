//! Free-text JSON fallback stage
//!
//! Some grounded responses carry no citations. This stage asks the model
//! directly for a JSON array and recovers what it can from the answer:
//! embedded JSON first, then bare URLs.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{harvest, RawCandidate, RetrievalStrategy};
use crate::backends::TextModel;
use crate::error::{InspirationError, Result};
use crate::extract::{harvest_urls, host_of, json_values};
use crate::liveness::heuristics::has_image_extension;
use crate::snapshot::SnapshotService;
use crate::types::{Candidate, CandidateOrigin, RetrievalStage, SearchIntent};

/// Keys under which models sometimes nest the array
const WRAPPER_KEYS: &[&str] = &["results", "items", "images", "inspirations", "references"];

/// One object of the requested JSON array
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEntry {
    #[serde(alias = "uri", alias = "link", alias = "pageUrl")]
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "image_url", alias = "image", alias = "thumbnail")]
    pub image_url: Option<String>,
    pub source: Option<String>,
    #[serde(alias = "match_reason", alias = "reason")]
    pub match_reason: Option<String>,
}

impl FallbackEntry {
    /// Page URL, or the image URL when no page was given
    pub fn uri(&self) -> Option<&str> {
        non_empty(self.url.as_deref()).or_else(|| non_empty(self.image_url.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct FreeTextStrategy {
    backend: Arc<dyn TextModel>,
}

impl FreeTextStrategy {
    pub fn new(backend: Arc<dyn TextModel>) -> Self {
        Self { backend }
    }

    pub fn prompt(intent: &SearchIntent, limit: usize) -> String {
        format!(
            "Find {limit} publicly accessible photographs similar to: {query}.\n\
             Prefer: {modifiers}. Visual cues: {tags}.\n\
             Respond ONLY with a JSON array of objects with the keys \
             \"url\" (page URL), \"title\", \"imageUrl\" (direct image URL), \
             \"source\" (site name) and \"matchReason\" (one short sentence).",
            query = intent.query,
            modifiers = intent.modifiers.join(", "),
            tags = intent.tags.join(", "),
        )
    }
}

#[async_trait]
impl RetrievalStrategy for FreeTextStrategy {
    fn stage(&self) -> RetrievalStage {
        RetrievalStage::FreeText
    }

    async fn retrieve(
        &self,
        intent: &SearchIntent,
        count: usize,
        limit: usize,
    ) -> Result<Vec<RawCandidate>> {
        let text = self.backend.generate(&Self::prompt(intent, limit)).await?;

        let mut raw = parse_response(&text);
        harvest::supplement(&mut raw, &text, count);

        Ok(raw)
    }
}

/// Recover candidates from the model's answer: embedded JSON entries when
/// present, otherwise every bare URL in the text.
pub fn parse_response(text: &str) -> Vec<RawCandidate> {
    match parse_entries(text) {
        Ok(entries) => entries.into_iter().map(RawCandidate::FallbackJson).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to URL extraction");
            harvest_urls(text)
                .into_iter()
                .map(RawCandidate::HarvestedUrl)
                .collect()
        }
    }
}

/// Entries from the first embedded JSON value that yields any; values with
/// nothing usable (citation markers like `[1]`) are passed over.
fn parse_entries(text: &str) -> Result<Vec<FallbackEntry>> {
    let mut saw_json = false;

    for value in json_values(text) {
        saw_json = true;
        let entries = entries_from(value);
        if !entries.is_empty() {
            return Ok(entries);
        }
    }

    Err(InspirationError::MalformedResponse(if saw_json {
        "JSON contained no usable entries".to_string()
    } else {
        "no JSON object or array in response".to_string()
    }))
}

fn entries_from(value: Value) -> Vec<FallbackEntry> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_else(|| vec![Value::Object(map)]),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<FallbackEntry>(item).ok())
        .filter(|entry| entry.uri().is_some())
        .collect()
}

pub(super) fn normalize(entry: FallbackEntry, snapshot: &SnapshotService) -> Option<Candidate> {
    let uri = entry.uri()?.to_string();
    let image_url = non_empty(entry.image_url.as_deref()).map(str::to_string);

    let source = non_empty(entry.source.as_deref())
        .map(str::to_string)
        .or_else(|| host_of(&uri))
        .unwrap_or_default();

    let preview_url = image_url
        .or_else(|| has_image_extension(&uri).then(|| uri.clone()))
        .or_else(|| snapshot.snapshot_url(&uri))
        .unwrap_or_else(|| uri.clone());

    Some(Candidate {
        title: non_empty(entry.title.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| harvest::placeholder_title(&source)),
        match_reason: non_empty(entry.match_reason.as_deref()).map(str::to_string),
        uri,
        source,
        preview_url,
        origin: CandidateOrigin::FallbackJson,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_json() {
        let text = "Here you go:\n```json\n[\n  {\"url\": \"https://a.com/p\", \"title\": \"A\", \
                    \"imageUrl\": \"https://a.com/p.jpg\", \"source\": \"A Mag\", \
                    \"matchReason\": \"same cladding\"},\n  {\"title\": \"no url\"}\n]\n```";

        let raw = parse_response(text);
        assert_eq!(raw.len(), 1);
        let RawCandidate::FallbackJson(entry) = &raw[0] else {
            panic!("expected a JSON entry");
        };
        assert_eq!(entry.image_url.as_deref(), Some("https://a.com/p.jpg"));
        assert_eq!(entry.match_reason.as_deref(), Some("same cladding"));
    }

    #[test]
    fn test_parse_object_wrapper_and_aliases() {
        let text = r#"{"results": [{"link": "https://b.com/q", "image": "https://b.com/q.png"}]}"#;
        let raw = parse_response(text);
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].uri(), Some("https://b.com/q"));
    }

    #[test]
    fn test_parse_skips_citation_markers_before_array() {
        let text = "Based on source [1], here you go: [{\"url\":\"https://d.org/house\",\
                    \"title\":\"Courtyard house\",\"imageUrl\":\"https://d.org/house.jpg\"}]";

        let raw = parse_response(text);
        assert_eq!(raw.len(), 1);
        let RawCandidate::FallbackJson(entry) = &raw[0] else {
            panic!("expected a JSON entry");
        };
        assert_eq!(entry.title.as_deref(), Some("Courtyard house"));
        assert_eq!(entry.image_url.as_deref(), Some("https://d.org/house.jpg"));
    }

    #[test]
    fn test_malformed_json_falls_back_to_urls() {
        let text = "[{url: https://c.com/one.jpg, title: broken}, https://d.com/two]";
        let raw = parse_response(text);
        assert_eq!(
            raw,
            vec![
                RawCandidate::HarvestedUrl("https://c.com/one.jpg".to_string()),
                RawCandidate::HarvestedUrl("https://d.com/two".to_string()),
            ]
        );
    }

    #[test]
    fn test_normalize_entry() {
        let entry = FallbackEntry {
            url: Some("https://www.e.com/project".to_string()),
            title: None,
            image_url: None,
            source: None,
            match_reason: Some("  ".to_string()),
        };

        let candidate = normalize(entry, &SnapshotService::disabled()).unwrap();
        assert_eq!(candidate.source, "e.com");
        assert_eq!(candidate.title, "Reference from e.com");
        assert_eq!(candidate.preview_url, "https://www.e.com/project");
        assert_eq!(candidate.match_reason, None);
        assert_eq!(candidate.origin, CandidateOrigin::FallbackJson);
    }

    #[test]
    fn test_normalize_image_only_entry() {
        let entry = FallbackEntry {
            image_url: Some("https://f.com/photo.webp".to_string()),
            ..FallbackEntry::default()
        };

        let candidate = normalize(entry, &SnapshotService::disabled()).unwrap();
        assert_eq!(candidate.uri, "https://f.com/photo.webp");
        assert_eq!(candidate.preview_url, "https://f.com/photo.webp");
    }
}
