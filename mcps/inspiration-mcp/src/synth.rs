//! Query synthesis
//!
//! One vision call turns the reference image into a [`SearchIntent`]. The
//! model is asked for exactly three lines: query, modifiers, tags.

use std::sync::Arc;

use crate::backends::VisionModel;
use crate::error::{InspirationError, Result};
use crate::types::SearchIntent;

/// Always appended to the modifiers to bias later stages toward real,
/// high-resolution photographs.
pub const SUPPLEMENTAL_MODIFIERS: &[&str] = &[
    "photography",
    "high resolution",
    "real world",
    "architecture",
];

/// Labels the model sometimes prefixes lines with
const LINE_LABELS: &[&str] = &["query", "search query", "modifiers", "sources", "tags"];

pub struct QuerySynthesizer {
    vision: Arc<dyn VisionModel>,
}

impl QuerySynthesizer {
    pub fn new(vision: Arc<dyn VisionModel>) -> Self {
        Self { vision }
    }

    pub fn instruction(count: usize) -> String {
        format!(
            "You are helping an architect find {count} real-world reference photographs \
             similar to the attached image.\n\
             Reply with exactly three lines and nothing else:\n\
             1. A 6-12 word web image search query emphasizing building type, \
             materials and architectural style.\n\
             2. A comma-separated list of preferred source types or sites \
             (for example: architecture magazines, stock photography).\n\
             3. A comma-separated list of 3-8 short tags describing style, \
             materials and building type."
        )
    }

    /// Synthesize a [`SearchIntent`] for `image`.
    ///
    /// Transport failures of the vision call propagate unchanged; any other
    /// failure, including an empty query, becomes [`InspirationError::Synthesis`].
    pub async fn synthesize(
        &self,
        image: &[u8],
        mime_type: &str,
        count: usize,
    ) -> Result<SearchIntent> {
        let text = self
            .vision
            .describe(image, mime_type, &Self::instruction(count))
            .await
            .map_err(|e| match e {
                InspirationError::Transport(_) => e,
                other => InspirationError::Synthesis(other.to_string()),
            })?;

        let intent = parse_intent(&text)?;
        tracing::info!(
            model = self.vision.name(),
            query = %intent.query,
            tags = ?intent.tags,
            "Synthesized search intent"
        );
        Ok(intent)
    }
}

/// Parse the three-line answer into a [`SearchIntent`]
pub fn parse_intent(text: &str) -> Result<SearchIntent> {
    let mut lines = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(clean_line)
        .filter(|line| !line.is_empty());

    let query = lines.next().unwrap_or_default();
    if query.is_empty() {
        return Err(InspirationError::Synthesis(
            "model returned no search query".to_string(),
        ));
    }

    let mut modifiers = split_list(lines.next().as_deref().unwrap_or_default());
    let tags = split_list(lines.next().as_deref().unwrap_or_default());

    for extra in SUPPLEMENTAL_MODIFIERS {
        if !modifiers.iter().any(|m| m.eq_ignore_ascii_case(extra)) {
            modifiers.push(extra.to_string());
        }
    }

    Ok(SearchIntent {
        query,
        modifiers,
        tags,
    })
}

/// Strip list numbering, bullets, labels and wrapping quotes
fn clean_line(line: &str) -> String {
    let mut line = line.trim();

    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        line = &line[digits + 1..];
    }
    line = line.trim_start().trim_start_matches(['-', '•']).trim();

    if let Some((label, rest)) = line.split_once(':') {
        let label = label.trim().trim_matches('*').to_ascii_lowercase();
        if LINE_LABELS.contains(&label.as_str()) {
            line = rest.trim();
        }
    }

    line.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Comma-separated list, trimmed, without empties or case-insensitive duplicates
fn split_list(line: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in line.split(',') {
        let item = item.trim().trim_end_matches('.').trim();
        if !item.is_empty() && !items.iter().any(|i| i.eq_ignore_ascii_case(item)) {
            items.push(item.to_string());
        }
    }
    items
}
