//! Core types shared across the pipeline stages
//!
//! Everything here lives for a single pipeline invocation only.

use serde::{Deserialize, Serialize};

/// What to search for, synthesized once from the input image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    /// Compact 6-12 word search query
    pub query: String,
    /// Source-preference modifiers, supplemental quality terms last
    pub modifiers: Vec<String>,
    /// Style / material / building-type descriptors used for scoring
    pub tags: Vec<String>,
}

/// Which upstream shape a candidate was normalized from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    StockPhoto,
    Grounded,
    FallbackJson,
    HarvestedUrl,
}

/// The retrieval stage whose output became the candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStage {
    StockPhoto,
    Grounded,
    FreeText,
}

impl RetrievalStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStage::StockPhoto => "stock_photo",
            RetrievalStage::Grounded => "grounded",
            RetrievalStage::FreeText => "free_text",
        }
    }
}

impl std::fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unvalidated reference to a possible inspiration image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Source page or direct resource; never empty once normalized
    pub uri: String,
    pub title: String,
    /// Hostname the candidate came from
    pub source: String,
    /// Image shown to the user; may be replaced by a page snapshot
    pub preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
    pub origin: CandidateOrigin,
}

/// Outcome of a single liveness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liveness {
    pub alive: bool,
    pub content_type: Option<String>,
}

impl Liveness {
    pub fn dead() -> Self {
        Self {
            alive: false,
            content_type: None,
        }
    }

    pub fn new(alive: bool, content_type: Option<String>) -> Self {
        Self {
            alive,
            content_type,
        }
    }
}

/// A candidate after liveness validation, scored by the ranker
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub candidate: Candidate,
    pub alive: bool,
    pub content_type: Option<String>,
    pub score: f64,
}

/// A selected result as handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspiration {
    pub uri: String,
    pub title: String,
    pub source: String,
    pub preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
}

impl From<Candidate> for Inspiration {
    fn from(candidate: Candidate) -> Self {
        Self {
            uri: candidate.uri,
            title: candidate.title,
            source: candidate.source,
            preview_url: candidate.preview_url,
            match_reason: candidate.match_reason,
        }
    }
}

/// Result of one pipeline invocation
///
/// `Completed` with an empty list means nothing usable was found, which the
/// caller must present differently from an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(Vec<Inspiration>),
    Cancelled,
}
