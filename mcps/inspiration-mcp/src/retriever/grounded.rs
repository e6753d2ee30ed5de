//! Grounded web-search stage

use async_trait::async_trait;
use std::sync::Arc;

use super::{harvest, RawCandidate, RetrievalStrategy};
use crate::backends::{Citation, GroundedSearch};
use crate::error::Result;
use crate::extract::host_of;
use crate::snapshot::SnapshotService;
use crate::types::{Candidate, CandidateOrigin, RetrievalStage, SearchIntent};

/// Gemini routes grounded citations through this redirect host and puts the
/// real domain in the title.
const REDIRECT_HOST: &str = "vertexaisearch.cloud.google.com";

pub struct GroundedStrategy {
    backend: Arc<dyn GroundedSearch>,
}

impl GroundedStrategy {
    pub fn new(backend: Arc<dyn GroundedSearch>) -> Self {
        Self { backend }
    }

    pub fn prompt(intent: &SearchIntent, limit: usize) -> String {
        format!(
            "Search the web for {limit} pages that show real photographs similar to: {query}.\n\
             Prefer: {modifiers}.\n\
             Visual cues: {tags}.\n\
             For each result give the page URL, a short title and, if available, \
             a direct image URL ending in .jpg, .png or .webp.",
            query = intent.query,
            modifiers = intent.modifiers.join(", "),
            tags = intent.tags.join(", "),
        )
    }
}

#[async_trait]
impl RetrievalStrategy for GroundedStrategy {
    fn stage(&self) -> RetrievalStage {
        RetrievalStage::Grounded
    }

    /// Citations become candidates. Without citations the stage is empty,
    /// so the free-text fallback runs next instead of mining this text.
    async fn retrieve(
        &self,
        intent: &SearchIntent,
        count: usize,
        limit: usize,
    ) -> Result<Vec<RawCandidate>> {
        let response = self
            .backend
            .search_grounded(&Self::prompt(intent, limit))
            .await?;

        if response.citations.is_empty() {
            tracing::debug!(backend = self.backend.name(), "Grounded search returned no citations");
            return Ok(Vec::new());
        }

        let mut raw: Vec<RawCandidate> = response
            .citations
            .into_iter()
            .map(RawCandidate::Grounded)
            .collect();
        harvest::supplement(&mut raw, &response.text, count);

        Ok(raw)
    }
}

pub(super) fn normalize(citation: Citation, snapshot: &SnapshotService) -> Option<Candidate> {
    let uri = citation.uri.trim().to_string();
    if uri.is_empty() {
        return None;
    }

    let title = citation.title.trim().to_string();
    let host = host_of(&uri).unwrap_or_default();
    let source = if host == REDIRECT_HOST && looks_like_domain(&title) {
        title.to_ascii_lowercase()
    } else {
        host
    };

    let preview_url = citation
        .image_url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| snapshot.snapshot_url(&uri))
        .unwrap_or_else(|| uri.clone());

    Some(Candidate {
        title: if title.is_empty() { source.clone() } else { title },
        match_reason: Some("Cited by grounded web search".to_string()),
        uri,
        source,
        preview_url,
        origin: CandidateOrigin::Grounded,
    })
}

fn looks_like_domain(title: &str) -> bool {
    !title.is_empty() && title.contains('.') && !title.contains(char::is_whitespace)
}
