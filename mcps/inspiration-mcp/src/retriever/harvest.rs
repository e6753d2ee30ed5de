//! Bare-URL harvesting from raw response text

use std::collections::HashSet;

use super::RawCandidate;
use crate::extract::{harvest_urls, host_of};
use crate::liveness::heuristics::has_image_extension;
use crate::snapshot::SnapshotService;
use crate::types::{Candidate, CandidateOrigin};

/// Append URLs found in `text` that are not already present, when fewer
/// than `wanted` candidates exist. These carry no metadata and rely entirely
/// on validation to earn a place.
pub fn supplement(raw: &mut Vec<RawCandidate>, text: &str, wanted: usize) {
    if raw.len() >= wanted {
        return;
    }

    let mut known: HashSet<String> = raw
        .iter()
        .flat_map(RawCandidate::urls)
        .map(str::to_string)
        .collect();

    let before = raw.len();
    for url in harvest_urls(text) {
        if known.insert(url.clone()) {
            raw.push(RawCandidate::HarvestedUrl(url));
        }
    }

    if raw.len() > before {
        tracing::debug!(added = raw.len() - before, "Harvested extra URLs from response text");
    }
}

pub(super) fn normalize(url: &str, snapshot: &SnapshotService) -> Option<Candidate> {
    let uri = url.trim();
    if uri.is_empty() {
        return None;
    }

    let source = host_of(uri).unwrap_or_default();
    let preview_url = if has_image_extension(uri) {
        uri.to_string()
    } else {
        snapshot
            .snapshot_url(uri)
            .unwrap_or_else(|| uri.to_string())
    };

    Some(Candidate {
        uri: uri.to_string(),
        title: placeholder_title(&source),
        source,
        preview_url,
        match_reason: None,
        origin: CandidateOrigin::HarvestedUrl,
    })
}

pub(super) fn placeholder_title(source: &str) -> String {
    if source.is_empty() {
        "Reference image".to_string()
    } else {
        format!("Reference from {}", source)
    }
}
