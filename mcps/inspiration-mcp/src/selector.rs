//! Final selection: dedupe by URI, truncate, strip scoring fields

use std::collections::HashSet;

use crate::types::{Inspiration, ValidationResult};

/// Take the first `count` distinct URIs from an already ranked list.
///
/// Never pads: fewer survivors means a shorter result.
pub fn select(ranked: Vec<ValidationResult>, count: usize) -> Vec<Inspiration> {
    let mut seen = HashSet::new();

    ranked
        .into_iter()
        .filter(|result| seen.insert(result.candidate.uri.clone()))
        .take(count)
        .map(|result| Inspiration::from(result.candidate))
        .collect()
}
