//! Scoring and ranking of validated candidates
//!
//! Scores are additive and only meaningful within one invocation:
//!
//! | Signal | Points |
//! |---|---|
//! | tag found in title/uri/preview/reason | 2.0 per tag |
//! | word of a multi-word tag found | 0.5 (0.6 on the free-text path) per word |
//! | preview path has an image extension | 1.2 |
//! | validated content type is `image/*` | 1.5 |
//! | host on the preferred list | 1.5 |
//! | alive | 2.0 |

use crate::config::ScoringConfig;
use crate::extract::host_of;
use crate::liveness::heuristics::{
    has_image_extension, is_confirmed_non_image, is_document_content_type, is_image_content_type,
};
use crate::types::{RetrievalStage, SearchIntent, ValidationResult};

pub const TAG_POINTS: f64 = 2.0;
pub const IMAGE_EXTENSION_POINTS: f64 = 1.2;
pub const IMAGE_CONTENT_TYPE_POINTS: f64 = 1.5;
pub const PREFERRED_HOST_POINTS: f64 = 1.5;
pub const ALIVE_POINTS: f64 = 2.0;

/// Minimum score that keeps a candidate without any other qualification
pub const KEEP_THRESHOLD: f64 = 2.0;

/// Tag words shorter than this are too generic to count on their own
const MIN_WORD_LEN: usize = 3;

/// Immutable list of trusted hosts
#[derive(Debug, Clone, Default)]
pub struct ScoringPolicy {
    preferred_hosts: Vec<String>,
}

impl ScoringPolicy {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferred_hosts: hosts
                .into_iter()
                .map(|h| h.into().trim().trim_start_matches("www.").to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.preferred_hosts.iter().cloned())
    }

    pub fn preferred_hosts(&self) -> &[String] {
        &self.preferred_hosts
    }

    /// Exact host or any subdomain of a preferred host
    pub fn is_preferred(&self, host: &str) -> bool {
        let host = host.trim().trim_start_matches("www.").to_ascii_lowercase();
        !host.is_empty()
            && self.preferred_hosts.iter().any(|preferred| {
                host == *preferred
                    || host
                        .strip_suffix(preferred.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
    }
}

/// Points per independently found word of a multi-word tag
pub fn partial_word_points(stage: RetrievalStage) -> f64 {
    match stage {
        RetrievalStage::FreeText => 0.6,
        RetrievalStage::StockPhoto | RetrievalStage::Grounded => 0.5,
    }
}

/// Tag-overlap points for a lowercase haystack
pub fn tag_points(haystack: &str, tags: &[String], word_points: f64) -> f64 {
    let mut points = 0.0;

    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }

        if haystack.contains(&tag) {
            points += TAG_POINTS;
        }

        let words: Vec<&str> = tag
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_WORD_LEN)
            .collect();
        if words.len() > 1 {
            points += words.iter().filter(|w| haystack.contains(*w)).count() as f64 * word_points;
        }
    }

    points
}

fn candidate_host(result: &ValidationResult) -> String {
    let source = result.candidate.source.trim();
    if source.is_empty() {
        host_of(&result.candidate.uri).unwrap_or_default()
    } else {
        source.to_string()
    }
}

/// Score a single validated candidate
pub fn score(
    result: &ValidationResult,
    tags: &[String],
    policy: &ScoringPolicy,
    word_points: f64,
) -> f64 {
    let candidate = &result.candidate;
    let haystack = [
        candidate.title.as_str(),
        candidate.uri.as_str(),
        candidate.preview_url.as_str(),
        candidate.match_reason.as_deref().unwrap_or_default(),
    ]
    .join(" ")
    .to_lowercase();

    let mut points = tag_points(&haystack, tags, word_points);

    if has_image_extension(&candidate.preview_url) {
        points += IMAGE_EXTENSION_POINTS;
    }
    if is_image_content_type(result.content_type.as_deref()) {
        points += IMAGE_CONTENT_TYPE_POINTS;
    }
    if policy.is_preferred(&candidate_host(result)) {
        points += PREFERRED_HOST_POINTS;
    }
    if result.alive {
        points += ALIVE_POINTS;
    }

    points
}

fn keep(result: &ValidationResult, policy: &ScoringPolicy) -> bool {
    let content_type = result.content_type.as_deref();
    if is_confirmed_non_image(content_type) {
        return false;
    }

    (result.alive && is_image_content_type(content_type))
        || result.score >= KEEP_THRESHOLD
        || (result.alive && policy.is_preferred(&candidate_host(result)))
}

/// Score, filter and order candidates, best first. Equal scores keep
/// retrieval order.
pub fn rank(
    results: Vec<ValidationResult>,
    intent: &SearchIntent,
    policy: &ScoringPolicy,
    stage: RetrievalStage,
) -> Vec<ValidationResult> {
    let word_points = partial_word_points(stage);

    let mut ranked: Vec<ValidationResult> = results
        .into_iter()
        .map(|mut result| {
            if is_document_content_type(result.content_type.as_deref()) {
                result.alive = false;
            }
            result.score = score(&result, &intent.tags, policy, word_points);
            result
        })
        .filter(|result| {
            let kept = keep(result, policy);
            if !kept {
                tracing::debug!(
                    uri = %result.candidate.uri,
                    score = result.score,
                    alive = result.alive,
                    content_type = ?result.content_type,
                    "Dropped candidate"
                );
            }
            kept
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, CandidateOrigin};

    fn result(uri: &str, preview: &str, alive: bool, content_type: Option<&str>) -> ValidationResult {
        ValidationResult {
            candidate: Candidate {
                uri: uri.to_string(),
                title: String::new(),
                source: host_of(uri).unwrap_or_default(),
                preview_url: preview.to_string(),
                match_reason: None,
                origin: CandidateOrigin::Grounded,
            },
            alive,
            content_type: content_type.map(String::from),
            score: 0.0,
        }
    }

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn intent(tag_list: &[&str]) -> SearchIntent {
        SearchIntent {
            query: "q".to_string(),
            modifiers: vec![],
            tags: tags(tag_list),
        }
    }

    #[test]
    fn test_preferred_hosts() {
        let policy = ScoringPolicy::new(["www.ArchDaily.com", "unsplash.com", " "]);
        assert_eq!(policy.preferred_hosts(), &["archdaily.com", "unsplash.com"]);
        assert!(policy.is_preferred("archdaily.com"));
        assert!(policy.is_preferred("images.unsplash.com"));
        assert!(policy.is_preferred("www.archdaily.com"));
        assert!(!policy.is_preferred("notunsplash.com"));
        assert!(!policy.is_preferred(""));
    }

    #[test]
    fn test_tag_points() {
        let haystack = "timber pavilion https://a.com/rammed-earth-wall.jpg";
        assert_eq!(tag_points(haystack, &tags(&["timber"]), 0.5), 2.0);
        assert_eq!(tag_points(haystack, &tags(&["TIMBER PAVILION"]), 0.5), 2.0 + 2.0 * 0.5);
        // Phrase missing, words found independently
        assert_eq!(tag_points(haystack, &tags(&["rammed earth"]), 0.6), 2.0 * 0.6);
        // Short words never count alone
        assert_eq!(tag_points(haystack, &tags(&["of at"]), 0.5), 0.0);
        assert_eq!(tag_points(haystack, &tags(&["", "glass"]), 0.5), 0.0);
    }

    #[test]
    fn test_score_components() {
        let policy = ScoringPolicy::new(["unsplash.com"]);
        let r = result(
            "https://images.unsplash.com/brick.jpg",
            "https://images.unsplash.com/brick.jpg",
            true,
            Some("image/jpeg"),
        );
        let expected = TAG_POINTS
            + IMAGE_EXTENSION_POINTS
            + IMAGE_CONTENT_TYPE_POINTS
            + PREFERRED_HOST_POINTS
            + ALIVE_POINTS;
        assert!((score(&r, &tags(&["brick"]), &policy, 0.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_monotonic_in_matched_tags() {
        let policy = ScoringPolicy::default();
        let r = result(
            "https://a.com/brick-concrete-timber",
            "https://a.com/p",
            true,
            None,
        );
        let all = ["brick", "concrete", "timber", "glass"];

        let mut previous = f64::MIN;
        for n in 0..=all.len() {
            let current = score(&r, &tags(&all[..n]), &policy, 0.5);
            assert!(current >= previous, "score dropped when adding tag {}", n);
            previous = current;
        }
    }

    #[test]
    fn test_rank_excludes_documents_and_dead_links() {
        let ranked = rank(
            vec![
                result("https://a.com/dead", "https://a.com/dead", false, Some("text/html")),
                result("https://a.com/brochure.pdf", "https://a.com/brochure.pdf", true, Some("application/pdf")),
                result("https://a.com/1.jpg", "https://a.com/1.jpg", true, Some("image/jpeg")),
            ],
            &intent(&["brochure"]),
            &ScoringPolicy::default(),
            RetrievalStage::Grounded,
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.uri, "https://a.com/1.jpg");
    }

    #[test]
    fn test_rank_keep_rules() {
        let policy = ScoringPolicy::new(["dezeen.com"]);
        let ranked = rank(
            vec![
                // alive on a preferred host, no other signal
                result("https://www.dezeen.com/p", "https://www.dezeen.com/p", true, None),
                // dead, unknown host, no tags: score 0
                result("https://x.com/p", "https://x.com/p", false, None),
                // dead, but two tags match
                result("https://y.com/stone-chapel", "https://y.com/p", false, None),
            ],
            &intent(&["stone", "chapel"]),
            &policy,
            RetrievalStage::Grounded,
        );

        let uris: Vec<&str> = ranked.iter().map(|r| r.candidate.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://y.com/stone-chapel", "https://www.dezeen.com/p"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(
            (0..5)
                .map(|i| {
                    let url = format!("https://a.com/{}.png", i);
                    result(&url, &url, true, Some("image/png"))
                })
                .collect(),
            &intent(&[]),
            &ScoringPolicy::default(),
            RetrievalStage::FreeText,
        );

        let uris: Vec<String> = ranked.into_iter().map(|r| r.candidate.uri).collect();
        let expected: Vec<String> = (0..5).map(|i| format!("https://a.com/{}.png", i)).collect();
        assert_eq!(uris, expected);
    }
}
