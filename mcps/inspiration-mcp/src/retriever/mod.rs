//! Candidate retrieval
//!
//! An ordered chain of [`RetrievalStrategy`]s. Each stage is tried in turn and
//! the first one that yields at least one usable candidate wins; a stage that
//! errors or comes back empty is logged and skipped.
//!
//! Every upstream shape is kept as a [`RawCandidate`] variant until
//! normalization, so provider-specific parsing stays in the stage that owns it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::{Citation, GroundedSearch, StockPhoto, StockPhotoSearch, TextModel};
use crate::error::{InspirationError, Result};
use crate::snapshot::SnapshotService;
use crate::types::{Candidate, RetrievalStage, SearchIntent};

pub mod fallback;
pub mod grounded;
pub mod harvest;
pub mod stock;

pub use fallback::{FallbackEntry, FreeTextStrategy};
pub use grounded::GroundedStrategy;
pub use stock::StockPhotoStrategy;

/// Upstream record before normalization into a [`Candidate`]
#[derive(Debug, Clone, PartialEq)]
pub enum RawCandidate {
    StockPhoto(StockPhoto),
    Grounded(Citation),
    FallbackJson(FallbackEntry),
    HarvestedUrl(String),
}

impl RawCandidate {
    /// The URL that will become the candidate's `uri`, if any
    pub fn uri(&self) -> Option<&str> {
        let uri = match self {
            RawCandidate::StockPhoto(photo) => photo.image_url.as_deref(),
            RawCandidate::Grounded(citation) => Some(citation.uri.as_str()),
            RawCandidate::FallbackJson(entry) => entry.uri(),
            RawCandidate::HarvestedUrl(url) => Some(url.as_str()),
        };
        uri.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Every URL this record carries: page, image and preview
    pub fn urls(&self) -> Vec<&str> {
        let urls = match self {
            RawCandidate::StockPhoto(photo) => {
                vec![photo.image_url.as_deref(), photo.preview_url.as_deref()]
            }
            RawCandidate::Grounded(citation) => {
                vec![Some(citation.uri.as_str()), citation.image_url.as_deref()]
            }
            RawCandidate::FallbackJson(entry) => {
                vec![entry.url.as_deref(), entry.image_url.as_deref()]
            }
            RawCandidate::HarvestedUrl(url) => vec![Some(url.as_str())],
        };
        urls.into_iter()
            .flatten()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .collect()
    }

    /// Normalize into a [`Candidate`]; records without a URI are dropped
    pub fn into_candidate(self, snapshot: &SnapshotService) -> Option<Candidate> {
        match self {
            RawCandidate::StockPhoto(photo) => stock::normalize(photo),
            RawCandidate::Grounded(citation) => grounded::normalize(citation, snapshot),
            RawCandidate::FallbackJson(entry) => fallback::normalize(entry, snapshot),
            RawCandidate::HarvestedUrl(url) => harvest::normalize(&url, snapshot),
        }
    }
}

/// One retrieval stage
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn stage(&self) -> RetrievalStage;

    /// Disabled stages are skipped without being called
    fn is_enabled(&self) -> bool {
        true
    }

    /// Fetch up to `limit` raw candidates for `intent`; `count` is the number
    /// of results the caller finally wants.
    async fn retrieve(
        &self,
        intent: &SearchIntent,
        count: usize,
        limit: usize,
    ) -> Result<Vec<RawCandidate>>;
}

/// Candidates produced by the winning stage
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub stage: RetrievalStage,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieved {
    Found(Retrieval),
    /// Every stage was empty or failed
    Exhausted,
    Cancelled,
}

pub struct CandidateRetriever {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    snapshot: SnapshotService,
    candidate_multiplier: usize,
}

impl CandidateRetriever {
    pub fn new(
        strategies: Vec<Box<dyn RetrievalStrategy>>,
        snapshot: SnapshotService,
        candidate_multiplier: usize,
    ) -> Self {
        Self {
            strategies,
            snapshot,
            candidate_multiplier: candidate_multiplier.max(1),
        }
    }

    /// Stock photos, then grounded search, then the free-text JSON fallback
    pub fn standard(
        stock: Arc<dyn StockPhotoSearch>,
        grounded: Arc<dyn GroundedSearch>,
        text: Arc<dyn TextModel>,
        snapshot: SnapshotService,
        candidate_multiplier: usize,
    ) -> Self {
        let strategies: Vec<Box<dyn RetrievalStrategy>> = vec![
            Box::new(StockPhotoStrategy::new(stock)),
            Box::new(GroundedStrategy::new(grounded)),
            Box::new(FreeTextStrategy::new(text)),
        ];
        Self::new(strategies, snapshot, candidate_multiplier)
    }

    /// Enabled stages, in the order they are tried
    pub fn enabled_stages(&self) -> Vec<RetrievalStage> {
        self.strategies
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.stage())
            .collect()
    }

    pub async fn retrieve(
        &self,
        intent: &SearchIntent,
        count: usize,
        cancel: &CancellationToken,
    ) -> Retrieved {
        let limit = count.saturating_mul(self.candidate_multiplier).max(count);

        for strategy in &self.strategies {
            let stage = strategy.stage();
            if !strategy.is_enabled() {
                tracing::debug!(stage = %stage, "Stage not configured, skipping");
                continue;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Retrieved::Cancelled,
                outcome = strategy.retrieve(intent, count, limit) => outcome,
            };
            if cancel.is_cancelled() {
                return Retrieved::Cancelled;
            }

            match outcome {
                Ok(raw) => {
                    let candidates = self.normalize(raw, limit);
                    if !candidates.is_empty() {
                        tracing::info!(stage = %stage, candidates = candidates.len(), "Retrieved candidates");
                        return Retrieved::Found(Retrieval { stage, candidates });
                    }
                    tracing::debug!(stage = %stage, "Stage yielded no candidates");
                }
                Err(e) => {
                    let err = InspirationError::SourceUnavailable {
                        stage: stage.to_string(),
                        message: e.to_string(),
                    };
                    tracing::warn!(error = %err, "Retrieval stage failed, trying next");
                }
            }
        }

        Retrieved::Exhausted
    }

    fn normalize(&self, raw: Vec<RawCandidate>, limit: usize) -> Vec<Candidate> {
        raw.into_iter()
            .filter_map(|r| r.into_candidate(&self.snapshot))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStrategy {
        stage: RetrievalStage,
        enabled: bool,
        output: std::result::Result<Vec<String>, String>,
        calls: Arc<AtomicUsize>,
    }

    impl FixedStrategy {
        fn boxed(
            stage: RetrievalStage,
            output: std::result::Result<Vec<&str>, &str>,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn RetrievalStrategy> {
            Box::new(Self {
                stage,
                enabled: true,
                output: output
                    .map(|urls| urls.into_iter().map(String::from).collect())
                    .map_err(String::from),
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl RetrievalStrategy for FixedStrategy {
        fn stage(&self) -> RetrievalStage {
            self.stage
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn retrieve(
            &self,
            _intent: &SearchIntent,
            _count: usize,
            _limit: usize,
        ) -> Result<Vec<RawCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.output {
                Ok(urls) => Ok(urls.iter().cloned().map(RawCandidate::HarvestedUrl).collect()),
                Err(msg) => Err(InspirationError::MalformedResponse(msg.clone())),
            }
        }
    }

    fn intent() -> SearchIntent {
        SearchIntent {
            query: "stone chapel".to_string(),
            modifiers: vec![],
            tags: vec!["stone".to_string()],
        }
    }

    #[tokio::test]
    async fn test_first_non_empty_stage_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let later = Arc::new(AtomicUsize::new(0));
        let retriever = CandidateRetriever::new(
            vec![
                FixedStrategy::boxed(RetrievalStage::StockPhoto, Err("boom"), &calls),
                FixedStrategy::boxed(RetrievalStage::Grounded, Ok(vec![]), &calls),
                FixedStrategy::boxed(
                    RetrievalStage::FreeText,
                    Ok(vec!["https://a.com/1.jpg", "   "]),
                    &calls,
                ),
                FixedStrategy::boxed(RetrievalStage::FreeText, Ok(vec!["https://b.com"]), &later),
            ],
            SnapshotService::disabled(),
            3,
        );

        let Retrieved::Found(retrieval) =
            retriever.retrieve(&intent(), 2, &CancellationToken::new()).await
        else {
            panic!("expected candidates");
        };

        assert_eq!(retrieval.stage, RetrievalStage::FreeText);
        assert_eq!(retrieval.candidates.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_stage_not_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = FixedStrategy {
            stage: RetrievalStage::StockPhoto,
            enabled: false,
            output: Ok(vec!["https://a.com/1.jpg".to_string()]),
            calls: calls.clone(),
        };
        let retriever =
            CandidateRetriever::new(vec![Box::new(strategy)], SnapshotService::disabled(), 3);

        assert!(retriever.enabled_stages().is_empty());
        assert_eq!(
            retriever.retrieve(&intent(), 3, &CancellationToken::new()).await,
            Retrieved::Exhausted
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_candidates_capped_at_limit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let urls: Vec<String> = (0..20).map(|i| format!("https://a.com/{}.jpg", i)).collect();
        let retriever = CandidateRetriever::new(
            vec![FixedStrategy::boxed(
                RetrievalStage::Grounded,
                Ok(urls.iter().map(String::as_str).collect()),
                &calls,
            )],
            SnapshotService::disabled(),
            3,
        );

        let Retrieved::Found(retrieval) =
            retriever.retrieve(&intent(), 2, &CancellationToken::new()).await
        else {
            panic!("expected candidates");
        };
        assert_eq!(retrieval.candidates.len(), 6);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_stage() {
        let calls = Arc::new(AtomicUsize::new(0));
        let retriever = CandidateRetriever::new(
            vec![FixedStrategy::boxed(
                RetrievalStage::Grounded,
                Ok(vec!["https://a.com/1.jpg"]),
                &calls,
            )],
            SnapshotService::disabled(),
            3,
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            retriever.retrieve(&intent(), 3, &cancel).await,
            Retrieved::Cancelled
        );
    }
}
