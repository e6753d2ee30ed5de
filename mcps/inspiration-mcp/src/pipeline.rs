//! End-to-end orchestration
//!
//! synthesize -> retrieve -> validate -> rank -> select, checking the
//! cancellation token between and during each async stage.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::gemini::GeminiBackend;
use crate::backends::unsplash::UnsplashBackend;
use crate::config::Config;
use crate::error::Result;
use crate::liveness::LivenessChecker;
use crate::retriever::{CandidateRetriever, Retrieved};
use crate::scoring::{self, ScoringPolicy};
use crate::selector;
use crate::snapshot::SnapshotService;
use crate::synth::QuerySynthesizer;
use crate::types::{PipelineOutcome, RetrievalStage};

pub struct InspirationPipeline {
    synthesizer: QuerySynthesizer,
    retriever: CandidateRetriever,
    checker: LivenessChecker,
    policy: ScoringPolicy,
}

impl InspirationPipeline {
    pub fn new(
        synthesizer: QuerySynthesizer,
        retriever: CandidateRetriever,
        checker: LivenessChecker,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            synthesizer,
            retriever,
            checker,
            policy,
        }
    }

    /// Wire the production collaborators: Gemini for vision, grounded search
    /// and free text; Unsplash for stock photos; proxy then direct probes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gemini = Arc::new(GeminiBackend::new(config.gemini.clone())?);
        if !gemini.is_available() {
            tracing::warn!("GEMINI_API_KEY is not set; searches will fail until it is configured");
        }

        let stock = Arc::new(UnsplashBackend::new(config.stock.clone())?);
        let snapshot = SnapshotService::new(&config.snapshot);

        let retriever = CandidateRetriever::standard(
            stock,
            gemini.clone(),
            gemini.clone(),
            snapshot,
            config.search.candidate_multiplier,
        );

        Ok(Self::new(
            QuerySynthesizer::new(gemini),
            retriever,
            LivenessChecker::from_config(config)?,
            ScoringPolicy::from_config(&config.scoring),
        ))
    }

    pub fn enabled_stages(&self) -> Vec<RetrievalStage> {
        self.retriever.enabled_stages()
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Find up to `count` verified inspiration images for `image`.
    ///
    /// Returns `Ok(PipelineOutcome::Cancelled)` once `cancel` fires, without
    /// surfacing any error. The only error that escapes is a synthesis
    /// failure (or a transport failure of the synthesis call).
    pub async fn run(
        &self,
        image: &[u8],
        mime_type: &str,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        if count == 0 {
            return Ok(PipelineOutcome::Completed(Vec::new()));
        }
        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        let intent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PipelineOutcome::Cancelled),
            intent = self.synthesizer.synthesize(image, mime_type, count) => intent,
        };
        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }
        let intent = intent?;

        let retrieval = match self.retriever.retrieve(&intent, count, cancel).await {
            Retrieved::Found(retrieval) => retrieval,
            Retrieved::Exhausted => {
                tracing::info!(query = %intent.query, "No stage produced candidates");
                return Ok(PipelineOutcome::Completed(Vec::new()));
            }
            Retrieved::Cancelled => return Ok(PipelineOutcome::Cancelled),
        };

        let validated = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PipelineOutcome::Cancelled),
            validated = self.checker.validate_all(retrieval.candidates) => validated,
        };
        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        let checked = validated.len();
        let ranked = scoring::rank(validated, &intent, &self.policy, retrieval.stage);
        let selected = selector::select(ranked, count);

        tracing::info!(
            stage = %retrieval.stage,
            checked,
            selected = selected.len(),
            requested = count,
            "Inspiration search complete"
        );

        Ok(PipelineOutcome::Completed(selected))
    }
}
