//! Per-candidate liveness validation with snapshot fallback

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::heuristics::{has_image_extension, looks_dead};
use super::{DirectProbe, LivenessProbe, ProxyProbe};
use crate::config::Config;
use crate::error::Result;
use crate::snapshot::SnapshotService;
use crate::types::{Candidate, Liveness, ValidationResult};

pub struct LivenessChecker {
    probes: Vec<Arc<dyn LivenessProbe>>,
    timeout: Duration,
    snapshot: SnapshotService,
}

impl LivenessChecker {
    /// `probes` are consulted in order; each attempt is bounded by `timeout`
    pub fn new(
        probes: Vec<Arc<dyn LivenessProbe>>,
        timeout: Duration,
        snapshot: SnapshotService,
    ) -> Self {
        Self {
            probes,
            timeout,
            snapshot,
        }
    }

    /// Proxy probe (when a proxy URL is set), then the direct probe (when enabled)
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.liveness.timeout();
        let mut probes: Vec<Arc<dyn LivenessProbe>> = Vec::new();

        if !config.liveness.proxy_url.is_empty() {
            probes.push(Arc::new(ProxyProbe::new(
                config.liveness.proxy_url.clone(),
                timeout,
            )?));
        }
        if config.liveness.direct_fallback {
            probes.push(Arc::new(DirectProbe::new(timeout)?));
        }

        Ok(Self::new(
            probes,
            timeout,
            SnapshotService::new(&config.snapshot),
        ))
    }

    /// Determine `(alive, content_type)` for a single URL. Never fails.
    pub async fn check_url(&self, url: &str) -> Liveness {
        if looks_dead(url) {
            tracing::debug!(url = %url, "Short-circuited as dead");
            return Liveness::dead();
        }

        for probe in &self.probes {
            match tokio::time::timeout(self.timeout, probe.check_alive(url)).await {
                Ok(Ok(liveness)) => return liveness,
                Ok(Err(e)) => {
                    tracing::debug!(url = %url, probe = probe.name(), error = %e, "Probe gave no answer");
                }
                Err(_) => {
                    tracing::debug!(url = %url, probe = probe.name(), "Probe timed out");
                }
            }
        }

        let alive = has_image_extension(url);
        tracing::debug!(url = %url, alive, "Falling back to extension heuristic");
        Liveness::new(alive, None)
    }

    /// Validate one candidate's preview, substituting a page snapshot when
    /// the preview is dead but the page is alive.
    pub async fn validate(&self, mut candidate: Candidate) -> ValidationResult {
        let mut liveness = self.check_url(&candidate.preview_url).await;

        if !liveness.alive
            && self.snapshot.is_enabled()
            && candidate.uri != candidate.preview_url
            && !self.snapshot.is_snapshot(&candidate.preview_url)
        {
            let page = self.check_url(&candidate.uri).await;
            if page.alive {
                if let Some(snapshot_url) = self.snapshot.snapshot_url(&candidate.uri) {
                    tracing::debug!(
                        uri = %candidate.uri,
                        dead_preview = %candidate.preview_url,
                        "Substituting page snapshot"
                    );
                    candidate.preview_url = snapshot_url;
                    liveness = self.check_url(&candidate.preview_url).await;
                }
            }
        }

        ValidationResult {
            candidate,
            alive: liveness.alive,
            content_type: liveness.content_type,
            score: 0.0,
        }
    }

    /// Validate every candidate concurrently; output order matches input order
    pub async fn validate_all(&self, candidates: Vec<Candidate>) -> Vec<ValidationResult> {
        join_all(candidates.into_iter().map(|c| self.validate(c))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspirationError;
    use crate::types::CandidateOrigin;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Answers from a fixed table; unknown URLs produce an error
    struct TableProbe {
        answers: HashMap<String, Liveness>,
        calls: AtomicUsize,
    }

    impl TableProbe {
        fn new(answers: &[(&str, bool, Option<&str>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(url, alive, ct)| {
                        (url.to_string(), Liveness::new(*alive, ct.map(String::from)))
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LivenessProbe for TableProbe {
        fn name(&self) -> &str {
            "table"
        }

        async fn check_alive(&self, url: &str) -> Result<Liveness> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .get(url)
                .cloned()
                .ok_or_else(|| InspirationError::Validation {
                    url: url.to_string(),
                    message: "unknown".to_string(),
                })
        }
    }

    struct HangingProbe;

    #[async_trait]
    impl LivenessProbe for HangingProbe {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn check_alive(&self, _url: &str) -> Result<Liveness> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Liveness::new(true, Some("image/png".to_string())))
        }
    }

    fn candidate(uri: &str, preview: &str) -> Candidate {
        Candidate {
            uri: uri.to_string(),
            title: "t".to_string(),
            source: "a.com".to_string(),
            preview_url: preview.to_string(),
            match_reason: None,
            origin: CandidateOrigin::Grounded,
        }
    }

    fn checker(probes: Vec<Arc<dyn LivenessProbe>>, snapshot: SnapshotService) -> LivenessChecker {
        LivenessChecker::new(probes, Duration::from_millis(100), snapshot)
    }

    #[tokio::test]
    async fn test_first_usable_probe_wins() {
        let proxy = Arc::new(TableProbe::new(&[(
            "https://a.com/x.jpg",
            true,
            Some("image/jpeg"),
        )]));
        let direct = Arc::new(TableProbe::new(&[("https://a.com/x.jpg", false, None)]));
        let checker = checker(vec![proxy.clone(), direct.clone()], SnapshotService::disabled());

        let liveness = checker.check_url("https://a.com/x.jpg").await;
        assert!(liveness.alive);
        assert_eq!(liveness.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(direct.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_direct_probe() {
        let proxy = Arc::new(TableProbe::new(&[]));
        let direct = Arc::new(TableProbe::new(&[(
            "https://a.com/page",
            true,
            Some("text/html"),
        )]));
        let checker = checker(vec![proxy.clone(), direct], SnapshotService::disabled());

        let liveness = checker.check_url("https://a.com/page").await;
        assert!(liveness.alive);
        assert_eq!(proxy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_heuristic_when_all_probes_fail() {
        let checker = checker(
            vec![Arc::new(TableProbe::new(&[])), Arc::new(HangingProbe)],
            SnapshotService::disabled(),
        );

        assert_eq!(
            checker.check_url("https://a.com/house.png").await,
            Liveness::new(true, None)
        );
        assert_eq!(
            checker.check_url("https://a.com/house").await,
            Liveness::new(false, None)
        );
    }

    #[tokio::test]
    async fn test_dead_marker_skips_network() {
        let probe = Arc::new(TableProbe::new(&[(
            "https://a.com/404/house.jpg",
            true,
            Some("image/jpeg"),
        )]));
        let checker = checker(vec![probe.clone()], SnapshotService::disabled());

        let liveness = checker.check_url("https://a.com/404/house.jpg").await;
        assert!(!liveness.alive);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_snapshot_substitution() {
        let snapshot = SnapshotService::new(&crate::config::SnapshotConfig::default());
        let snap_url = snapshot.snapshot_url("https://a.com/page").unwrap();
        let probe = Arc::new(TableProbe::new(&[
            ("https://cdn.a.com/gone.jpg", false, Some("text/html")),
            ("https://a.com/page", true, Some("text/html")),
            (snap_url.as_str(), true, Some("image/png")),
        ]));
        let checker = checker(vec![probe], snapshot);

        let result = checker
            .validate(candidate("https://a.com/page", "https://cdn.a.com/gone.jpg"))
            .await;
        assert!(result.alive);
        assert_eq!(result.candidate.preview_url, snap_url);
        assert_eq!(result.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_no_snapshot_when_page_dead() {
        let snapshot = SnapshotService::new(&crate::config::SnapshotConfig::default());
        let probe = Arc::new(TableProbe::new(&[
            ("https://cdn.a.com/gone.jpg", false, None),
            ("https://a.com/page", false, None),
        ]));
        let checker = checker(vec![probe], snapshot);

        let result = checker
            .validate(candidate("https://a.com/page", "https://cdn.a.com/gone.jpg"))
            .await;
        assert!(!result.alive);
        assert_eq!(result.candidate.preview_url, "https://cdn.a.com/gone.jpg");
    }

    #[tokio::test]
    async fn test_validate_all_is_concurrent_and_ordered() {
        let checker = checker(vec![Arc::new(HangingProbe)], SnapshotService::disabled());
        let candidates: Vec<Candidate> = (0..8)
            .map(|i| {
                let url = format!("https://a.com/{}.jpg", i);
                candidate(&url, &url)
            })
            .collect();

        let started = Instant::now();
        let results = checker.validate_all(candidates).await;

        // Eight sequential timeouts would take at least 800ms
        assert!(started.elapsed() < Duration::from_millis(700));
        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.candidate.uri, format!("https://a.com/{}.jpg", i));
            assert!(result.alive);
            assert_eq!(result.score, 0.0);
        }
    }
}
