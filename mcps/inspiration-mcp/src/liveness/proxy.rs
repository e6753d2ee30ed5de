//! Verification proxy client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::LivenessProbe;
use crate::error::{InspirationError, Result};
use crate::types::Liveness;

/// Asks the verification proxy (`GET <endpoint>?url=...`) to HEAD the target
pub struct ProxyProbe {
    client: Client,
    endpoint: String,
}

/// Wire format of the proxy's `/verify` answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyVerdict {
    alive: bool,
    status: Option<u16>,
    content_type: Option<String>,
}

impl ProxyProbe {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl ProxyVerdict {
    /// A verdict without a status means the proxy itself could not reach
    /// the target, which says nothing about the target.
    fn into_liveness(self, url: &str) -> Result<Liveness> {
        match self.status {
            Some(_) => Ok(Liveness::new(self.alive, self.content_type)),
            None => Err(InspirationError::Validation {
                url: url.to_string(),
                message: "proxy could not reach target".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LivenessProbe for ProxyProbe {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn check_alive(&self, url: &str) -> Result<Liveness> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InspirationError::Validation {
                url: url.to_string(),
                message: format!("proxy answered {}", response.status()),
            });
        }

        let verdict: ProxyVerdict = response
            .json()
            .await
            .map_err(|e| InspirationError::MalformedResponse(e.to_string()))?;

        verdict.into_liveness(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_with_status_is_usable() {
        let verdict: ProxyVerdict = serde_json::from_str(
            r#"{"alive": false, "status": 404, "contentType": "text/html"}"#,
        )
        .unwrap();
        let liveness = verdict.into_liveness("https://a.com/x.jpg").unwrap();
        assert!(!liveness.alive);
        assert_eq!(liveness.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_verdict_without_status_is_not_usable() {
        let verdict: ProxyVerdict =
            serde_json::from_str(r#"{"alive": false, "status": null, "contentType": null}"#)
                .unwrap();
        let err = verdict.into_liveness("https://a.com/x.jpg").unwrap_err();
        assert!(matches!(err, InspirationError::Validation { .. }));
    }
}
