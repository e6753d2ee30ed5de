//! HEAD request from this process

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use super::LivenessProbe;
use crate::error::Result;
use crate::types::Liveness;

pub struct DirectProbe {
    client: Client,
}

impl DirectProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inspiration-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for DirectProbe {
    fn name(&self) -> &str {
        "direct"
    }

    async fn check_alive(&self, url: &str) -> Result<Liveness> {
        let response = self.client.head(url).send().await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(Liveness::new(response.status().is_success(), content_type))
    }
}
