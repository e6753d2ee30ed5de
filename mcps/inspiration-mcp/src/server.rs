//! MCP Server implementation for inspiration search
//!
//! Exposes the pipeline as a `find_inspiration` tool. Cancelling the MCP
//! request cancels the pipeline run.

use inspire_common::{json_success, text_success, IntoMcpError};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::InspirationError;
use crate::pipeline::InspirationPipeline;
use crate::types::PipelineOutcome;

pub const NO_RESULTS_MESSAGE: &str =
    "No inspiration found for this image. Try again, or try a different reference image.";
pub const CANCELLED_MESSAGE: &str = "Inspiration search cancelled.";

/// The main Inspiration MCP Server
#[derive(Clone)]
pub struct InspirationMcpServer {
    pipeline: Arc<InspirationPipeline>,
    config: Config,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FindInspirationParams {
    /// Path to the reference image
    #[schemars(description = "Path to the reference image on the local filesystem")]
    pub image_path: String,
    /// Explicit MIME type
    #[schemars(description = "MIME type of the image, e.g. image/jpeg (default: guessed from the file extension)")]
    pub mime_type: Option<String>,
    /// How many results to return
    #[schemars(description = "Number of inspiration images to return (default: 3)")]
    pub count: Option<usize>,
}

/// Read an image from disk and settle its MIME type
pub async fn load_image(
    path: &str,
    mime_type: Option<&str>,
) -> crate::error::Result<(Vec<u8>, String)> {
    let mime = resolve_mime(Path::new(path), mime_type)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| InspirationError::InvalidInput(format!("cannot read {}: {}", path, e)))?;
    if bytes.is_empty() {
        return Err(InspirationError::InvalidInput(format!("{} is empty", path)));
    }

    Ok((bytes, mime))
}

/// Explicit MIME type if given, otherwise guessed from the extension.
/// Anything that is not `image/*` is rejected.
pub fn resolve_mime(path: &Path, explicit: Option<&str>) -> crate::error::Result<String> {
    let mime = match explicit.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_ascii_lowercase(),
        None => mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .ok_or_else(|| {
                InspirationError::InvalidInput(format!(
                    "cannot determine the image type of {}; pass mime_type",
                    path.display()
                ))
            })?,
    };

    if !mime.starts_with("image/") {
        return Err(InspirationError::InvalidInput(format!(
            "{} is not an image type",
            mime
        )));
    }
    Ok(mime)
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl InspirationMcpServer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pipeline = InspirationPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, Arc::new(pipeline)))
    }

    pub fn with_pipeline(config: Config, pipeline: Arc<InspirationPipeline>) -> Self {
        let stages: Vec<String> = pipeline
            .enabled_stages()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!(stages = ?stages, "Retrieval stages enabled");

        Self {
            pipeline,
            config,
            tool_router: Self::tool_router(),
        }
    }

    /// Run one search; shared by the MCP tool and tests
    pub async fn find(
        &self,
        params: FindInspirationParams,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, McpError> {
        let count = self.config.resolve_count(params.count);
        let (image, mime) = load_image(&params.image_path, params.mime_type.as_deref())
            .await
            .map_err(IntoMcpError::into_mcp_error)?;

        tracing::info!(
            "Finding inspiration for {} ({}, count: {})",
            params.image_path,
            mime,
            count
        );

        let outcome = self
            .pipeline
            .run(&image, &mime, count, cancel)
            .await
            .map_err(IntoMcpError::into_mcp_error)?;

        match outcome {
            PipelineOutcome::Completed(results) if results.is_empty() => {
                Ok(text_success(NO_RESULTS_MESSAGE))
            }
            PipelineOutcome::Completed(results) => json_success(&results),
            PipelineOutcome::Cancelled => Ok(text_success(CANCELLED_MESSAGE)),
        }
    }

    // ========================================================================
    // Tools
    // ========================================================================

    #[tool(
        description = "Find real-world architectural inspiration photos similar to a reference image. Returns verified, reachable image links with titles, sources and preview URLs."
    )]
    async fn find_inspiration(
        &self,
        Parameters(params): Parameters<FindInspirationParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.find(params, &context.ct).await
    }

    #[tool(description = "Get the current inspiration search configuration and which sources are enabled.")]
    async fn get_config(&self) -> Result<CallToolResult, McpError> {
        #[derive(Serialize)]
        struct ConfigStatus {
            model: String,
            vision_available: bool,
            stages: Vec<String>,
            verify_proxy: Option<String>,
            direct_fallback: bool,
            snapshots_enabled: bool,
            default_count: usize,
            max_count: usize,
            preferred_hosts: Vec<String>,
        }

        let status = ConfigStatus {
            model: self.config.gemini.model.clone(),
            vision_available: !self.config.gemini.api_key.is_empty(),
            stages: self
                .pipeline
                .enabled_stages()
                .iter()
                .map(ToString::to_string)
                .collect(),
            verify_proxy: Some(self.config.liveness.proxy_url.clone()).filter(|u| !u.is_empty()),
            direct_fallback: self.config.liveness.direct_fallback,
            snapshots_enabled: self.config.snapshot.enabled,
            default_count: self.config.search.default_count,
            max_count: self.config.search.max_count,
            preferred_hosts: self.pipeline.policy().preferred_hosts().to_vec(),
        };

        json_success(&status)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for InspirationMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Inspiration MCP Server - finds real-world architectural reference photos \
                 similar to a given image. Every returned link has been checked for \
                 reachability; results may be fewer than requested."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
