//! Inspiration MCP Library
//!
//! Turns a reference image into a short list of visually similar,
//! verified-reachable inspiration images:
//!
//! ```text
//! QuerySynthesizer -> CandidateRetriever -> LivenessChecker -> scoring -> selector
//! ```
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use inspiration_mcp::{config::Config, InspirationPipeline, PipelineOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = InspirationPipeline::from_config(&Config::load()?)?;
//! let outcome = pipeline
//!     .run(&image_bytes, "image/jpeg", 3, &CancellationToken::new())
//!     .await?;
//! ```
//!
//! # Configuration
//! Set `GEMINI_API_KEY` (and optionally `UNSPLASH_ACCESS_KEY`, `VERIFY_PROXY_URL`)
//! or configure in `~/.inspire/inspiration.toml`

pub mod backends;
pub mod config;
pub mod error;
pub mod extract;
pub mod liveness;
pub mod pipeline;
pub mod retriever;
pub mod scoring;
pub mod selector;
pub mod server;
pub mod snapshot;
pub mod synth;
pub mod types;

pub use error::{InspirationError, Result};
pub use pipeline::InspirationPipeline;
pub use server::{FindInspirationParams, InspirationMcpServer};
pub use types::{Candidate, Inspiration, PipelineOutcome, SearchIntent, ValidationResult};
