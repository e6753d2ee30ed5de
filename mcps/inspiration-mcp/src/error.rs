//! Error taxonomy for the inspiration pipeline
//!
//! Only [`InspirationError::Synthesis`] and genuine transport failures of the
//! synthesis call reach the caller. Everything else is logged and recovered
//! inside the stage that produced it.

use inspire_common::{internal_error, invalid_params, IntoMcpError, McpError};

#[derive(Debug, thiserror::Error)]
pub enum InspirationError {
    /// The image-to-query call failed or produced nothing usable
    #[error("query synthesis failed: {0}")]
    Synthesis(String),

    /// A retrieval stage errored or returned nothing
    #[error("source unavailable ({stage}): {message}")]
    SourceUnavailable { stage: String, message: String },

    /// A liveness check errored or timed out
    #[error("validation failed for {url}: {message}")]
    Validation { url: String, message: String },

    /// An upstream response could not be parsed
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An upstream API answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input was unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InspirationError>;

impl IntoMcpError for InspirationError {
    fn into_mcp_error(self) -> McpError {
        match self {
            InspirationError::Config(msg) | InspirationError::InvalidInput(msg) => {
                invalid_params(msg)
            }
            other => internal_error(other.to_string()),
        }
    }
}
