//! `/verify` handler

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::ProxyState;

/// Query parameters for `/verify`
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub url: Option<String>,
}

/// Result of a HEAD check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub alive: bool,
    pub status: Option<u16>,
    pub content_type: Option<String>,
}

impl VerifyResponse {
    /// The upstream request never produced a response
    pub fn unreachable() -> Self {
        Self {
            alive: false,
            status: None,
            content_type: None,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Only absolute http(s) targets are proxied.
pub fn validate_target(url: Option<&str>) -> Result<&str, &'static str> {
    let url = url.map(str::trim).filter(|u| !u.is_empty()).ok_or("missing url")?;

    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(url)
    } else {
        Err("url must start with http:// or https://")
    }
}

/// Perform one HEAD request against `url`. Transport failures are reported
/// as `alive: false` with no status rather than as an error.
pub async fn head_check(client: &reqwest::Client, url: &str) -> VerifyResponse {
    match client.head(url).send().await {
        Ok(response) => {
            let status = response.status();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            VerifyResponse {
                alive: status.is_success(),
                status: Some(status.as_u16()),
                content_type,
            }
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "HEAD request failed");
            VerifyResponse::unreachable()
        }
    }
}

/// `GET /verify?url=...`
pub async fn verify(
    State(state): State<ProxyState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<ErrorResponse>)> {
    let target = validate_target(params.url.as_deref())
        .map_err(|msg| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))))?;

    let result = head_check(&state.client, target).await;
    tracing::info!(
        url = %target,
        alive = result.alive,
        status = ?result.status,
        "Verified target"
    );

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target_accepts_http_and_https() {
        assert_eq!(
            validate_target(Some("https://example.com/a.jpg")),
            Ok("https://example.com/a.jpg")
        );
        assert!(validate_target(Some("HTTP://example.com")).is_ok());
    }

    #[test]
    fn test_validate_target_rejects_missing_and_other_schemes() {
        assert_eq!(validate_target(None), Err("missing url"));
        assert_eq!(validate_target(Some("   ")), Err("missing url"));
        assert!(validate_target(Some("ftp://example.com/a.jpg")).is_err());
        assert!(validate_target(Some("example.com/a.jpg")).is_err());
        assert!(validate_target(Some("javascript:alert(1)")).is_err());
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = VerifyResponse {
            alive: true,
            status: Some(200),
            content_type: Some("image/png".to_string()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["contentType"], "image/png");
        assert_eq!(json["status"], 200);

        let json = serde_json::to_value(VerifyResponse::unreachable()).unwrap();
        assert!(json["status"].is_null());
        assert!(json["contentType"].is_null());
    }
}
