//! Best-effort OCR via the Vision `images:annotate` endpoint.
//!
//! OCR only sharpens the generation prompt (exact brand/label spelling); the
//! scan pipeline must keep working without it, so every failure here degrades
//! to `None` with a warning instead of an error.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";
const OCR_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    full_text_annotation: Option<FullTextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    text: Option<String>,
}

/// Client for the Vision text-detection endpoint.
pub struct VisionOcrClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl VisionOcrClient {
    /// Creates a client pointed at the production endpoint. Returns `None`
    /// when the HTTP client cannot be built — OCR is optional, so
    /// construction failures disable the pass rather than failing startup.
    #[must_use]
    pub fn new(api_key: &str) -> Option<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(api_key: &str, base_url: &str) -> Option<Self> {
        let client = reqwest::Client::builder()
            .timeout(OCR_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .user_agent("snapstock/0.1 (product-scan)")
            .build();
        match client {
            Ok(client) => Some(Self {
                client,
                api_key: api_key.to_owned(),
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "OCR client construction failed; OCR disabled");
                None
            }
        }
    }

    /// Runs text detection on a base64 image payload. Best-effort: any
    /// transport, status, or parse failure returns `None`.
    pub async fn detect_text(&self, image_b64: &str) -> Option<String> {
        let url = format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key);
        let body = json!({
            "requests": [{
                "image": { "content": image_b64 },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "OCR request failed; continuing without OCR text");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "OCR returned non-success status; continuing without OCR text"
            );
            return None;
        }

        let parsed: AnnotateResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "OCR response parse failed; continuing without OCR text");
                return None;
            }
        };

        parsed
            .responses
            .into_iter()
            .next()
            .and_then(|r| r.full_text_annotation)
            .and_then(|a| a.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
