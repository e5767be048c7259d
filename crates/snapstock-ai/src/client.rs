//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! Wraps `reqwest` with typed error classification and a caller-imposed hard
//! deadline: every request races `tokio::time::timeout` so a hung provider
//! call cannot outlive the scan flow's budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for both image analysis and variant text parsing.
pub const MODEL: &str = "gemini-2.0-flash";

/// One piece of a generation request: prompt text or an inline image.
#[derive(Debug, Clone)]
pub enum GenPart {
    Text(String),
    InlineImage { mime_type: String, data_b64: String },
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    Text(String),
    #[serde(rename_all = "camelCase")]
    InlineData {
        mime_type: String,
        data: String,
    },
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for the generative-model REST API.
///
/// Use [`GenerativeClient::new`] for production or
/// [`GenerativeClient::with_base_url`] to point at a mock server in tests.
pub struct GenerativeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GenerativeClient {
    /// Creates a client pointed at the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str) -> Result<Self, AiError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("snapstock/0.1 (product-scan)")
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Sends a generation request and returns the concatenated text of the
    /// first candidate, bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// - [`AiError::Timeout`] when `deadline` elapses first.
    /// - [`AiError::Auth`] on 401/403 or an API-key complaint in the body.
    /// - [`AiError::Provider`] on any other non-2xx status.
    /// - [`AiError::Empty`] when the reply carries no text.
    /// - [`AiError::Http`] / [`AiError::Deserialize`] on transport/body
    ///   failures.
    pub async fn generate(&self, parts: Vec<GenPart>, deadline: Duration) -> Result<String, AiError> {
        let secs = deadline.as_secs();
        tokio::time::timeout(deadline, self.generate_inner(parts))
            .await
            .map_err(|_| AiError::Timeout { secs })?
    }

    async fn generate_inner(&self, parts: Vec<GenPart>) -> Result<String, AiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, MODEL, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: parts
                    .into_iter()
                    .map(|p| match p {
                        GenPart::Text(text) => RequestPart::Text(text),
                        GenPart::InlineImage { mime_type, data_b64 } => RequestPart::InlineData {
                            mime_type,
                            data: data_b64,
                        },
                    })
                    .collect(),
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Deserialize {
                context: format!("generateContent ({MODEL})"),
                source: e,
            })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::Empty);
        }

        Ok(text)
    }
}

/// Maps a non-2xx provider reply to the error taxonomy. Credential problems
/// (401/403, or a 400 complaining about the API key) are the only hard
/// failures; everything else stays recoverable.
fn classify_failure(status: u16, body: &str) -> AiError {
    if status == 401 || status == 403 {
        return AiError::Auth;
    }
    let lower = body.to_lowercase();
    if status == 400 && (lower.contains("api key") || lower.contains("api_key_invalid")) {
        return AiError::Auth;
    }
    AiError::Provider {
        status,
        message: truncate(body, 300),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_classifies_as_auth() {
        assert!(matches!(classify_failure(401, "denied"), AiError::Auth));
        assert!(matches!(classify_failure(403, "denied"), AiError::Auth));
    }

    #[test]
    fn bad_api_key_in_body_classifies_as_auth() {
        let body = r#"{"error":{"status":"INVALID_ARGUMENT","message":"API key not valid"}}"#;
        assert!(matches!(classify_failure(400, body), AiError::Auth));
    }

    #[test]
    fn quota_exhaustion_stays_recoverable() {
        let err = classify_failure(429, "RESOURCE_EXHAUSTED");
        assert!(matches!(err, AiError::Provider { status: 429, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn request_parts_serialize_to_gemini_shape() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text("describe".to_string()),
                    RequestPart::InlineData {
                        mime_type: "image/jpeg".to_string(),
                        data: "QUJD".to_string(),
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
    }
}
