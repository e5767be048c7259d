use thiserror::Error;

/// Errors from the generative-model client and the scan normalizer.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller-imposed deadline elapsed before the model answered.
    #[error("AI request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Missing/invalid credentials. The one failure no fallback can
    /// compensate for — surfaced to the merchant as an integration problem.
    #[error("AI API key missing or invalid. Please contact the app owner.")]
    Auth,

    /// The submitted image payload is too small to be a real photo.
    #[error("no image data or image too small; please take a clear photo")]
    InvalidImage,

    /// Non-2xx status that is not an auth failure (quota, safety block, 5xx).
    #[error("AI provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    /// The model answered with no usable text.
    #[error("empty response from AI")]
    Empty,

    /// The response body (or the model's JSON reply) did not parse.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AiError {
    /// `true` for failures the scan flow absorbs into the fallback product.
    /// Auth failures and bad input are the only hard stops.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AiError::Auth | AiError::InvalidImage)
    }
}
