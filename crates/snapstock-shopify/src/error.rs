use thiserror::Error;

/// Errors from the Admin API client and the publish protocol.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status from the GraphQL endpoint or an upload target.
    #[error("unexpected HTTP status {status} from {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level GraphQL errors (query rejected before execution).
    #[error("GraphQL error: {}", messages.join("; "))]
    Graphql { messages: Vec<String> },

    /// Mutation-level user errors, surfaced verbatim to the merchant.
    #[error("{}", messages.join("; "))]
    UserErrors { messages: Vec<String> },

    /// A payload the protocol depends on was absent (e.g. no staged target).
    #[error("missing data in platform response: {context}")]
    MissingData { context: String },

    /// An inline image could not be parsed as a base64 data URL.
    #[error("invalid inline image: {reason}")]
    InvalidImage { reason: String },
}
