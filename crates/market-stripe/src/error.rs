use thiserror::Error;

/// Errors returned by the Stripe API client.
#[derive(Debug, Error)]
pub enum StripeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The requested object does not exist (HTTP 404 or `resource_missing`).
    #[error("Stripe resource not found: {0}")]
    NotFound(String),

    /// Stripe answered with a non-2xx status and an error body.
    #[error("Stripe API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot address API endpoints.
    #[error("invalid Stripe base URL '{0}'")]
    InvalidBaseUrl(String),

    /// A checkout session came back without a payment intent.
    #[error("checkout session {0} has no payment intent")]
    MissingPaymentIntent(String),
}
