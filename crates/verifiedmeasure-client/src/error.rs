//! Client error types.

/// Errors that can occur when using the VerifiedMeasure client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token was missing or rejected, or the caller is not an admin.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The net-new cost of a claim exceeds the caller's balance.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Server returned any other error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Machine-readable error tag.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
