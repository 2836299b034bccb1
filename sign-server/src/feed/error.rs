//! Feed fetch error types.

/// Errors from fetching or decoding a single feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API key cannot be sent as a header value
    #[error("invalid API key format")]
    InvalidApiKey,

    /// Feed endpoint returned a non-success status
    #[error("feed fetch failed: {status} {message}")]
    Status { status: u16, message: String },

    /// Body was not a valid `FeedMessage`
    #[error("feed decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Mock feed file missing or unreadable
    #[error("mock feed error: {message}")]
    Mock { message: String },
}
