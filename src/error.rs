use thiserror::Error;

/// Failures surfaced by the lyrics fetching layer.
///
/// A missing page (any non-2xx status) or a page without the expected markup is
/// not an error: providers report it as an absent result instead.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: DNS, refused connection, reset, timeout.
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build http client: {0}")]
    Client(String),
}

impl FetchError {
    pub fn connection(url: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether the orchestrator should skip to the next provider.
    pub fn is_connection(&self) -> bool {
        matches!(self, FetchError::Connection { .. })
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
