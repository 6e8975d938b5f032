use thiserror::Error;

/// Errors raised while serving panel requests
#[derive(Debug, Error)]
pub enum Error {
    #[error("Host API error: {0}")]
    Host(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Current window has no active tab")]
    NoActiveTab,

    #[error("Bookmark not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Port closed: {0}")]
    Closed(String),
}

/// Result type alias for background operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
