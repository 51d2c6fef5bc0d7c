//! Error types for Larder

/// Main error type for Larder operations
#[derive(Debug, thiserror::Error)]
pub enum LarderError {
    /// Transport or parse failure while loading a feed page. The feed
    /// session stays usable after this; the caller surfaces it as a
    /// transient notification and the user retries by scrolling again.
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<mongodb::error::Error> for LarderError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for LarderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fetch(format!("JSON error: {}", err))
    }
}

/// Result type alias for Larder operations
pub type Result<T> = std::result::Result<T, LarderError>;
