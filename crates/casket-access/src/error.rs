//! Error types for data access

use thiserror::Error;

/// Errors raised while opening or reading a location
#[derive(Debug, Error)]
pub enum AccessError {
    /// Local path is missing, not a regular file, or unreadable
    #[error("location not found: {location}: {reason}")]
    LocationNotFound {
        /// Path as displayed
        location: String,
        /// Why it could not be opened
        reason: String,
    },

    /// Server answered with a non-success status
    #[error("transfer of {url} failed with status {status}")]
    Transfer {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Key cannot be used to address CDN content
    #[error("invalid key {key}: CDN content is addressed by 16-byte keys, got {len}")]
    InvalidKey {
        /// Key as hex
        key: String,
        /// Key length in bytes
        len: usize,
    },

    /// Provider does not handle this kind of location
    #[error("unsupported location: {0}")]
    UnsupportedLocation(String),

    /// URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessError {
    /// Whether the location does not exist, locally or on the server
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::LocationNotFound { .. } => true,
            Self::Transfer { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Result type for data access
pub type Result<T> = std::result::Result<T, AccessError>;
