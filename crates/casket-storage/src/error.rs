//! Error types for archive resolution

use casket_access::AccessError;
use casket_formats::blte::BlteError;
use casket_formats::config::ConfigError;
use casket_formats::encoding::EncodingError;
use casket_formats::root::RootError;
use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised while loading tables or resolving content
///
/// A name that is simply not present is not an error; resolution returns
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Build metadata is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An index document could not be decoded
    #[error("malformed index {document}: {reason}")]
    MalformedIndex {
        /// Document file name or URL
        document: String,
        /// Decoder message
        reason: String,
    },

    /// The encoding table could not be decoded
    #[error("malformed encoding table: {0}")]
    MalformedEncoding(#[from] EncodingError),

    /// The root table could not be decoded
    #[error("malformed root table: {0}")]
    MalformedRoot(#[from] RootError),

    /// A stored block is not a valid container
    #[error("malformed container {key}: {source}")]
    MalformedContainer {
        /// Storage key of the block
        key: String,
        /// Decoder error, carrying the failing chunk
        #[source]
        source: BlteError,
    },

    /// Tables disagree with each other
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// Reading a location failed
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Table initialization failed earlier; the context must be rebuilt
    #[error("archive context failed to initialize: {0}")]
    ContextFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing task panicked or was cancelled
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Whether a block failed a checksum or size check
    ///
    /// These failures concern a single read; retrying the resolution may
    /// succeed.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            Self::MalformedContainer { source, .. } => source.is_integrity_failure(),
            _ => false,
        }
    }

    /// Chunk a container error is attributed to
    pub fn chunk(&self) -> Option<usize> {
        match self {
            Self::MalformedContainer { source, .. } => source.chunk(),
            _ => None,
        }
    }
}

impl From<ConfigError> for StorageError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}
