//! Root table errors

use thiserror::Error;

/// Errors raised while parsing a root table
#[derive(Debug, Error)]
pub enum RootError {
    /// Manifest header could not be read
    #[error("invalid root header: {0}")]
    InvalidHeader(String),

    /// A block declares more data than remains
    #[error("block {block} at offset {offset}: truncated, need {needed} bytes, have {available}")]
    Truncated {
        /// Block index in file order
        block: usize,
        /// Byte offset of the block header
        offset: usize,
        /// Bytes the block needs
        needed: u64,
        /// Bytes left in the input
        available: u64,
    },

    /// Builder input that cannot be encoded
    #[error("cannot encode root block: {0}")]
    InvalidBlock(String),
}

/// Result type for root operations
pub type Result<T> = std::result::Result<T, RootError>;
