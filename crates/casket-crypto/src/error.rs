//! Error types for key construction

use thiserror::Error;

/// Errors that can occur when building keys
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Keys are never built from an empty byte sequence
    #[error("key must contain at least one byte")]
    EmptyKey,

    /// Key exceeds the inline storage size
    #[error("key too long: {actual} bytes (maximum {max})")]
    KeyTooLong {
        /// Length that was supplied
        actual: usize,
        /// Maximum supported length
        max: usize,
    },

    /// Hex string could not be decoded
    #[error("invalid key hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
