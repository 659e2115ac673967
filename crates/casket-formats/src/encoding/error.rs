//! Error types for encoding table parsing

use thiserror::Error;

/// Errors raised while parsing an encoding table
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum EncodingError {
    #[error("invalid magic: expected 'EN', got {0:?}")]
    InvalidMagic([u8; 2]),

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid {field} hash size: expected 1..=16, got {value}")]
    InvalidHashSize {
        /// Which hash size field is invalid
        field: &'static str,
        /// The invalid value
        value: u8,
    },

    #[error("invalid {field} page size: 0 KiB")]
    InvalidPageSize {
        /// Which page size field is invalid
        field: &'static str,
    },

    #[error("truncated {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("content key page {page}: checksum mismatch, expected {expected}, got {actual}")]
    PageChecksumMismatch {
        page: usize,
        expected: String,
        actual: String,
    },

    #[error("content key page {page}: entry at offset {offset} runs past the page end")]
    TruncatedEntry { page: usize, offset: usize },

    #[error("content key {0} has no encoding keys")]
    EmptyEntry(String),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] casket_crypto::CryptoError),

    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}
