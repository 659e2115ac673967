//! Index document errors

use thiserror::Error;

/// Errors raised while parsing CDN `.index` or local `.idx` documents
#[derive(Debug, Error)]
pub enum IndexError {
    /// Document is shorter than its fixed structures
    #[error("document too short: {len} bytes, need at least {needed}")]
    TooShort {
        /// Document length
        len: usize,
        /// Minimum length for the declared layout
        needed: usize,
    },

    /// Footer fields are out of range
    #[error("invalid footer: {0}")]
    InvalidFooter(String),

    /// Document length does not match a whole number of pages
    #[error("page layout mismatch: {0}")]
    PageLayout(String),

    /// Local index header is not the supported layout
    #[error("invalid local index header: {0}")]
    InvalidHeader(String),

    /// Record key could not be built
    #[error("invalid key: {0}")]
    InvalidKey(#[from] casket_crypto::CryptoError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}
