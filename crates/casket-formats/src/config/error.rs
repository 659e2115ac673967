//! Configuration document errors

use thiserror::Error;

/// Errors raised while reading build, CDN or `.build.info` documents
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is absent
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A field is present but holds the wrong shape of value
    #[error("field '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A field does not hold a valid hex key
    #[error("field '{field}': {source}")]
    InvalidKey {
        /// Field name
        field: String,
        /// Key parse failure
        #[source]
        source: casket_crypto::CryptoError,
    },

    /// The `.build.info` table is malformed
    #[error("build info: {0}")]
    Table(String),

    /// No row of `.build.info` is marked active
    #[error("build info has no active row")]
    NoActiveBuild,

    /// Document is not UTF-8
    #[error("document is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
