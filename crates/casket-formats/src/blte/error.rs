//! BLTE error types

use thiserror::Error;

/// BLTE-specific error type
///
/// Every failure after the header is attributed to the chunk it occurred in.
#[derive(Debug, Error)]
pub enum BlteError {
    /// Invalid BLTE magic bytes
    #[error("invalid BLTE magic: expected [42 4C 54 45], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Chunk table could not be read or is inconsistent
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Input ended inside a chunk
    #[error("chunk {chunk}: truncated, expected {expected} bytes")]
    Truncated {
        /// Chunk index
        chunk: usize,
        /// Declared compressed size
        expected: u32,
    },

    /// Chunk is empty and carries no mode byte
    #[error("chunk {chunk}: empty")]
    EmptyChunk {
        /// Chunk index
        chunk: usize,
    },

    /// MD5 of the compressed chunk does not match the chunk table
    #[error("chunk {chunk}: checksum mismatch, expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Chunk index
        chunk: usize,
        /// Declared checksum (hex)
        expected: String,
        /// Computed checksum (hex)
        actual: String,
    },

    /// Decompressed length differs from the chunk table
    #[error("chunk {chunk}: decompressed to {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Chunk index
        chunk: usize,
        /// Declared decompressed size
        expected: u64,
        /// Produced size
        actual: u64,
    },

    /// Unknown compression mode
    #[error("chunk {chunk}: unknown compression mode 0x{mode:02X}")]
    UnknownCompressionMode {
        /// Chunk index
        chunk: usize,
        /// Mode byte found
        mode: u8,
    },

    /// zlib stream is corrupt
    #[error("chunk {chunk}: decompression failed: {reason}")]
    DecompressionFailed {
        /// Chunk index
        chunk: usize,
        /// Decoder message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl BlteError {
    /// Chunk the error is attributed to, if any
    pub fn chunk(&self) -> Option<usize> {
        match self {
            Self::Truncated { chunk, .. }
            | Self::EmptyChunk { chunk }
            | Self::ChecksumMismatch { chunk, .. }
            | Self::SizeMismatch { chunk, .. }
            | Self::UnknownCompressionMode { chunk, .. }
            | Self::DecompressionFailed { chunk, .. } => Some(*chunk),
            Self::InvalidMagic(_) | Self::InvalidHeader(_) | Self::Io(_) | Self::BinRw(_) => {
                None
            }
        }
    }

    /// Whether the container decoded structurally but failed an integrity check
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::SizeMismatch { .. }
        )
    }
}

/// Result type for BLTE operations
pub type BlteResult<T> = Result<T, BlteError>;
