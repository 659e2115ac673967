//! BLTE chunk modes and per-chunk decoding

use std::io::Read;

use casket_crypto::md5_digest;
use flate2::read::ZlibDecoder;

use super::error::{BlteError, BlteResult};
use super::header::ChunkInfo;

/// Upper bound for a chunk whose decompressed size is not declared
pub const MAX_IMPLICIT_CHUNK_SIZE: u64 = 1024 * 1024 * 1024;

/// BLTE compression modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMode {
    /// Stored (mode 'N')
    None = b'N',
    /// zlib deflate (mode 'Z')
    ZLib = b'Z',
}

impl CompressionMode {
    /// Parse compression mode from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'N' => Some(Self::None),
            b'Z' => Some(Self::ZLib),
            _ => None,
        }
    }

    /// Get the byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Verify and decode one chunk listed in the chunk table
///
/// `raw` holds exactly `info.compressed_size` bytes, mode byte first.
pub fn decode_chunk(index: usize, info: &ChunkInfo, raw: &[u8]) -> BlteResult<Vec<u8>> {
    let actual = md5_digest(raw);
    if actual != info.checksum {
        return Err(BlteError::ChecksumMismatch {
            chunk: index,
            expected: hex::encode(info.checksum),
            actual: hex::encode(actual),
        });
    }

    let expected = u64::from(info.decompressed_size);
    let data = decompress(index, raw, expected)?;
    if data.len() as u64 != expected {
        return Err(BlteError::SizeMismatch {
            chunk: index,
            expected,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// Decode a chunk without table metadata (single-chunk containers)
pub fn decode_implicit_chunk(raw: &[u8]) -> BlteResult<Vec<u8>> {
    decompress(0, raw, MAX_IMPLICIT_CHUNK_SIZE)
}

/// Strip the mode byte and decompress at most `limit + 1` bytes
///
/// Reading one byte past the limit lets the caller detect oversized output
/// without inflating an unbounded stream.
fn decompress(index: usize, raw: &[u8], limit: u64) -> BlteResult<Vec<u8>> {
    let (&mode_byte, payload) = raw
        .split_first()
        .ok_or(BlteError::EmptyChunk { chunk: index })?;
    let mode = CompressionMode::from_byte(mode_byte).ok_or(BlteError::UnknownCompressionMode {
        chunk: index,
        mode: mode_byte,
    })?;

    match mode {
        CompressionMode::None => Ok(payload.to_vec()),
        CompressionMode::ZLib => {
            let hint = limit.min(payload.len() as u64 * 8).min(16 * 1024 * 1024);
            let mut out = Vec::with_capacity(hint as usize);
            ZlibDecoder::new(payload)
                .take(limit.saturating_add(1))
                .read_to_end(&mut out)
                .map_err(|e| BlteError::DecompressionFailed {
                    chunk: index,
                    reason: e.to_string(),
                })?;
            Ok(out)
        }
    }
}
