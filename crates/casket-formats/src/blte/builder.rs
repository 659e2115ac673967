//! BLTE container builder

use std::io::Write;

use casket_crypto::md5_digest;
use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::chunk::CompressionMode;
use super::error::{BlteError, BlteResult};
use super::header::{BLTE_MAGIC, BlteHeader, MAX_CHUNK_COUNT, STANDARD_TABLE_FLAGS};

/// Builds BLTE containers from plaintext chunks
///
/// ```
/// use casket_formats::blte::{BlteBuilder, CompressionMode, decode_bytes};
///
/// let container = BlteBuilder::new()
///     .add_chunk(b"hello ".to_vec(), CompressionMode::None)
///     .add_chunk(b"world".to_vec(), CompressionMode::ZLib)
///     .build()
///     .expect("valid chunks");
///
/// assert_eq!(decode_bytes(&container).expect("decodes"), b"hello world");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlteBuilder {
    chunks: Vec<(Vec<u8>, CompressionMode)>,
    single: bool,
}

impl BlteBuilder {
    /// Create an empty builder producing a chunk table
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a headerless single-chunk container instead of a chunk table
    ///
    /// Only the first chunk is written in this mode.
    #[must_use]
    pub fn single_chunk(mut self) -> Self {
        self.single = true;
        self
    }

    /// Append a plaintext chunk
    #[must_use]
    pub fn add_chunk(mut self, data: Vec<u8>, mode: CompressionMode) -> Self {
        self.chunks.push((data, mode));
        self
    }

    /// Split `data` into chunks of `chunk_size` bytes, all with `mode`
    #[must_use]
    pub fn add_chunked(mut self, data: &[u8], chunk_size: usize, mode: CompressionMode) -> Self {
        for part in data.chunks(chunk_size.max(1)) {
            self.chunks.push((part.to_vec(), mode));
        }
        self
    }

    /// Serialize the container
    pub fn build(&self) -> BlteResult<Vec<u8>> {
        if self.chunks.is_empty() {
            return Err(BlteError::InvalidHeader("no chunks to write".to_string()));
        }
        if self.chunks.len() > MAX_CHUNK_COUNT as usize {
            return Err(BlteError::InvalidHeader(format!(
                "{} chunks exceed the 24-bit count",
                self.chunks.len()
            )));
        }

        let encoded = self
            .chunks
            .iter()
            .map(|(data, mode)| encode_chunk(data, *mode))
            .collect::<BlteResult<Vec<_>>>()?;

        let mut out = Vec::new();
        out.extend_from_slice(&BLTE_MAGIC);

        if self.single {
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&encoded[0]);
            return Ok(out);
        }

        let count = encoded.len() as u32;
        out.extend_from_slice(&BlteHeader::header_size_for(encoded.len()).to_be_bytes());
        out.push(STANDARD_TABLE_FLAGS);
        out.extend_from_slice(&count.to_be_bytes()[1..]);

        for ((plain, _), raw) in self.chunks.iter().zip(&encoded) {
            out.extend_from_slice(&(raw.len() as u32).to_be_bytes());
            out.extend_from_slice(&(plain.len() as u32).to_be_bytes());
            out.extend_from_slice(&md5_digest(raw));
        }
        for raw in &encoded {
            out.extend_from_slice(raw);
        }

        Ok(out)
    }
}

/// Mode byte plus payload for one chunk
fn encode_chunk(data: &[u8], mode: CompressionMode) -> BlteResult<Vec<u8>> {
    match mode {
        CompressionMode::None => {
            let mut raw = Vec::with_capacity(data.len() + 1);
            raw.push(mode.as_byte());
            raw.extend_from_slice(data);
            Ok(raw)
        }
        CompressionMode::ZLib => {
            let mut encoder = ZlibEncoder::new(vec![mode.as_byte()], Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
    }
}
