//! BLTE (Block Table Encoded) container decoding
//!
//! Every block stored in an archive is a BLTE container: a chunk table
//! followed by individually checksummed, optionally zlib-compressed chunks.
//!
//! ```text
//! "BLTE" | header_size u32 BE | flags u8 | chunk_count u24 BE
//!        | chunk_count x (compressed u32 BE, decompressed u32 BE, md5[16])
//!        | chunk data...
//! ```
//!
//! A header size of zero means there is no chunk table and the rest of the
//! input is a single chunk of unknown size.
//!
//! Decoding is all-or-nothing: the first failing chunk aborts the decode and
//! no partial output escapes.

mod builder;
mod chunk;
mod error;
mod header;

pub use builder::BlteBuilder;
pub use chunk::{CompressionMode, MAX_IMPLICIT_CHUNK_SIZE, decode_chunk, decode_implicit_chunk};
pub use error::{BlteError, BlteResult};
pub use header::{BLTE_MAGIC, BlteHeader, CHUNK_INFO_SIZE, ChunkInfo};

use std::io::{Cursor, Read};

use tracing::trace;

/// Decode a BLTE container read from `reader`
///
/// Consumes the container's bytes; for chunk tables exactly the declared
/// chunk bytes are read, for single-chunk containers the reader is drained.
pub fn decode<R: Read>(mut reader: R) -> BlteResult<Vec<u8>> {
    let header = BlteHeader::read(&mut reader)?;

    if header.is_single_chunk() {
        let mut raw = Vec::new();
        reader
            .by_ref()
            .take(MAX_IMPLICIT_CHUNK_SIZE + 1)
            .read_to_end(&mut raw)?;
        trace!(compressed = raw.len(), "decoding single-chunk BLTE");
        return decode_implicit_chunk(&raw);
    }

    let total = header.decompressed_size();
    let mut output = Vec::with_capacity(total.min(64 * 1024 * 1024) as usize);
    let mut raw = Vec::new();

    for (index, info) in header.chunks.iter().enumerate() {
        raw.clear();
        let read = reader
            .by_ref()
            .take(u64::from(info.compressed_size))
            .read_to_end(&mut raw)?;
        if read != info.compressed_size as usize {
            return Err(BlteError::Truncated {
                chunk: index,
                expected: info.compressed_size,
            });
        }

        let data = decode_chunk(index, info, &raw)?;
        output.extend_from_slice(&data);
    }

    trace!(
        chunks = header.chunks.len(),
        decompressed = output.len(),
        "decoded BLTE"
    );
    Ok(output)
}

/// Decode a BLTE container held in memory
pub fn decode_bytes(data: &[u8]) -> BlteResult<Vec<u8>> {
    decode(Cursor::new(data))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_multi_chunk_round_trip() {
        let container = BlteBuilder::new()
            .add_chunk(b"first chunk, ".to_vec(), CompressionMode::None)
            .add_chunk(vec![b'z'; 2048], CompressionMode::ZLib)
            .add_chunk(b", last".to_vec(), CompressionMode::None)
            .build()
            .unwrap();

        let mut expected = b"first chunk, ".to_vec();
        expected.extend(vec![b'z'; 2048]);
        expected.extend_from_slice(b", last");

        assert_eq!(decode_bytes(&container).unwrap(), expected);
    }

    #[test]
    fn test_single_chunk_container() {
        for mode in [CompressionMode::None, CompressionMode::ZLib] {
            let container = BlteBuilder::new()
                .single_chunk()
                .add_chunk(b"only chunk".to_vec(), mode)
                .build()
                .unwrap();
            assert_eq!(&container[4..8], &[0, 0, 0, 0]);
            assert_eq!(decode_bytes(&container).unwrap(), b"only chunk");
        }
    }

    #[test]
    fn test_corrupted_chunk_fails_without_output() {
        let container = BlteBuilder::new()
            .add_chunk(b"good".to_vec(), CompressionMode::None)
            .add_chunk(b"also good".to_vec(), CompressionMode::None)
            .build()
            .unwrap();

        // Flip the last payload byte, which belongs to chunk 1
        let mut corrupted = container;
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;

        let err = decode_bytes(&corrupted).unwrap_err();
        assert!(matches!(err, BlteError::ChecksumMismatch { chunk: 1, .. }));
        assert_eq!(err.chunk(), Some(1));
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn test_truncated_chunk_data() {
        let container = BlteBuilder::new()
            .add_chunk(b"0123456789".to_vec(), CompressionMode::None)
            .build()
            .unwrap();
        let err = decode_bytes(&container[..container.len() - 3]).unwrap_err();
        assert!(matches!(err, BlteError::Truncated { chunk: 0, expected: 11 }));
    }

    #[test]
    fn test_trailing_bytes_not_consumed() {
        let mut container = BlteBuilder::new()
            .add_chunk(b"payload".to_vec(), CompressionMode::None)
            .build()
            .unwrap();
        let len = container.len();
        container.extend_from_slice(b"trailing");

        let mut cursor = Cursor::new(container);
        assert_eq!(decode(&mut cursor).unwrap(), b"payload");
        assert_eq!(cursor.position() as usize, len);
    }

    #[test]
    fn test_header_size_inconsistent_with_table() {
        let mut container = BlteBuilder::new()
            .add_chunk(b"abc".to_vec(), CompressionMode::None)
            .add_chunk(b"def".to_vec(), CompressionMode::ZLib)
            .build()
            .unwrap();
        assert_eq!(decode_bytes(&container).unwrap(), b"abcdef");

        container[4..8].copy_from_slice(&9999u32.to_be_bytes());
        let err = decode_bytes(&container).unwrap_err();
        assert!(matches!(err, BlteError::InvalidHeader(_)), "{err}");
        assert!(!err.is_integrity_failure());
    }

    #[test]
    fn test_wrong_magic() {
        let err = decode_bytes(b"NOPE\0\0\0\0Nxx").unwrap_err();
        assert!(matches!(err, BlteError::InvalidMagic(_)));
        assert_eq!(err.chunk(), None);
    }

    proptest! {
        #[test]
        fn round_trip_any_chunking(
            chunks in proptest::collection::vec(
                (proptest::collection::vec(any::<u8>(), 0..512), any::<bool>()),
                1..8,
            )
        ) {
            let mut builder = BlteBuilder::new();
            let mut expected = Vec::new();
            for (data, compress) in &chunks {
                let mode = if *compress { CompressionMode::ZLib } else { CompressionMode::None };
                expected.extend_from_slice(data);
                builder = builder.add_chunk(data.clone(), mode);
            }

            let container = builder.build().unwrap();
            prop_assert_eq!(decode_bytes(&container).unwrap(), expected);
        }
    }
}
