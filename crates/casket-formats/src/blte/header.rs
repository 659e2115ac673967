//! BLTE header structures and parsing

use binrw::io::{NoSeek, Read};
use binrw::{BinRead, BinReaderExt};

use super::error::{BlteError, BlteResult};

/// BLTE magic bytes
pub const BLTE_MAGIC: [u8; 4] = *b"BLTE";

/// Size of one standard chunk table entry
pub const CHUNK_INFO_SIZE: usize = 24;

/// Flag byte of the standard chunk table
pub const STANDARD_TABLE_FLAGS: u8 = 0x0F;

/// Flag byte of the 40-byte-per-entry table carrying decompressed checksums
pub const EXTENDED_TABLE_FLAGS: u8 = 0x10;

/// Largest chunk count the 24-bit field can express
pub const MAX_CHUNK_COUNT: u32 = 0xFF_FFFF;

/// Chunk table entry (24 bytes, big-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct ChunkInfo {
    /// Compressed size including the mode byte
    pub compressed_size: u32,
    /// Size after decompression
    pub decompressed_size: u32,
    /// MD5 of the compressed bytes (mode byte included)
    pub checksum: [u8; 16],
}

/// Parsed BLTE header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlteHeader {
    /// Header size as stored; zero means a single implicit chunk
    pub header_size: u32,
    /// Chunk table; empty for single-chunk containers
    pub chunks: Vec<ChunkInfo>,
}

impl BlteHeader {
    /// Read the magic, header size and chunk table
    pub fn read<R: Read>(reader: &mut R) -> BlteResult<Self> {
        let mut reader = NoSeek::new(reader);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != BLTE_MAGIC {
            return Err(BlteError::InvalidMagic(magic));
        }

        let header_size: u32 = reader.read_be()?;
        if header_size == 0 {
            return Ok(Self {
                header_size,
                chunks: Vec::new(),
            });
        }

        let mut table = [0u8; 4];
        reader
            .read_exact(&mut table)
            .map_err(|e| BlteError::InvalidHeader(format!("missing chunk count: {e}")))?;

        // The first byte flags the table layout. Writers that leave it zero
        // produce the standard layout as well.
        let flags = table[0];
        if flags == EXTENDED_TABLE_FLAGS {
            return Err(BlteError::InvalidHeader(
                "extended chunk table is not supported".to_string(),
            ));
        }
        if flags != STANDARD_TABLE_FLAGS && flags != 0 {
            return Err(BlteError::InvalidHeader(format!(
                "unknown chunk table flags 0x{flags:02X}"
            )));
        }

        let count = u32::from_be_bytes([0, table[1], table[2], table[3]]);
        if count == 0 {
            return Err(BlteError::InvalidHeader("chunk count is zero".to_string()));
        }

        let mut chunks = Vec::with_capacity(count.min(4096) as usize);
        for index in 0..count {
            let info = ChunkInfo::read(&mut reader).map_err(|e| {
                BlteError::InvalidHeader(format!("chunk table entry {index}: {e}"))
            })?;
            chunks.push(info);
        }

        let expected = Self::header_size_for(chunks.len());
        if header_size != expected {
            return Err(BlteError::InvalidHeader(format!(
                "header size {header_size} does not match {count} chunk entries ({expected})"
            )));
        }

        Ok(Self {
            header_size,
            chunks,
        })
    }

    /// Whether the container is one implicit chunk
    pub fn is_single_chunk(&self) -> bool {
        self.header_size == 0
    }

    /// Sum of declared decompressed sizes
    pub fn decompressed_size(&self) -> u64 {
        self.chunks
            .iter()
            .map(|c| u64::from(c.decompressed_size))
            .sum()
    }

    /// Header size a writer stores for `chunk_count` standard entries
    pub fn header_size_for(chunk_count: usize) -> u32 {
        (12 + chunk_count * CHUNK_INFO_SIZE) as u32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_single_chunk_header() {
        let mut data = Cursor::new(b"BLTE\0\0\0\0N".to_vec());
        let header = BlteHeader::read(&mut data).unwrap();
        assert!(header.is_single_chunk());
        assert!(header.chunks.is_empty());
        assert_eq!(data.position(), 8);
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = Cursor::new(b"BLTX\0\0\0\0".to_vec());
        assert!(matches!(
            BlteHeader::read(&mut data),
            Err(BlteError::InvalidMagic(m)) if &m == b"BLTX"
        ));
    }

    #[test]
    fn test_reserved_flag_byte_accepted() {
        // Two zero bytes followed by a 16-bit count reads like the 24-bit form
        let mut raw = b"BLTE".to_vec();
        raw.extend_from_slice(&36u32.to_be_bytes());
        raw.extend_from_slice(&[0, 0, 0, 1]);
        raw.extend_from_slice(&5u32.to_be_bytes());
        raw.extend_from_slice(&4u32.to_be_bytes());
        raw.extend_from_slice(&[0xAB; 16]);

        let header = BlteHeader::read(&mut Cursor::new(raw)).unwrap();
        assert_eq!(header.chunks.len(), 1);
        assert_eq!(header.chunks[0].compressed_size, 5);
        assert_eq!(header.chunks[0].decompressed_size, 4);
        assert_eq!(header.decompressed_size(), 4);
    }

    #[test]
    fn test_truncated_table() {
        let mut raw = b"BLTE".to_vec();
        raw.extend_from_slice(&60u32.to_be_bytes());
        raw.extend_from_slice(&[0x0F, 0, 0, 2]);
        raw.extend_from_slice(&[0u8; 24]);

        assert!(matches!(
            BlteHeader::read(&mut Cursor::new(raw)),
            Err(BlteError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_header_size_must_match_table() {
        let mut raw = b"BLTE".to_vec();
        raw.extend_from_slice(&9999u32.to_be_bytes());
        raw.extend_from_slice(&[0x0F, 0, 0, 1]);
        raw.extend_from_slice(&[0u8; 24]);

        assert!(matches!(
            BlteHeader::read(&mut Cursor::new(raw)),
            Err(BlteError::InvalidHeader(msg)) if msg.contains("9999")
        ));
    }

    #[test]
    fn test_extended_table_rejected() {
        let mut raw = b"BLTE".to_vec();
        raw.extend_from_slice(&52u32.to_be_bytes());
        raw.extend_from_slice(&[0x10, 0, 0, 1]);
        raw.extend_from_slice(&[0u8; 40]);

        assert!(matches!(
            BlteHeader::read(&mut Cursor::new(raw)),
            Err(BlteError::InvalidHeader(_))
        ));
    }
}
