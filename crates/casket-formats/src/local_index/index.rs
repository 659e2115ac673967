//! Local `.idx` documents

use std::io::Cursor;

use binrw::BinReaderExt;
use casket_crypto::Key;
use tracing::debug;

use super::header::{
    ENTRIES_OFFSET, ENTRY_BLOCK_OFFSET, GuardedBlockHeader, LOCAL_HEADER_SIZE, LocalIndexHeader,
};
use crate::archive::IndexError;

/// One record of a local index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalIndexRecord {
    /// First 9 bytes of the encoding key
    pub key: Key,
    /// Number of the `data.NNN` file holding the block
    pub archive_id: u16,
    /// Offset of the block header inside the data file
    pub offset: u32,
    /// Block size including its 30-byte header
    pub size: u32,
}

/// Parsed local `.idx` document
#[derive(Debug, Clone)]
pub struct LocalIndex {
    /// Document header
    pub header: LocalIndexHeader,
    /// Records in file order, padding removed
    pub records: Vec<LocalIndexRecord>,
}

impl LocalIndex {
    /// Parse a complete `.idx` document
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        if data.len() < ENTRIES_OFFSET {
            return Err(IndexError::TooShort {
                len: data.len(),
                needed: ENTRIES_OFFSET,
            });
        }

        let mut cursor = Cursor::new(data);
        let header_block: GuardedBlockHeader = cursor.read_le()?;
        if header_block.block_size as usize != LOCAL_HEADER_SIZE {
            return Err(IndexError::InvalidHeader(format!(
                "header block of {} bytes",
                header_block.block_size
            )));
        }
        let header: LocalIndexHeader = cursor.read_le()?;
        if !header.is_standard() {
            return Err(IndexError::InvalidHeader(format!(
                "version {} with {}/{}/{} byte key/location/size fields",
                header.version,
                header.ekey_length,
                header.storage_offset_length,
                header.encoded_size_length
            )));
        }

        cursor.set_position(ENTRY_BLOCK_OFFSET as u64);
        let entry_block: GuardedBlockHeader = cursor.read_le()?;
        let entries_end = ENTRIES_OFFSET + entry_block.block_size as usize;
        if data.len() < entries_end {
            return Err(IndexError::TooShort {
                len: data.len(),
                needed: entries_end,
            });
        }

        let record_size = header.record_size();
        let entries = &data[ENTRIES_OFFSET..entries_end];
        if entries.len() % record_size != 0 {
            return Err(IndexError::PageLayout(format!(
                "entry block of {} bytes ends inside a {record_size}-byte record",
                entries.len()
            )));
        }

        let mut records = Vec::with_capacity(entries.len() / record_size);
        for raw in entries.chunks_exact(record_size) {
            if raw[..9].iter().all(|&b| b == 0) {
                continue;
            }
            let high = u16::from(raw[9]);
            let packed = u32::from_be_bytes([raw[10], raw[11], raw[12], raw[13]]);
            records.push(LocalIndexRecord {
                key: Key::from_bytes(&raw[..9])?,
                archive_id: (high << 2) | (packed >> 30) as u16,
                offset: packed & 0x3FFF_FFFF,
                size: u32::from_le_bytes([raw[14], raw[15], raw[16], raw[17]]),
            });
        }

        debug!(
            bucket = header.bucket,
            records = records.len(),
            "parsed local index"
        );

        Ok(Self { header, records })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the document holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Bucket a key is stored in: xor of the first nine bytes, nibbles folded
pub fn bucket_for_key(key: &[u8]) -> u8 {
    let hash = key.iter().take(9).fold(0u8, |acc, &b| acc ^ b);
    (hash & 0x0F) ^ (hash >> 4)
}

/// Document file name for a bucket and version
pub fn index_file_name(bucket: u8, version: u32) -> String {
    format!("{bucket:02x}{version:08x}.idx")
}

/// Bucket and version encoded in a document file name
pub fn parse_index_file_name(name: &str) -> Option<(u8, u32)> {
    let stem = name.strip_suffix(".idx")?;
    if stem.len() != 10 || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bucket = u8::from_str_radix(&stem[..2], 16).ok()?;
    let version = u32::from_str_radix(&stem[2..], 16).ok()?;
    Some((bucket, version))
}
