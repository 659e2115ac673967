//! Local `.idx` header structures

use binrw::{BinRead, BinWrite};

/// Size and Jenkins hash guarding the block that follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct GuardedBlockHeader {
    /// Bytes in the guarded block
    pub block_size: u32,
    /// `hashlittle` of the guarded block
    pub block_hash: u32,
}

/// Field layout of a version 7 local index (16 bytes, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct LocalIndexHeader {
    /// Format version, 7
    pub version: u16,
    /// Bucket the document holds keys for
    pub bucket: u8,
    /// Extra bytes per record, 0
    pub extra_bytes: u8,
    /// Width of the size field
    pub encoded_size_length: u8,
    /// Width of the archive location field
    pub storage_offset_length: u8,
    /// Width of the key prefix
    pub ekey_length: u8,
    /// Bits of the location field used for the offset
    pub file_offset_bits: u8,
    /// Maximum size of one data file
    pub segment_size: u64,
}

/// Size of [`LocalIndexHeader`] on disk
pub const LOCAL_HEADER_SIZE: usize = 16;

/// Offset of the guarded entry block header
pub const ENTRY_BLOCK_OFFSET: usize = 0x20;

/// Offset of the first record
pub const ENTRIES_OFFSET: usize = 0x28;

impl LocalIndexHeader {
    /// The only layout this crate reads: 9-byte keys, 5-byte locations with
    /// 30 offset bits, 4-byte sizes
    pub fn standard(bucket: u8) -> Self {
        Self {
            version: 7,
            bucket,
            extra_bytes: 0,
            encoded_size_length: 4,
            storage_offset_length: 5,
            ekey_length: 9,
            file_offset_bits: 30,
            segment_size: 1 << 30,
        }
    }

    /// Size of one record
    pub fn record_size(&self) -> usize {
        self.ekey_length as usize
            + self.storage_offset_length as usize
            + self.encoded_size_length as usize
    }

    /// Whether the fields match [`LocalIndexHeader::standard`]
    pub fn is_standard(&self) -> bool {
        let expected = Self::standard(self.bucket);
        self.version == expected.version
            && self.encoded_size_length == expected.encoded_size_length
            && self.storage_offset_length == expected.storage_offset_length
            && self.ekey_length == expected.ekey_length
            && self.file_offset_bits == expected.file_offset_bits
    }
}
