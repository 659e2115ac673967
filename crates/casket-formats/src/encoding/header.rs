//! Encoding table header

use binrw::{BinRead, BinWrite};

use super::error::EncodingError;

/// Size of the on-disk header
pub const ENCODING_HEADER_SIZE: usize = 22;

/// Size of one page index record (first key + MD5)
pub const PAGE_INDEX_ENTRY_SIZE: usize = 32;

/// Encoding table header (22 bytes, big-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct EncodingHeader {
    /// Magic bytes: 'EN'
    pub magic: [u8; 2],
    /// Version, always 1
    pub version: u8,
    /// Size of content keys
    pub ckey_hash_size: u8,
    /// Size of encoding keys
    pub ekey_hash_size: u8,
    /// Content key page size in KiB
    pub ckey_page_size_kb: u16,
    /// Encoding key page size in KiB
    pub ekey_page_size_kb: u16,
    /// Number of content key pages
    pub ckey_page_count: u32,
    /// Number of encoding key pages
    pub ekey_page_count: u32,
    /// Unused flags byte
    pub flags: u8,
    /// Size of the `ESpec` string block following the header
    pub espec_block_size: u32,
}

impl EncodingHeader {
    /// Header with the usual 16-byte keys and 4 KiB pages
    pub fn new() -> Self {
        Self {
            magic: *b"EN",
            version: 1,
            ckey_hash_size: 16,
            ekey_hash_size: 16,
            ckey_page_size_kb: 4,
            ekey_page_size_kb: 4,
            ckey_page_count: 0,
            ekey_page_count: 0,
            flags: 0,
            espec_block_size: 0,
        }
    }

    /// Check the fields the content key lookup depends on
    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.magic != *b"EN" {
            return Err(EncodingError::InvalidMagic(self.magic));
        }
        if self.version != 1 {
            return Err(EncodingError::UnsupportedVersion(self.version));
        }
        for (field, value) in [
            ("ckey", self.ckey_hash_size),
            ("ekey", self.ekey_hash_size),
        ] {
            if value == 0 || value > 16 {
                return Err(EncodingError::InvalidHashSize { field, value });
            }
        }
        if self.ckey_page_size_kb == 0 {
            return Err(EncodingError::InvalidPageSize { field: "ckey" });
        }
        Ok(())
    }

    /// Content key page size in bytes
    pub fn ckey_page_size(&self) -> usize {
        self.ckey_page_size_kb as usize * 1024
    }

    /// Encoding key page size in bytes
    pub fn ekey_page_size(&self) -> usize {
        self.ekey_page_size_kb as usize * 1024
    }

    /// Offset of the content key page index
    pub fn ckey_index_offset(&self) -> u64 {
        ENCODING_HEADER_SIZE as u64 + u64::from(self.espec_block_size)
    }

    /// Offset one past the last content key page
    pub fn ckey_pages_end(&self) -> u64 {
        let count = u64::from(self.ckey_page_count);
        self.ckey_index_offset()
            + count * PAGE_INDEX_ENTRY_SIZE as u64
            + count * self.ckey_page_size() as u64
    }
}

impl Default for EncodingHeader {
    fn default() -> Self {
        Self::new()
    }
}
