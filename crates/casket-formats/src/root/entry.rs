//! Root table entries

use casket_crypto::Checksum;

use super::flags::{ContentFlags, LocaleFlags};

/// One file record of a root block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    /// Hash of the normalized file name; absent in blocks flagged `NO_NAME_HASH`
    pub name_hash: Option<u64>,
    /// Checksum of the file content
    pub content_checksum: Checksum,
    /// Content flags in the upper 32 bits, locale flags in the lower 32
    pub flags: u64,
    /// Numeric file id
    pub file_data_id: u32,
}

impl RootEntry {
    /// Pack block flags the way entries store them
    pub fn pack_flags(content: ContentFlags, locale: LocaleFlags) -> u64 {
        ((content.0 & 0xFFFF_FFFF) << 32) | u64::from(locale.0)
    }

    /// Locale half of `flags`
    pub fn locale_flags(&self) -> LocaleFlags {
        LocaleFlags((self.flags & 0xFFFF_FFFF) as u32)
    }

    /// Content half of `flags`
    pub fn content_flags(&self) -> ContentFlags {
        ContentFlags(self.flags >> 32)
    }
}
