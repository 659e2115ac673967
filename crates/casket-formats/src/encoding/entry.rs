//! Content key entries

use std::hash::{Hash, Hasher};

use casket_crypto::{Checksum, Key};

use super::error::EncodingError;

/// One content key and the encoding keys of its blocks
///
/// Two entries are equal when their content checksum and key list match.
/// The file size is informational and does not take part in equality.
#[derive(Debug, Clone)]
pub struct EncodingEntry {
    /// Checksum of the logical file content
    pub content_checksum: Checksum,
    /// Decompressed size of the file (40-bit on disk)
    pub file_size: u64,
    /// Encoding keys, one per stored block, in content order
    pub file_keys: Vec<Key>,
}

impl EncodingEntry {
    /// Create an entry; every content key is stored in at least one block
    pub fn new(
        content_checksum: Checksum,
        file_size: u64,
        file_keys: Vec<Key>,
    ) -> Result<Self, EncodingError> {
        if file_keys.is_empty() {
            return Err(EncodingError::EmptyEntry(content_checksum.to_hex()));
        }
        Ok(Self {
            content_checksum,
            file_size,
            file_keys,
        })
    }

    /// Number of stored blocks
    pub fn block_count(&self) -> usize {
        self.file_keys.len()
    }

    /// Whether the content is split over more than one block
    pub fn is_multi_block(&self) -> bool {
        self.file_keys.len() > 1
    }

    /// Key of the first block
    pub fn first_key(&self) -> Option<&Key> {
        self.file_keys.first()
    }

    /// Serialized size of this entry for the given key sizes
    pub fn encoded_len(&self, ckey_size: usize, ekey_size: usize) -> usize {
        1 + 5 + ckey_size + self.file_keys.len() * ekey_size
    }
}

impl PartialEq for EncodingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.content_checksum == other.content_checksum && self.file_keys == other.file_keys
    }
}

impl Eq for EncodingEntry {}

impl Hash for EncodingEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content_checksum.hash(state);
        self.file_keys.hash(state);
    }
}
