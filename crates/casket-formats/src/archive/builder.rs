//! CDN archive index builder

use casket_crypto::{Key, md5_digest};

use super::error::IndexError;
use super::footer::IndexFooter;

/// Builds CDN `.index` documents
///
/// Records are sorted by key and packed into zero-padded pages; the TOC
/// holds the last key of each page followed by the page hashes.
#[derive(Debug, Clone)]
pub struct ArchiveIndexBuilder {
    footer: IndexFooter,
    records: Vec<(Key, u32, u64)>,
}

impl Default for ArchiveIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveIndexBuilder {
    /// Builder with 4 KiB pages, 16-byte keys and 4-byte offsets
    pub fn new() -> Self {
        Self {
            footer: IndexFooter::new(0),
            records: Vec::new(),
        }
    }

    /// Use 5-byte offsets
    #[must_use]
    pub fn wide_offsets(mut self) -> Self {
        self.footer.offset_bytes = 5;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size_kb(mut self, kb: u8) -> Self {
        self.footer.page_size_kb = kb.max(1);
        self
    }

    /// Add a record for a block of `size` bytes at `offset`
    #[must_use]
    pub fn add(mut self, key: Key, size: u32, offset: u64) -> Self {
        self.records.push((key, size, offset));
        self
    }

    /// Serialize the document
    pub fn build(&self) -> Result<Vec<u8>, IndexError> {
        let key_len = self.footer.ekey_length as usize;
        if let Some((key, _, _)) = self.records.iter().find(|(k, _, _)| k.len() != key_len) {
            return Err(IndexError::InvalidFooter(format!(
                "key {key} is not {key_len} bytes"
            )));
        }

        let mut records = self.records.clone();
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let page_size = self.footer.page_size();
        let per_page = page_size / self.footer.record_size();
        let offset_bytes = self.footer.offset_bytes as usize;

        let mut pages = Vec::new();
        let mut last_keys = Vec::new();
        for chunk in records.chunks(per_page.max(1)) {
            let mut page = Vec::with_capacity(page_size);
            for (key, size, offset) in chunk {
                page.extend_from_slice(key.as_bytes());
                page.extend_from_slice(&size.to_be_bytes());
                page.extend_from_slice(&offset.to_be_bytes()[8 - offset_bytes..]);
            }
            page.resize(page_size, 0);
            pages.push(page);
            if let Some((key, _, _)) = chunk.last() {
                last_keys.push(*key);
            }
        }

        let hash_len = self.footer.footer_hash_bytes as usize;
        let mut toc = Vec::new();
        for key in &last_keys {
            toc.extend_from_slice(key.as_bytes());
        }
        for page in &pages {
            toc.extend_from_slice(&md5_digest(page)[..hash_len]);
        }

        let mut footer = self.footer.clone();
        footer.element_count = records.len() as u32;
        footer.toc_hash.copy_from_slice(&md5_digest(&toc)[..8]);
        footer.footer_hash = footer.compute_footer_hash();

        let mut out = pages.concat();
        out.extend_from_slice(&toc);
        out.extend_from_slice(&footer.to_bytes());
        Ok(out)
    }
}
