//! CDN archive index documents

use casket_crypto::Key;
use tracing::debug;

use super::error::IndexError;
use super::footer::IndexFooter;

/// One record of a CDN archive index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIndexRecord {
    /// Encoding key
    pub key: Key,
    /// Size of the stored block
    pub size: u32,
    /// Offset of the block inside the archive
    pub offset: u64,
}

/// Parsed `.index` document of one CDN archive
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    /// Document footer
    pub footer: IndexFooter,
    /// Records in page order, padding removed
    pub records: Vec<ArchiveIndexRecord>,
}

impl ArchiveIndex {
    /// Parse a complete `.index` document
    ///
    /// The page count follows from the document length: each page
    /// contributes its bytes plus one TOC key and one page hash.
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        let footer = IndexFooter::read(data)?;
        let body = data.len() - footer.size();
        let per_page = footer.bytes_per_page();
        if body % per_page != 0 {
            return Err(IndexError::PageLayout(format!(
                "{body} bytes before the footer is not a multiple of {per_page}"
            )));
        }

        let page_count = body / per_page;
        let page_size = footer.page_size();
        let record_size = footer.record_size();
        let key_len = footer.ekey_length as usize;
        let capacity = page_count * (page_size / record_size);
        if footer.element_count as usize > capacity {
            return Err(IndexError::PageLayout(format!(
                "{} records declared, {page_count} pages hold at most {capacity}",
                footer.element_count
            )));
        }

        let mut records = Vec::with_capacity(footer.element_count as usize);
        for page in data[..page_count * page_size].chunks_exact(page_size) {
            for raw in page.chunks_exact(record_size) {
                let (key, rest) = raw.split_at(key_len);
                // Pages are zero padded after their last record
                if key.iter().all(|&b| b == 0) {
                    break;
                }
                let (size, offset) = rest.split_at(footer.size_bytes as usize);
                records.push(ArchiveIndexRecord {
                    key: Key::from_bytes(key)?,
                    size: u32::from_be_bytes([size[0], size[1], size[2], size[3]]),
                    offset: be_uint(offset),
                });
            }
        }

        debug!(
            pages = page_count,
            records = records.len(),
            declared = footer.element_count,
            "parsed archive index"
        );

        Ok(Self { footer, records })
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

fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
