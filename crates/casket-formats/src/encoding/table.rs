//! Encoding table parsing and lookup

use std::collections::HashMap;
use std::io::Cursor;

use binrw::{BinRead, BinReaderExt, BinWrite};
use casket_crypto::{Checksum, Key, md5_digest};
use tracing::debug;

use super::entry::EncodingEntry;
use super::error::EncodingError;
use super::header::{ENCODING_HEADER_SIZE, EncodingHeader, PAGE_INDEX_ENTRY_SIZE};

/// Page index record: first key of the page and MD5 of the page bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
pub struct PageInfo {
    /// First content key stored in the page (zero padded to 16 bytes)
    pub first_key: [u8; 16],
    /// MD5 of the page bytes
    pub checksum: [u8; 16],
}

/// Content checksum to encoding key table
#[derive(Debug, Clone)]
pub struct EncodingTable {
    header: EncodingHeader,
    entries: HashMap<Checksum, EncodingEntry>,
}

impl EncodingTable {
    /// Parse a decoded (BLTE-stripped) encoding table
    ///
    /// Every content key page is checksummed before its entries are read.
    /// Encoding key pages are not read.
    pub fn parse(data: &[u8]) -> Result<Self, EncodingError> {
        require(data, ENCODING_HEADER_SIZE as u64, "header")?;
        let header: EncodingHeader = Cursor::new(data).read_be()?;
        header.validate()?;
        require(data, header.ckey_pages_end(), "content key pages")?;

        let ckey_size = header.ckey_hash_size as usize;
        let ekey_size = header.ekey_hash_size as usize;
        let page_size = header.ckey_page_size();
        let page_count = header.ckey_page_count as usize;

        let index_offset = header.ckey_index_offset() as usize;
        let mut cursor = Cursor::new(&data[index_offset..]);
        let mut index = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            index.push(PageInfo::read_be(&mut cursor)?);
        }

        let pages_offset = index_offset + page_count * PAGE_INDEX_ENTRY_SIZE;
        let mut entries = HashMap::new();
        let mut duplicates = 0usize;

        for (page_number, info) in index.iter().enumerate() {
            let start = pages_offset + page_number * page_size;
            let page = &data[start..start + page_size];

            let actual = md5_digest(page);
            if actual != info.checksum {
                return Err(EncodingError::PageChecksumMismatch {
                    page: page_number,
                    expected: hex::encode(info.checksum),
                    actual: hex::encode(actual),
                });
            }

            for entry in parse_page(page_number, page, ckey_size, ekey_size)? {
                // First occurrence wins
                if entries.contains_key(&entry.content_checksum) {
                    duplicates += 1;
                    continue;
                }
                entries.insert(entry.content_checksum, entry);
            }
        }

        debug!(
            pages = page_count,
            entries = entries.len(),
            duplicates,
            "parsed encoding table"
        );

        Ok(Self { header, entries })
    }

    /// Entry for a content checksum
    pub fn lookup(&self, checksum: &Checksum) -> Option<&EncodingEntry> {
        self.entries.get(checksum)
    }

    /// Number of content keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed header
    pub fn header(&self) -> &EncodingHeader {
        &self.header
    }

    /// Iterate over all entries in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &EncodingEntry> {
        self.entries.values()
    }
}

fn require(data: &[u8], needed: u64, section: &'static str) -> Result<(), EncodingError> {
    let available = data.len() as u64;
    if available < needed {
        return Err(EncodingError::Truncated {
            section,
            needed,
            available,
        });
    }
    Ok(())
}

/// Read entries until a zero key count or the page end
fn parse_page(
    page_number: usize,
    page: &[u8],
    ckey_size: usize,
    ekey_size: usize,
) -> Result<Vec<EncodingEntry>, EncodingError> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos < page.len() {
        let key_count = page[pos] as usize;
        if key_count == 0 {
            break;
        }

        let len = 1 + 5 + ckey_size + key_count * ekey_size;
        let Some(record) = page.get(pos..pos + len) else {
            return Err(EncodingError::TruncatedEntry {
                page: page_number,
                offset: pos,
            });
        };

        let file_size = (u64::from(record[1]) << 32)
            | u64::from(u32::from_be_bytes([record[2], record[3], record[4], record[5]]));
        let content_checksum = Key::from_bytes(&record[6..6 + ckey_size])?;
        let file_keys = record[6 + ckey_size..]
            .chunks_exact(ekey_size)
            .map(Key::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        entries.push(EncodingEntry::new(content_checksum, file_size, file_keys)?);
        pos += len;
    }

    Ok(entries)
}
