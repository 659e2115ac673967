//! Encoding table builder

use std::io::{Cursor, Write};

use binrw::BinWrite;
use casket_crypto::{Checksum, Key, md5_digest};

use super::entry::EncodingEntry;
use super::error::EncodingError;
use super::header::EncodingHeader;
use super::table::PageInfo;

/// Size of an encoding key page record: ekey, espec index u32, size u40
const EKEY_RECORD_FIXED: usize = 4 + 5;

/// Builds encoding tables with 16-byte keys
///
/// Entries are written sorted by content key, packed into pages of
/// `page_size_kb` KiB. The matching encoding key pages are written too so
/// the output has the same shape as a real table.
#[derive(Debug, Clone)]
pub struct EncodingBuilder {
    page_size_kb: u16,
    especs: Vec<String>,
    entries: Vec<EncodingEntry>,
}

impl Default for EncodingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingBuilder {
    /// Builder with 4 KiB pages and a single `n` espec
    pub fn new() -> Self {
        Self {
            page_size_kb: 4,
            especs: vec!["n".to_string()],
            entries: Vec::new(),
        }
    }

    /// Set the page size for both page kinds
    #[must_use]
    pub fn page_size_kb(mut self, kb: u16) -> Self {
        self.page_size_kb = kb.max(1);
        self
    }

    /// Add a content key with its block keys
    #[must_use]
    pub fn add_entry(mut self, content_checksum: Checksum, file_size: u64, file_keys: Vec<Key>) -> Self {
        self.entries.push(EncodingEntry {
            content_checksum,
            file_size,
            file_keys,
        });
        self
    }

    /// Serialize the table
    pub fn build(&self) -> Result<Vec<u8>, EncodingError> {
        let page_size = self.page_size_kb as usize * 1024;
        if let Some(empty) = self.entries.iter().find(|e| e.file_keys.is_empty()) {
            return Err(EncodingError::EmptyEntry(empty.content_checksum.to_hex()));
        }

        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.content_checksum.cmp(&b.content_checksum));

        let ckey_pages = pack_pages(
            sorted.iter().map(|e| (e.content_checksum, encode_ckey_entry(e))),
            page_size,
        );

        let mut ekeys: Vec<(Key, u64)> = sorted
            .iter()
            .flat_map(|e| e.file_keys.iter().map(move |k| (*k, e.file_size)))
            .collect();
        ekeys.sort_by(|a, b| a.0.cmp(&b.0));
        let ekey_pages = pack_pages(
            ekeys.iter().map(|(k, size)| (*k, encode_ekey_entry(k, *size))),
            page_size,
        );

        let espec_block: Vec<u8> = self
            .especs
            .iter()
            .flat_map(|s| s.bytes().chain(std::iter::once(0)))
            .collect();

        let header = EncodingHeader {
            ckey_page_size_kb: self.page_size_kb,
            ekey_page_size_kb: self.page_size_kb,
            ckey_page_count: ckey_pages.len() as u32,
            ekey_page_count: ekey_pages.len() as u32,
            espec_block_size: espec_block.len() as u32,
            ..EncodingHeader::new()
        };

        let mut out = Cursor::new(Vec::new());
        header.write(&mut out)?;
        out.write_all(&espec_block)
            .map_err(binrw::Error::Io)?;
        for pages in [&ckey_pages, &ekey_pages] {
            for (first_key, page) in pages.iter() {
                PageInfo {
                    first_key: *first_key,
                    checksum: md5_digest(page),
                }
                .write_be(&mut out)?;
            }
            for (_, page) in pages.iter() {
                out.write_all(page).map_err(binrw::Error::Io)?;
            }
        }

        Ok(out.into_inner())
    }
}

fn encode_ckey_entry(entry: &EncodingEntry) -> Vec<u8> {
    let mut record = Vec::with_capacity(entry.encoded_len(16, 16));
    record.push(entry.file_keys.len() as u8);
    record.extend_from_slice(&size_40(entry.file_size));
    record.extend_from_slice(entry.content_checksum.as_bytes());
    for key in &entry.file_keys {
        record.extend_from_slice(key.as_bytes());
    }
    record
}

fn encode_ekey_entry(key: &Key, file_size: u64) -> Vec<u8> {
    let mut record = Vec::with_capacity(key.len() + EKEY_RECORD_FIXED);
    record.extend_from_slice(key.as_bytes());
    record.extend_from_slice(&0u32.to_be_bytes());
    record.extend_from_slice(&size_40(file_size));
    record
}

fn size_40(size: u64) -> [u8; 5] {
    let bytes = size.to_be_bytes();
    [bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
}

/// Pack records into zero-padded pages, keyed by the first record's key
fn pack_pages(
    records: impl Iterator<Item = (Key, Vec<u8>)>,
    page_size: usize,
) -> Vec<([u8; 16], Vec<u8>)> {
    let mut pages: Vec<([u8; 16], Vec<u8>)> = Vec::new();

    for (key, record) in records {
        let fits = pages
            .last()
            .is_some_and(|(_, page)| page.len() + record.len() <= page_size);
        if !fits {
            let mut first_key = [0u8; 16];
            first_key[..key.len()].copy_from_slice(key.as_bytes());
            pages.push((first_key, Vec::with_capacity(page_size)));
        }
        if let Some((_, page)) = pages.last_mut() {
            page.extend_from_slice(&record);
        }
    }

    // A table always carries at least one page of each kind
    if pages.is_empty() {
        pages.push(([0u8; 16], Vec::new()));
    }
    for (_, page) in &mut pages {
        page.resize(page_size, 0);
    }
    pages
}
