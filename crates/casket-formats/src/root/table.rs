//! Root table parsing and lookup

use std::collections::HashMap;

use casket_crypto::{Checksum, Key};
use tracing::debug;

use super::entry::RootEntry;
use super::error::{Result, RootError};
use super::flags::{ContentFlags, LocaleFlags};
use super::header::{RootHeader, RootVersion};

/// Name hash and file id to content checksum table
///
/// Entries keep file order. Lookups return the first entry whose locale
/// mask intersects the requested mask; there is no fallback to other
/// locales.
#[derive(Debug, Clone)]
pub struct RootTable {
    version: RootVersion,
    header: Option<RootHeader>,
    entries: Vec<RootEntry>,
    by_name: HashMap<u64, Vec<usize>>,
    by_file_data_id: HashMap<u32, Vec<usize>>,
}

/// Block header fields common to every layout
struct BlockHeader {
    count: usize,
    content: ContentFlags,
    locale: LocaleFlags,
}

impl RootTable {
    /// Parse a decoded (BLTE-stripped) root table
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = RootHeader::detect(data)?;
        let (version, mut pos) = header
            .as_ref()
            .map_or((RootVersion::V1, 0), |h| (h.version, h.size()));

        let mut entries = Vec::new();
        let mut block = 0usize;

        while pos < data.len() {
            let block_start = pos;
            let header_size = version.block_header_size();
            let raw_header = take(data, &mut pos, header_size as u64, block, block_start)?;
            let BlockHeader {
                count,
                content,
                locale,
            } = read_block_header(version, raw_header);

            let named = version == RootVersion::V1 || content.has_name_hashes();
            let record_size = 4 + 16 + if named { 8 } else { 0 };
            let body = take(
                data,
                &mut pos,
                count as u64 * record_size,
                block,
                block_start,
            )?;

            let flags = RootEntry::pack_flags(content, locale);
            let (deltas, rest) = body.split_at(count * 4);
            let ids = file_data_ids(deltas);

            match version {
                RootVersion::V1 => {
                    for (id, record) in ids.zip(rest.chunks_exact(24)) {
                        entries.push(RootEntry {
                            name_hash: Some(le_u64(&record[16..24])),
                            content_checksum: checksum(&record[..16]),
                            flags,
                            file_data_id: id,
                        });
                    }
                }
                RootVersion::V2 | RootVersion::V3 | RootVersion::V4 => {
                    let (ckeys, hashes) = rest.split_at(count * 16);
                    let mut hashes = hashes.chunks_exact(8);
                    for (id, ckey) in ids.zip(ckeys.chunks_exact(16)) {
                        entries.push(RootEntry {
                            name_hash: if named { hashes.next().map(le_u64) } else { None },
                            content_checksum: checksum(ckey),
                            flags,
                            file_data_id: id,
                        });
                    }
                }
            }

            block += 1;
        }

        let mut by_name: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut by_file_data_id: HashMap<u32, Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(hash) = entry.name_hash {
                by_name.entry(hash).or_default().push(i);
            }
            by_file_data_id
                .entry(entry.file_data_id)
                .or_default()
                .push(i);
        }

        debug!(
            ?version,
            blocks = block,
            entries = entries.len(),
            names = by_name.len(),
            "parsed root table"
        );

        Ok(Self {
            version,
            header,
            entries,
            by_name,
            by_file_data_id,
        })
    }

    /// Content checksum for a name hash in the requested locales
    pub fn lookup(&self, name_hash: u64, locale: LocaleFlags) -> Option<Checksum> {
        self.first_matching(self.by_name.get(&name_hash)?, locale)
    }

    /// Content checksum for a file id in the requested locales
    pub fn lookup_by_file_data_id(&self, file_data_id: u32, locale: LocaleFlags) -> Option<Checksum> {
        self.first_matching(self.by_file_data_id.get(&file_data_id)?, locale)
    }

    /// Whether any entry carries this name hash, regardless of locale
    pub fn contains(&self, name_hash: u64) -> bool {
        self.by_name.contains_key(&name_hash)
    }

    /// All entries with this name hash, in file order
    pub fn entries(&self, name_hash: u64) -> impl Iterator<Item = &RootEntry> {
        self.by_name
            .get(&name_hash)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// Every entry in file order
    pub fn iter(&self) -> impl Iterator<Item = &RootEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Block layout of the parsed table
    pub fn version(&self) -> RootVersion {
        self.version
    }

    /// Manifest header, absent for headerless tables
    pub fn header(&self) -> Option<&RootHeader> {
        self.header.as_ref()
    }

    fn first_matching(&self, positions: &[usize], locale: LocaleFlags) -> Option<Checksum> {
        positions
            .iter()
            .map(|&i| &self.entries[i])
            .find(|e| e.locale_flags().intersects(locale))
            .map(|e| e.content_checksum)
    }
}

fn take<'a>(
    data: &'a [u8],
    pos: &mut usize,
    needed: u64,
    block: usize,
    offset: usize,
) -> Result<&'a [u8]> {
    let available = (data.len() - *pos) as u64;
    if needed > available {
        return Err(RootError::Truncated {
            block,
            offset,
            needed,
            available,
        });
    }
    let start = *pos;
    *pos += needed as usize;
    Ok(&data[start..*pos])
}

fn read_block_header(version: RootVersion, raw: &[u8]) -> BlockHeader {
    let count = le_u32(&raw[0..4]) as usize;
    match version {
        RootVersion::V1 => BlockHeader {
            count,
            content: ContentFlags::new(u64::from(le_u32(&raw[4..8]))),
            locale: LocaleFlags::new(le_u32(&raw[8..12])),
        },
        RootVersion::V2 | RootVersion::V3 => BlockHeader {
            count,
            locale: LocaleFlags::new(le_u32(&raw[4..8])),
            content: ContentFlags::new(u64::from(le_u32(&raw[8..12]))),
        },
        RootVersion::V4 => BlockHeader {
            count,
            locale: LocaleFlags::new(le_u32(&raw[4..8])),
            content: ContentFlags::new(u64::from(le_u32(&raw[8..12])) | (u64::from(raw[12]) << 32)),
        },
    }
}

/// Delta-decode file ids: each id is the previous id plus one plus its delta
fn file_data_ids(deltas: &[u8]) -> impl Iterator<Item = u32> + '_ {
    let mut next = 0u32;
    deltas.chunks_exact(4).map(move |d| {
        let id = next.wrapping_add(le_u32(d));
        next = id.wrapping_add(1);
        id
    })
}

fn checksum(bytes: &[u8]) -> Checksum {
    let mut digest = [0u8; 16];
    digest.copy_from_slice(bytes);
    Key::from_md5(digest)
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(raw)
}
