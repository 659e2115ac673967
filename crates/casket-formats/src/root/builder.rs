//! Root table builder

use casket_crypto::Checksum;

use super::error::{Result, RootError};
use super::flags::{ContentFlags, LocaleFlags};
use super::header::{RootHeader, RootMagic, RootVersion};

/// One record handed to [`RootBuilder::add_block`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRecord {
    /// Numeric file id
    pub file_data_id: u32,
    /// Content checksum (16 bytes)
    pub content_checksum: Checksum,
    /// Name hash; written as zero when absent in a block that stores hashes
    pub name_hash: Option<u64>,
}

impl RootRecord {
    /// Record with a name hash
    pub fn named(file_data_id: u32, content_checksum: Checksum, name_hash: u64) -> Self {
        Self {
            file_data_id,
            content_checksum,
            name_hash: Some(name_hash),
        }
    }

    /// Record without a name hash
    pub fn unnamed(file_data_id: u32, content_checksum: Checksum) -> Self {
        Self {
            file_data_id,
            content_checksum,
            name_hash: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Block {
    locale: LocaleFlags,
    content: ContentFlags,
    records: Vec<RootRecord>,
}

/// Builds root tables in any of the supported layouts
///
/// Records in a block are sorted by file id before the ids are
/// delta-encoded. Blocks keep insertion order.
#[derive(Debug, Clone)]
pub struct RootBuilder {
    version: RootVersion,
    magic: RootMagic,
    extended: bool,
    blocks: Vec<Block>,
}

impl RootBuilder {
    /// Builder for `version`; V3 and V4 always use the extended header
    pub fn new(version: RootVersion) -> Self {
        Self {
            version,
            magic: RootMagic::Mfst,
            extended: matches!(version, RootVersion::V3 | RootVersion::V4),
            blocks: Vec::new(),
        }
    }

    /// Use a different manifest magic
    #[must_use]
    pub fn magic(mut self, magic: RootMagic) -> Self {
        self.magic = magic;
        self
    }

    /// Write a V2 table with the 24-byte extended header
    #[must_use]
    pub fn extended_header(mut self) -> Self {
        if self.version != RootVersion::V1 {
            self.extended = true;
        }
        self
    }

    /// Append a block
    #[must_use]
    pub fn add_block(
        mut self,
        locale: LocaleFlags,
        content: ContentFlags,
        records: Vec<RootRecord>,
    ) -> Self {
        self.blocks.push(Block {
            locale,
            content,
            records,
        });
        self
    }

    /// Serialize the table
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        let mut total = 0u32;
        let mut named = 0u32;

        for block in &self.blocks {
            let mut records = block.records.clone();
            records.sort_by_key(|r| r.file_data_id);

            if let Some(r) = records.iter().find(|r| r.content_checksum.len() != 16) {
                return Err(RootError::InvalidBlock(format!(
                    "file {} has a {}-byte checksum",
                    r.file_data_id,
                    r.content_checksum.len()
                )));
            }

            let with_names = self.version == RootVersion::V1 || block.content.has_name_hashes();
            total += records.len() as u32;
            if with_names {
                named += records.len() as u32;
            }

            self.write_block_header(&mut body, block, records.len() as u32);

            let mut previous: Option<u32> = None;
            for record in &records {
                let delta = match previous {
                    None => record.file_data_id,
                    Some(p) => record
                        .file_data_id
                        .checked_sub(p)
                        .and_then(|d| d.checked_sub(1))
                        .ok_or_else(|| {
                            RootError::InvalidBlock(format!(
                                "file {} appears twice in one block",
                                record.file_data_id
                            ))
                        })?,
                };
                body.extend_from_slice(&delta.to_le_bytes());
                previous = Some(record.file_data_id);
            }

            if self.version == RootVersion::V1 {
                for record in &records {
                    body.extend_from_slice(record.content_checksum.as_bytes());
                    body.extend_from_slice(&record.name_hash.unwrap_or(0).to_le_bytes());
                }
                continue;
            }

            for record in &records {
                body.extend_from_slice(record.content_checksum.as_bytes());
            }
            if with_names {
                for record in &records {
                    body.extend_from_slice(&record.name_hash.unwrap_or(0).to_le_bytes());
                }
            }
        }

        if self.version == RootVersion::V1 {
            return Ok(body);
        }

        let header = RootHeader {
            magic: self.magic,
            version: self.version,
            extended: self.extended,
            total_files: total,
            named_files: named,
        };
        let mut out = header.to_bytes();
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn write_block_header(&self, out: &mut Vec<u8>, block: &Block, count: u32) {
        out.extend_from_slice(&count.to_le_bytes());
        let content_low = (block.content.0 & 0xFFFF_FFFF) as u32;
        match self.version {
            RootVersion::V1 => {
                out.extend_from_slice(&content_low.to_le_bytes());
                out.extend_from_slice(&block.locale.0.to_le_bytes());
            }
            RootVersion::V2 | RootVersion::V3 => {
                out.extend_from_slice(&block.locale.0.to_le_bytes());
                out.extend_from_slice(&content_low.to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes());
                out.push(0);
            }
            RootVersion::V4 => {
                out.extend_from_slice(&block.locale.0.to_le_bytes());
                out.extend_from_slice(&content_low.to_le_bytes());
                out.push((block.content.0 >> 32) as u8);
                out.extend_from_slice(&0u32.to_le_bytes());
                out.push(0);
            }
        }
    }
}
