//! Local `.idx` builder

use std::io::Cursor;

use binrw::BinWrite;
use casket_crypto::{Key, hashlittle};

use super::header::{GuardedBlockHeader, LocalIndexHeader};
use super::index::LocalIndexRecord;
use crate::archive::IndexError;

/// Builds version 7 local index documents
#[derive(Debug, Clone)]
pub struct LocalIndexBuilder {
    bucket: u8,
    records: Vec<LocalIndexRecord>,
}

impl LocalIndexBuilder {
    /// Builder for one bucket
    pub fn new(bucket: u8) -> Self {
        Self {
            bucket,
            records: Vec::new(),
        }
    }

    /// Add a record; keys longer than 9 bytes are truncated
    #[must_use]
    pub fn add(mut self, key: &Key, archive_id: u16, offset: u32, size: u32) -> Self {
        self.records.push(LocalIndexRecord {
            key: key.truncate(9),
            archive_id,
            offset,
            size,
        });
        self
    }

    /// Serialize the document
    pub fn build(&self) -> Result<Vec<u8>, IndexError> {
        let header = LocalIndexHeader::standard(self.bucket);

        let mut header_bytes = Cursor::new(Vec::new());
        header.write(&mut header_bytes)?;
        let header_bytes = header_bytes.into_inner();

        let mut records = self.records.clone();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        let mut entries = Vec::with_capacity(records.len() * header.record_size());
        for record in &records {
            if record.key.len() != 9 || record.archive_id > 0x3FF || record.offset > 0x3FFF_FFFF {
                return Err(IndexError::InvalidHeader(format!(
                    "record {} does not fit the 9/5/4 layout",
                    record.key
                )));
            }
            entries.extend_from_slice(record.key.as_bytes());
            entries.push((record.archive_id >> 2) as u8);
            let packed = (u32::from(record.archive_id & 0x3) << 30) | record.offset;
            entries.extend_from_slice(&packed.to_be_bytes());
            entries.extend_from_slice(&record.size.to_le_bytes());
        }

        let mut out = Cursor::new(Vec::new());
        GuardedBlockHeader {
            block_size: header_bytes.len() as u32,
            block_hash: hashlittle(&header_bytes, 0),
        }
        .write(&mut out)?;
        let mut out = out.into_inner();
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(&[0; 8]);

        let mut block = Cursor::new(Vec::new());
        GuardedBlockHeader {
            block_size: entries.len() as u32,
            block_hash: hashlittle(&entries, 0),
        }
        .write(&mut block)?;
        out.extend_from_slice(&block.into_inner());
        out.extend_from_slice(&entries);
        Ok(out)
    }
}
