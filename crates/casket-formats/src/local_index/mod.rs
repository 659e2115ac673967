//! Local installation index (`.idx`) documents
//!
//! ```text
//! 0x00 guarded block header (size, hash)
//! 0x08 header (16 bytes, little-endian)
//! 0x18 padding
//! 0x20 guarded block header of the entries
//! 0x28 records: key[9] archive_high u8 (archive_low:2 | offset:30) u32 BE size u32 LE
//! ```
//!
//! Keys are 9-byte prefixes of encoding keys. Documents are split into 16
//! buckets by [`bucket_for_key`].

mod builder;
mod header;
mod index;

pub use builder::LocalIndexBuilder;
pub use header::{
    ENTRIES_OFFSET, ENTRY_BLOCK_OFFSET, GuardedBlockHeader, LOCAL_HEADER_SIZE, LocalIndexHeader,
};
pub use index::{LocalIndex, LocalIndexRecord, bucket_for_key, index_file_name, parse_index_file_name};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::archive::IndexError;
    use casket_crypto::Key;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layout_and_round_trip() {
        let full = Key::from_hex("0123456789abcdef0123456789abcdef").unwrap();
        let data = LocalIndexBuilder::new(3)
            .add(&full, 0x1F5, 0x2345_6789 & 0x3FFF_FFFF, 512)
            .build()
            .unwrap();

        assert_eq!(data.len(), ENTRIES_OFFSET + 18);
        assert_eq!(&data[..4], &16u32.to_le_bytes());
        assert_eq!(&data[8..10], &7u16.to_le_bytes());

        let index = LocalIndex::parse(&data).unwrap();
        assert_eq!(index.header.bucket, 3);
        assert_eq!(index.len(), 1);
        let record = index.records[0];
        assert_eq!(record.key, full.truncate(9));
        assert_eq!(record.archive_id, 0x1F5);
        assert_eq!(record.offset, 0x2345_6789);
        assert_eq!(record.size, 512);
    }

    #[test]
    fn test_packed_location() {
        let key = Key::from_bytes(&[1; 9]).unwrap();
        let data = LocalIndexBuilder::new(0)
            .add(&key, 6, 0x100, 40)
            .build()
            .unwrap();
        let record = &data[ENTRIES_OFFSET..];
        // archive 6 = high 1, low 2
        assert_eq!(record[9], 1);
        assert_eq!(&record[10..14], &[0x80, 0, 0x01, 0]);
        assert_eq!(&record[14..18], &40u32.to_le_bytes());
    }

    #[test]
    fn test_padding_records_skipped() {
        let key = Key::from_bytes(&[7; 9]).unwrap();
        let mut data = LocalIndexBuilder::new(0)
            .add(&key, 0, 0, 30)
            .build()
            .unwrap();
        data.extend_from_slice(&[0; 18]);
        let size = (18u32 * 2).to_le_bytes();
        data[ENTRY_BLOCK_OFFSET..ENTRY_BLOCK_OFFSET + 4].copy_from_slice(&size);

        let index = LocalIndex::parse(&data).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_entry_block_past_end() {
        let key = Key::from_bytes(&[7; 9]).unwrap();
        let data = LocalIndexBuilder::new(0)
            .add(&key, 0, 0, 30)
            .build()
            .unwrap();
        assert!(matches!(
            LocalIndex::parse(&data[..data.len() - 1]),
            Err(IndexError::TooShort { .. })
        ));
        assert!(matches!(
            LocalIndex::parse(&data[..20]),
            Err(IndexError::TooShort { needed: 0x28, .. })
        ));
    }

    #[test]
    fn test_partial_record_rejected() {
        let key = Key::from_bytes(&[7; 9]).unwrap();
        let mut data = LocalIndexBuilder::new(0)
            .add(&key, 0, 0, 30)
            .build()
            .unwrap();
        data.extend_from_slice(&[1, 2, 3, 4, 5]);
        data[ENTRY_BLOCK_OFFSET..ENTRY_BLOCK_OFFSET + 4].copy_from_slice(&23u32.to_le_bytes());

        assert!(matches!(
            LocalIndex::parse(&data),
            Err(IndexError::PageLayout(_))
        ));
    }

    #[test]
    fn test_unsupported_layout() {
        let mut data = LocalIndexBuilder::new(0).build().unwrap();
        // ekey_length
        data[14] = 16;
        assert!(matches!(
            LocalIndex::parse(&data),
            Err(IndexError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_bucket_for_key() {
        assert_eq!(bucket_for_key(&[0; 9]), 0);
        // xor = 0x12, folded 0x2 ^ 0x1
        assert_eq!(bucket_for_key(&[0x12, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF]), 3);
        for byte in 0..=255u8 {
            assert!(bucket_for_key(&[byte; 9]) < 16);
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(index_file_name(0x0a, 0x2f), "0a0000002f.idx");
        assert_eq!(parse_index_file_name("0a0000002f.idx"), Some((0x0a, 0x2f)));
        assert_eq!(parse_index_file_name("0a0000002f.tmp"), None);
        assert_eq!(parse_index_file_name("0a00002f.idx"), None);
        assert_eq!(parse_index_file_name("zz0000002f.idx"), None);
    }
}
