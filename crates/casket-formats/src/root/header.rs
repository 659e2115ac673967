//! Root manifest header detection

use super::error::{Result, RootError};

/// Block layout generation of a root table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootVersion {
    /// Headerless table, 12-byte block headers, interleaved records
    V1,
    /// `MFST` header, 17-byte block headers, separated arrays
    V2,
    /// Extended `MFST` header with version 3, same blocks as V2
    V3,
    /// Extended `MFST` header with version 4, 40-bit content flags
    V4,
}

impl RootVersion {
    /// Size of a block header
    pub const fn block_header_size(self) -> usize {
        match self {
            Self::V1 => 12,
            Self::V2 | Self::V3 => 17,
            Self::V4 => 18,
        }
    }
}

/// Manifest magic; the byte order of the header fields follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMagic {
    /// `MFST`, big-endian header fields
    Mfst,
    /// `TSFM`, little-endian header fields
    Tsfm,
}

impl RootMagic {
    /// Magic bytes as stored
    pub const fn to_bytes(self) -> [u8; 4] {
        match self {
            Self::Mfst => *b"MFST",
            Self::Tsfm => *b"TSFM",
        }
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"MFST" => Some(Self::Mfst),
            b"TSFM" => Some(Self::Tsfm),
            _ => None,
        }
    }

    /// Encode a header field in this magic's byte order
    pub const fn encode(self, value: u32) -> [u8; 4] {
        match self {
            Self::Mfst => value.to_be_bytes(),
            Self::Tsfm => value.to_le_bytes(),
        }
    }

    fn decode(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            Self::Mfst => u32::from_be_bytes(raw),
            Self::Tsfm => u32::from_le_bytes(raw),
        }
    }
}

/// Manifest header of a V2+ root table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootHeader {
    /// Magic and byte order
    pub magic: RootMagic,
    /// Block layout the header selects
    pub version: RootVersion,
    /// Whether the 24-byte extended form was used
    pub extended: bool,
    /// Total number of records
    pub total_files: u32,
    /// Number of records with a name hash
    pub named_files: u32,
}

/// Size of the classic `magic, total, named` header
pub const CLASSIC_HEADER_SIZE: usize = 12;

/// Size of the extended `magic, size, version, total, named, padding` header
pub const EXTENDED_HEADER_SIZE: usize = 24;

impl RootHeader {
    /// Detect and read the manifest header; `None` for a headerless table
    ///
    /// The classic and extended forms share their first 12 bytes. A small
    /// second field (16..100) followed by a version below 10 selects the
    /// extended form; anything else is a classic `total, named` pair.
    pub fn detect(data: &[u8]) -> Result<Option<Self>> {
        let Some(magic) = data.get(..4).and_then(RootMagic::from_bytes) else {
            return Ok(None);
        };

        if data.len() < CLASSIC_HEADER_SIZE {
            return Err(RootError::InvalidHeader(format!(
                "{} bytes after magic, need 8",
                data.len() - 4
            )));
        }

        let value1 = magic.decode(&data[4..8]);
        let value2 = magic.decode(&data[8..12]);

        let extended = (16..100).contains(&value1) && value2 < 10 && value2 < value1;
        if !extended {
            return Ok(Some(Self {
                magic,
                version: RootVersion::V2,
                extended: false,
                total_files: value1,
                named_files: value2,
            }));
        }

        if data.len() < EXTENDED_HEADER_SIZE {
            return Err(RootError::InvalidHeader(format!(
                "extended header needs {EXTENDED_HEADER_SIZE} bytes, have {}",
                data.len()
            )));
        }

        let version = match value2 {
            0..=2 => RootVersion::V2,
            3 => RootVersion::V3,
            _ => RootVersion::V4,
        };

        Ok(Some(Self {
            magic,
            version,
            extended: true,
            total_files: magic.decode(&data[12..16]),
            named_files: magic.decode(&data[16..20]),
        }))
    }

    /// Offset of the first block
    pub const fn size(&self) -> usize {
        if self.extended {
            EXTENDED_HEADER_SIZE
        } else {
            CLASSIC_HEADER_SIZE
        }
    }

    /// Version number stored in an extended header
    pub const fn version_number(&self) -> u32 {
        match self.version {
            RootVersion::V1 | RootVersion::V2 => 2,
            RootVersion::V3 => 3,
            RootVersion::V4 => 4,
        }
    }

    /// Serialize the header
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.magic.to_bytes());
        if self.extended {
            out.extend_from_slice(&self.magic.encode(EXTENDED_HEADER_SIZE as u32));
            out.extend_from_slice(&self.magic.encode(self.version_number()));
        }
        out.extend_from_slice(&self.magic.encode(self.total_files));
        out.extend_from_slice(&self.magic.encode(self.named_files));
        if self.extended {
            out.extend_from_slice(&[0; 4]);
        }
        out
    }
}
