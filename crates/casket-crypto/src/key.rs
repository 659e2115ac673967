//! Storage keys and content checksums

use crate::error::CryptoError;
use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};
use md5::{Digest, Md5};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Largest key the inline representation can hold (a full MD5)
pub const MAX_KEY_LENGTH: usize = 16;

/// Immutable byte sequence identifying either stored data or logical content
///
/// Index documents key their records by storage keys, root tables reference
/// content checksums, and the encoding table bridges the two. Both roles use
/// the same representation: 1 to 16 raw bytes. Local `.idx` documents store
/// only the first 9 bytes of a storage key, which is why the length is not
/// fixed.
///
/// Equality, ordering and hashing consider only the populated bytes, so keys
/// of different lengths never compare equal.
#[derive(Clone, Copy)]
pub struct Key {
    len: u8,
    bytes: [u8; MAX_KEY_LENGTH],
}

/// Content identifier; shares its representation with [`Key`]
pub type Checksum = Key;

impl Key {
    /// Build a key from raw bytes
    ///
    /// Fails on an empty slice or one longer than [`MAX_KEY_LENGTH`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        if bytes.len() > MAX_KEY_LENGTH {
            return Err(CryptoError::KeyTooLong {
                actual: bytes.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        let mut inline = [0u8; MAX_KEY_LENGTH];
        inline[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            len: bytes.len() as u8,
            bytes: inline,
        })
    }

    /// Build a key from a full MD5 digest
    pub const fn from_md5(digest: [u8; 16]) -> Self {
        Self {
            len: 16,
            bytes: digest,
        }
    }

    /// Compute the MD5 content key of `data`
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_md5(md5_digest(data))
    }

    /// Parse a key from its hex form
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Number of bytes in the key
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; kept for API symmetry with slices
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Key made of the first `n` bytes
    ///
    /// `n` is clamped to `1..=len`, so truncating never yields an empty key
    /// and never pads.
    #[must_use]
    pub fn truncate(&self, n: usize) -> Self {
        let n = n.clamp(1, self.len());
        let mut bytes = [0u8; MAX_KEY_LENGTH];
        bytes[..n].copy_from_slice(&self.bytes[..n]);
        Self {
            len: n as u8,
            bytes,
        }
    }

    /// Whether `other` starts with every byte of this key
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.as_bytes().starts_with(self.as_bytes())
    }
}

/// MD5 digest of `data`
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&result);
    bytes
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<[u8; 16]> for Key {
    fn from(digest: [u8; 16]) -> Self {
        Self::from_md5(digest)
    }
}

impl FromStr for Key {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.to_hex())
    }
}

impl BinRead for Key {
    /// Key length in bytes
    type Args<'a> = (usize,);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        (len,): Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let mut bytes = [0u8; MAX_KEY_LENGTH];
        let slot = bytes.get_mut(..len).ok_or_else(|| binrw::Error::AssertFail {
            pos,
            message: format!("key length {len} exceeds {MAX_KEY_LENGTH}"),
        })?;
        reader.read_exact(slot)?;
        Self::from_bytes(slot).map_err(|e| binrw::Error::Custom {
            pos,
            err: Box::new(e),
        })
    }
}
