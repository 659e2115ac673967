//! CDN index footer

use casket_crypto::md5_digest;

use super::error::IndexError;

/// Size of the footer without its trailing hash
pub const FOOTER_FIXED_SIZE: usize = 20;

/// Distance of the `footer_hash_bytes` field from the end with an 8-byte hash
const HASH_BYTES_FROM_END: usize = 13;

/// Trailer of a CDN archive index
///
/// ```text
/// toc_hash[8] version reserved[2] page_size_kb offset_bytes size_bytes
/// ekey_length footer_hash_bytes element_count(u32 LE) footer_hash[n]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFooter {
    /// Truncated MD5 of the table of contents
    pub toc_hash: [u8; 8],
    /// Format version, always 1
    pub version: u8,
    /// Reserved, zero
    pub reserved: [u8; 2],
    /// Page size in KiB
    pub page_size_kb: u8,
    /// Width of the big-endian offset field (4 or 5)
    pub offset_bytes: u8,
    /// Width of the big-endian size field (4)
    pub size_bytes: u8,
    /// Key length of every record
    pub ekey_length: u8,
    /// Width of page hashes and of the footer hash
    pub footer_hash_bytes: u8,
    /// Number of records
    pub element_count: u32,
    /// Truncated MD5 of the footer fields
    pub footer_hash: Vec<u8>,
}

impl IndexFooter {
    /// Footer with 4 KiB pages, 16-byte keys and 4-byte offsets
    pub fn new(element_count: u32) -> Self {
        Self {
            toc_hash: [0; 8],
            version: 1,
            reserved: [0; 2],
            page_size_kb: 4,
            offset_bytes: 4,
            size_bytes: 4,
            ekey_length: 16,
            footer_hash_bytes: 8,
            element_count,
            footer_hash: vec![0; 8],
        }
    }

    /// Read the footer from the end of a document
    pub fn read(data: &[u8]) -> Result<Self, IndexError> {
        if data.len() < FOOTER_FIXED_SIZE + 8 {
            return Err(IndexError::TooShort {
                len: data.len(),
                needed: FOOTER_FIXED_SIZE + 8,
            });
        }

        let hash_bytes = data[data.len() - HASH_BYTES_FROM_END] as usize;
        let size = FOOTER_FIXED_SIZE + hash_bytes;
        if data.len() < size {
            return Err(IndexError::TooShort {
                len: data.len(),
                needed: size,
            });
        }

        let raw = &data[data.len() - size..];
        let mut toc_hash = [0u8; 8];
        toc_hash.copy_from_slice(&raw[..8]);

        let footer = Self {
            toc_hash,
            version: raw[8],
            reserved: [raw[9], raw[10]],
            page_size_kb: raw[11],
            offset_bytes: raw[12],
            size_bytes: raw[13],
            ekey_length: raw[14],
            footer_hash_bytes: raw[15],
            element_count: u32::from_le_bytes([raw[16], raw[17], raw[18], raw[19]]),
            footer_hash: raw[20..].to_vec(),
        };
        footer.validate()?;
        Ok(footer)
    }

    /// Check the field ranges the record parser depends on
    pub fn validate(&self) -> Result<(), IndexError> {
        let invalid = |msg: String| Err(IndexError::InvalidFooter(msg));
        if self.version != 1 {
            return invalid(format!("version {}", self.version));
        }
        if self.page_size_kb == 0 {
            return invalid("page size of 0 KiB".to_string());
        }
        if !(4..=5).contains(&self.offset_bytes) {
            return invalid(format!("offset field of {} bytes", self.offset_bytes));
        }
        if self.size_bytes != 4 {
            return invalid(format!("size field of {} bytes", self.size_bytes));
        }
        if self.ekey_length == 0 || self.ekey_length > 16 {
            return invalid(format!("key length {}", self.ekey_length));
        }
        if self.footer_hash_bytes as usize != self.footer_hash.len() || self.footer_hash_bytes > 16 {
            return invalid(format!("hash length {}", self.footer_hash_bytes));
        }
        Ok(())
    }

    /// Serialized footer size
    pub fn size(&self) -> usize {
        FOOTER_FIXED_SIZE + self.footer_hash_bytes as usize
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.page_size_kb as usize * 1024
    }

    /// Size of one page record
    pub fn record_size(&self) -> usize {
        self.ekey_length as usize + self.size_bytes as usize + self.offset_bytes as usize
    }

    /// Bytes each page contributes: the page plus its TOC key and hash
    pub fn bytes_per_page(&self) -> usize {
        self.page_size() + self.ekey_length as usize + self.footer_hash_bytes as usize
    }

    /// Truncated MD5 over the footer fields after `toc_hash`
    pub fn compute_footer_hash(&self) -> Vec<u8> {
        let mut fields = self.fields();
        fields.extend(std::iter::repeat_n(0, self.footer_hash_bytes as usize));
        md5_digest(&fields)[..self.footer_hash_bytes as usize].to_vec()
    }

    /// Serialize the footer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.toc_hash);
        out.extend_from_slice(&self.fields());
        out.extend_from_slice(&self.footer_hash);
        out
    }

    fn fields(&self) -> Vec<u8> {
        let mut out = vec![
            self.version,
            self.reserved[0],
            self.reserved[1],
            self.page_size_kb,
            self.offset_bytes,
            self.size_bytes,
            self.ekey_length,
            self.footer_hash_bytes,
        ];
        out.extend_from_slice(&self.element_count.to_le_bytes());
        out
    }
}
