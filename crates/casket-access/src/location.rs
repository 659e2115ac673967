//! Locations and byte ranges

use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::io::AsyncRead;
use url::Url;

/// Open byte stream; dropping it releases the underlying handle
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Where a document or data file lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataLocation {
    /// File in a local installation
    Path(PathBuf),
    /// Document on a CDN
    Url(Url),
}

impl From<PathBuf> for DataLocation {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Url> for DataLocation {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Byte range of a location; `length: None` reads to the end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    /// First byte
    pub offset: u64,
    /// Number of bytes, or everything after `offset`
    pub length: Option<u64>,
}

impl ByteRange {
    /// The whole document
    pub const fn full() -> Self {
        Self {
            offset: 0,
            length: None,
        }
    }

    /// `length` bytes starting at `offset`
    pub const fn new(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    /// Everything from `offset` on
    pub const fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    /// Whether this is the whole document
    pub const fn is_full(&self) -> bool {
        self.offset == 0 && self.length.is_none()
    }

    /// Whether the range selects no bytes
    pub const fn is_empty(&self) -> bool {
        matches!(self.length, Some(0))
    }

    /// `Range` header value, `None` for the whole document or an empty range
    pub fn header_value(&self) -> Option<String> {
        match self.length {
            _ if self.is_full() => None,
            Some(0) => None,
            Some(length) => Some(format!(
                "bytes={}-{}",
                self.offset,
                self.offset + length - 1
            )),
            None => Some(format!("bytes={}-", self.offset)),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{}+{}", self.offset, length),
            None => write!(f, "{}+", self.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_header() {
        assert_eq!(ByteRange::full().header_value(), None);
        assert_eq!(ByteRange::new(0, 0).header_value(), None);
        assert_eq!(
            ByteRange::new(100, 50).header_value().as_deref(),
            Some("bytes=100-149")
        );
        assert_eq!(
            ByteRange::from_offset(7).header_value().as_deref(),
            Some("bytes=7-")
        );
        assert_eq!(ByteRange::new(0, 1).header_value().as_deref(), Some("bytes=0-0"));
    }

    #[test]
    fn test_range_predicates() {
        assert!(ByteRange::full().is_full());
        assert!(ByteRange::default().is_full());
        assert!(!ByteRange::new(0, 10).is_full());
        assert!(ByteRange::new(5, 0).is_empty());
        assert_eq!(ByteRange::new(5, 10).to_string(), "5+10");
    }
}
