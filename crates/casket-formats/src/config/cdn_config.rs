//! CDN configuration documents

use casket_crypto::Key;

use super::document::ConfigDocument;
use super::error::ConfigError;

/// CDN configuration: the archives of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnConfig {
    document: ConfigDocument,
}

impl CdnConfig {
    /// Parse document bytes
    pub fn parse(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(Self {
            document: ConfigDocument::parse_bytes(data)?,
        })
    }

    /// Archive keys in listed order; the position is the archive number
    pub fn archives(&self) -> Result<Vec<Key>, ConfigError> {
        self.document.keys("archives")
    }

    /// Key of the combined archive index, when listed
    pub fn archive_group(&self) -> Result<Option<Key>, ConfigError> {
        if self.document.get("archive-group").is_none() {
            return Ok(None);
        }
        self.document.key_at("archive-group", 0).map(Some)
    }

    /// Underlying document
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_archives_in_order() {
        let config = CdnConfig::parse(
            b"archives = 0000000000000000000000000000000a 0000000000000000000000000000000b\narchive-group = 0000000000000000000000000000000c\n",
        )
        .unwrap();
        let archives = config.archives().unwrap();
        assert_eq!(archives.len(), 2);
        assert!(archives[0].to_hex().ends_with('a'));
        assert!(archives[1].to_hex().ends_with('b'));
        assert!(config.archive_group().unwrap().is_some());
    }

    #[test]
    fn test_no_archives() {
        let config = CdnConfig::parse(b"# CDN Configuration\n").unwrap();
        assert!(config.archives().unwrap().is_empty());
        assert!(config.archive_group().unwrap().is_none());
    }
}
