//! Build configuration documents

use casket_crypto::Key;

use super::document::ConfigDocument;
use super::error::ConfigError;

/// Build configuration: references to the system files of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    document: ConfigDocument,
}

impl BuildConfig {
    /// Parse document bytes
    pub fn parse(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(Self {
            document: ConfigDocument::parse_bytes(data)?,
        })
    }

    /// Content key of the root table
    pub fn root(&self) -> Result<Key, ConfigError> {
        self.document.key_at("root", 0)
    }

    /// Content key of the encoding table
    pub fn encoding_content_key(&self) -> Result<Key, ConfigError> {
        self.document.key_at("encoding", 0)
    }

    /// Encoding key of the encoding table
    pub fn encoding_key(&self) -> Result<Key, ConfigError> {
        self.document.key_at("encoding", 1)
    }

    /// Decoded and encoded size of the encoding table, when listed
    pub fn encoding_size(&self) -> Option<(u64, u64)> {
        let values = self.document.get("encoding-size")?;
        let decoded = values.first()?.parse().ok()?;
        let encoded = values.get(1)?.parse().ok()?;
        Some((decoded, encoded))
    }

    /// Human readable build name
    pub fn build_name(&self) -> Option<String> {
        self.document
            .get("build-name")
            .map(|values| values.join(" "))
    }

    /// Underlying document
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }
}
