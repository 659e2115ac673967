//! `key = value` configuration documents

use std::collections::HashMap;

use casket_crypto::Key;

use super::error::ConfigError;

/// Parsed `key = value` document with whitespace-separated values
///
/// Blank lines and `#` comments are skipped. Later duplicates replace
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    entries: HashMap<String, Vec<String>>,
}

impl ConfigDocument {
    /// Parse document text
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once(" = ").or_else(|| {
                    // An empty value leaves a trailing " ="
                    line.strip_suffix(" =").map(|key| (key, ""))
                })?;
                let key = key.trim();
                is_valid_key(key).then(|| {
                    (
                        key.to_string(),
                        value.split_whitespace().map(String::from).collect(),
                    )
                })
            })
            .collect();
        Self { entries }
    }

    /// Parse document bytes
    pub fn parse_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(Self::parse(std::str::from_utf8(data)?))
    }

    /// Values of a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries.get(field).map(Vec::as_slice)
    }

    /// Values of a required field
    pub fn require(&self, field: &str) -> Result<&[String], ConfigError> {
        self.get(field)
            .ok_or_else(|| ConfigError::MissingField(field.to_string()))
    }

    /// The `index`-th value of a required field parsed as a key
    pub fn key_at(&self, field: &str, index: usize) -> Result<Key, ConfigError> {
        let value = self.require(field)?.get(index).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("expected at least {} values", index + 1),
            }
        })?;
        parse_key(field, value)
    }

    /// Every value of a field parsed as a key; empty when absent
    pub fn keys(&self, field: &str) -> Result<Vec<Key>, ConfigError> {
        self.get(field)
            .unwrap_or_default()
            .iter()
            .map(|value| parse_key(field, value))
            .collect()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_key(field: &str, value: &str) -> Result<Key, ConfigError> {
    Key::from_hex(value).map_err(|source| ConfigError::InvalidKey {
        field: field.to_string(),
        source,
    })
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
