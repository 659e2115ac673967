//! `.build.info` tables
//!
//! A pipe-separated table whose header names and types each column:
//!
//! ```text
//! Branch!STRING:0|Active!DEC:1|Build Key!HEX:16|CDN Key!HEX:16|...
//! ## seqn = 2241282
//! us|1|2a3d...|9f0e...|...
//! ```

use casket_crypto::Key;

use super::error::ConfigError;

/// Parsed `.build.info` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    sequence: Option<u64>,
}

/// One row of a [`BuildInfo`] table
#[derive(Debug, Clone, Copy)]
pub struct BuildInfoRow<'a> {
    table: &'a BuildInfo,
    values: &'a [String],
}

impl BuildInfo {
    /// Parse table bytes
    pub fn parse(data: &[u8]) -> Result<Self, ConfigError> {
        let text = std::str::from_utf8(data)?;
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| ConfigError::Table("empty document".to_string()))?;
        if !header.contains('!') {
            return Err(ConfigError::Table(
                "header has no column types".to_string(),
            ));
        }
        let columns: Vec<String> = header
            .split('|')
            .map(|column| {
                column
                    .split_once('!')
                    .map_or(column, |(name, _)| name)
                    .to_string()
            })
            .collect();

        let mut rows = Vec::new();
        let mut sequence = None;
        for line in lines {
            if let Some(rest) = line.strip_prefix("## seqn") {
                sequence = rest.trim_start_matches([' ', '=']).trim().parse().ok();
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            let values: Vec<String> = line.split('|').map(String::from).collect();
            if values.len() != columns.len() {
                return Err(ConfigError::Table(format!(
                    "row {} has {} values for {} columns",
                    rows.len(),
                    values.len(),
                    columns.len()
                )));
            }
            rows.push(values);
        }

        Ok(Self {
            columns,
            rows,
            sequence,
        })
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sequence number, when present
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Rows in file order
    pub fn rows(&self) -> impl Iterator<Item = BuildInfoRow<'_>> {
        self.rows.iter().map(|values| BuildInfoRow {
            table: self,
            values,
        })
    }

    /// First row whose `Active` column is `1`
    pub fn active(&self) -> Result<BuildInfoRow<'_>, ConfigError> {
        self.rows()
            .find(|row| row.get("Active") == Some("1"))
            .ok_or(ConfigError::NoActiveBuild)
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

impl<'a> BuildInfoRow<'a> {
    /// Value of a column, matched case-insensitively
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.table.column(column)?;
        self.values.get(index).map(String::as_str)
    }

    /// Build configuration key
    pub fn build_key(&self) -> Result<Key, ConfigError> {
        self.key("Build Key")
    }

    /// CDN configuration key
    pub fn cdn_key(&self) -> Result<Key, ConfigError> {
        self.key("CDN Key")
    }

    /// CDN path prefix such as `tpr/wow`
    pub fn cdn_path(&self) -> Option<&'a str> {
        self.get("CDN Path").filter(|v| !v.is_empty())
    }

    /// CDN host names
    pub fn cdn_hosts(&self) -> Vec<&'a str> {
        self.get("CDN Hosts")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Product code such as `wow`
    pub fn product(&self) -> Option<&'a str> {
        self.get("Product").filter(|v| !v.is_empty())
    }

    /// Build version string
    pub fn version(&self) -> Option<&'a str> {
        self.get("Version").filter(|v| !v.is_empty())
    }

    fn key(&self, column: &str) -> Result<Key, ConfigError> {
        let value = self
            .get(column)
            .ok_or_else(|| ConfigError::MissingField(column.to_string()))?;
        Key::from_hex(value).map_err(|source| ConfigError::InvalidKey {
            field: column.to_string(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Branch!STRING:0|Active!DEC:1|Build Key!HEX:16|CDN Key!HEX:16|CDN Path!STRING:0|CDN Hosts!STRING:0|Version!STRING:0|Product!STRING:0
## seqn = 2241282
eu|0|00000000000000000000000000000001|00000000000000000000000000000002|tpr/wow|eu.cdn.example||wow
us|1|0000000000000000000000000000000a|0000000000000000000000000000000b|tpr/wow|us.cdn.example level3.example|11.1.0.60228|wow
";

    #[test]
    fn test_active_row() {
        let info = BuildInfo::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.sequence(), Some(2_241_282));
        assert_eq!(info.rows().count(), 2);
        assert_eq!(info.columns()[2], "Build Key");

        let active = info.active().unwrap();
        assert_eq!(active.get("branch"), Some("us"));
        assert!(active.build_key().unwrap().to_hex().ends_with('a'));
        assert!(active.cdn_key().unwrap().to_hex().ends_with('b'));
        assert_eq!(active.cdn_path(), Some("tpr/wow"));
        assert_eq!(active.cdn_hosts(), vec!["us.cdn.example", "level3.example"]);
        assert_eq!(active.version(), Some("11.1.0.60228"));
        assert_eq!(active.product(), Some("wow"));
    }

    #[test]
    fn test_no_active_row() {
        let text = SAMPLE.replace("|1|", "|0|");
        let info = BuildInfo::parse(text.as_bytes()).unwrap();
        assert!(matches!(info.active(), Err(ConfigError::NoActiveBuild)));
    }

    #[test]
    fn test_malformed_tables() {
        assert!(matches!(
            BuildInfo::parse(b""),
            Err(ConfigError::Table(_))
        ));
        assert!(matches!(
            BuildInfo::parse(b"Branch|Active\nus|1\n"),
            Err(ConfigError::Table(_))
        ));
        assert!(matches!(
            BuildInfo::parse(b"Branch!STRING:0|Active!DEC:1\nus|1|extra\n"),
            Err(ConfigError::Table(_))
        ));
    }
}
