//! CDN URL scheme
//!
//! Content is addressed as `{root}/{kind}/{hex[0:2]}/{hex[2:4]}/{hex}`, where
//! `kind` is `data` for archives, their `.index` documents and loose
//! blocks, and `config` for configuration documents.

use casket_crypto::Key;
use url::Url;

use crate::error::{AccessError, Result};

/// URL of a data archive or loose block
pub fn cdn_data_url(root: &Url, key: &Key) -> Result<Url> {
    content_url(root, "data", key, "")
}

/// URL of the `.index` document of an archive
pub fn cdn_index_url(root: &Url, key: &Key) -> Result<Url> {
    content_url(root, "data", key, ".index")
}

/// URL of a build or CDN configuration document
pub fn cdn_config_url(root: &Url, key: &Key) -> Result<Url> {
    content_url(root, "config", key, "")
}

fn content_url(root: &Url, kind: &str, key: &Key, suffix: &str) -> Result<Url> {
    if key.len() != 16 {
        return Err(AccessError::InvalidKey {
            key: key.to_hex(),
            len: key.len(),
        });
    }
    let hex = key.to_hex();
    let url = format!(
        "{}/{kind}/{}/{}/{hex}{suffix}",
        root.as_str().trim_end_matches('/'),
        &hex[..2],
        &hex[2..4],
    );
    Ok(Url::parse(&url)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEX: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_url_layout() {
        let key = Key::from_hex(HEX).unwrap();
        for root in ["http://cdn.example/tpr/wow", "http://cdn.example/tpr/wow/"] {
            let root = Url::parse(root).unwrap();
            assert_eq!(
                cdn_data_url(&root, &key).unwrap().as_str(),
                format!("http://cdn.example/tpr/wow/data/01/23/{HEX}")
            );
            assert_eq!(
                cdn_index_url(&root, &key).unwrap().as_str(),
                format!("http://cdn.example/tpr/wow/data/01/23/{HEX}.index")
            );
            assert_eq!(
                cdn_config_url(&root, &key).unwrap().as_str(),
                format!("http://cdn.example/tpr/wow/config/01/23/{HEX}")
            );
        }
    }

    #[test]
    fn test_short_keys_rejected() {
        let root = Url::parse("http://cdn.example/tpr/wow").unwrap();
        let key = Key::from_hex(HEX).unwrap().truncate(9);
        let err = cdn_data_url(&root, &key).unwrap_err();
        assert!(matches!(err, AccessError::InvalidKey { len: 9, .. }));
    }
}
