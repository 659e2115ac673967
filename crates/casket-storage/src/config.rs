//! Archive context configuration

use std::path::{Path, PathBuf};

use casket_access::RemoteConfig;
use casket_formats::root::{Locale, LocaleFlags};
use serde::{Deserialize, Serialize};

/// Settings shared by local and remote archive contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Locales accepted when a name has per-locale entries
    pub locale: LocaleFlags,

    /// Disk cache for remote documents; `None` disables caching
    pub cache_dir: Option<PathBuf>,

    /// HTTP client settings for remote contexts
    pub remote: RemoteConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            locale: Locale::EnUs.into(),
            cache_dir: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl ContextConfig {
    /// Set the accepted locales
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<LocaleFlags>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Cache remote documents under `dir`
    #[must_use]
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the HTTP client settings
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }
}
