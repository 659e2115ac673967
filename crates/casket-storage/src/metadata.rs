//! Build metadata: where the encoding and root tables and the archives are
//!
//! Local installations name their active build in `.build.info` and keep
//! configuration documents under `Data/config/xx/yy/<hex>`. Remote builds
//! fetch the same documents from `{cdn_root}/config/xx/yy/<hex>`.

use std::path::{Path, PathBuf};

use casket_access::{ByteRange, DataAccessProvider, DataLocation, cdn_config_url};
use casket_crypto::Key;
use casket_formats::config::{BuildConfig, BuildInfo, CdnConfig};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, StorageError};

/// `.build.info` at the installation root
pub const BUILD_INFO_FILE: &str = ".build.info";

/// Installation data directory
pub const DATA_DIR: &str = "Data";

/// Keys needed to bootstrap the tables of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    /// Content key of the decoded encoding table
    pub encoding_content_key: Key,
    /// Storage key of the encoded encoding table
    pub encoding_key: Key,
    /// Decoded size of the encoding table, when listed
    pub encoding_size: Option<u64>,
    /// Content key of the root table
    pub root_content_key: Key,
    /// Archive keys; the position is the archive number
    pub archives: Vec<Key>,
    /// Human readable build name
    pub build_name: Option<String>,
}

impl BuildMetadata {
    /// Collect metadata from a build configuration and an optional CDN configuration
    pub fn from_configs(build: &BuildConfig, cdn: Option<&CdnConfig>) -> Result<Self> {
        Ok(Self {
            encoding_content_key: build.encoding_content_key()?,
            encoding_key: build.encoding_key()?,
            encoding_size: build.encoding_size().map(|(decoded, _)| decoded),
            root_content_key: build.root()?,
            archives: cdn.map(CdnConfig::archives).transpose()?.unwrap_or_default(),
            build_name: build.build_name(),
        })
    }

    /// Load the active build of a local installation
    ///
    /// The CDN configuration is optional locally; when it is missing the
    /// archive list is empty.
    pub async fn load_local(install_dir: &Path) -> Result<Self> {
        let build_info_path = install_dir.join(BUILD_INFO_FILE);
        let text = tokio::fs::read(&build_info_path).await.map_err(|e| {
            StorageError::Configuration(format!("{}: {e}", build_info_path.display()))
        })?;
        let build_info = BuildInfo::parse(&text)?;
        let active = build_info.active()?;
        let build_key = active.build_key()?;
        debug!(build = %build_key, version = ?active.version(), "active build");

        let path = local_config_path(install_dir, &build_key);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::Configuration(format!("{}: {e}", path.display())))?;
        let build = BuildConfig::parse(&data)?;

        let cdn = match active.cdn_key() {
            Ok(key) => match tokio::fs::read(local_config_path(install_dir, &key)).await {
                Ok(data) => Some(CdnConfig::parse(&data)?),
                Err(e) => {
                    debug!(cdn = %key, error = %e, "CDN configuration not installed");
                    None
                }
            },
            Err(_) => None,
        };

        let metadata = Self::from_configs(&build, cdn.as_ref())?;
        info!(
            build = ?metadata.build_name,
            archives = metadata.archives.len(),
            "loaded local build metadata"
        );
        Ok(metadata)
    }

    /// Fetch build and CDN configurations from a CDN root
    pub async fn load_remote<P: DataAccessProvider + ?Sized>(
        provider: &P,
        cdn_root: &Url,
        build_key: &Key,
        cdn_key: &Key,
    ) -> Result<Self> {
        let fetch = |key: &Key| {
            let url = cdn_config_url(cdn_root, key);
            async move {
                let location = DataLocation::Url(url?);
                Ok::<_, StorageError>(provider.read(&location, ByteRange::full()).await?)
            }
        };
        let (build, cdn) = futures::try_join!(fetch(build_key), fetch(cdn_key))?;

        let build = BuildConfig::parse(&build)?;
        let cdn = CdnConfig::parse(&cdn)?;
        let metadata = Self::from_configs(&build, Some(&cdn))?;
        info!(
            build = ?metadata.build_name,
            archives = metadata.archives.len(),
            "loaded remote build metadata"
        );
        Ok(metadata)
    }
}

/// Path of a configuration document in a local installation
pub fn local_config_path(install_dir: &Path, key: &Key) -> PathBuf {
    let hex = key.to_hex();
    install_dir
        .join(DATA_DIR)
        .join("config")
        .join(&hex[..2])
        .join(&hex[2..4])
        .join(hex)
}
