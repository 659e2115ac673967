//! Where an archive context reads its metadata, index and blocks from

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use casket_access::{
    ByteRange, CachingProvider, DataAccessProvider, DataLocation, LocalProvider, RemoteProvider,
    cdn_data_url,
};
use casket_crypto::Key;
use tracing::{debug, trace};
use url::Url;

use crate::config::ContextConfig;
use crate::error::{Result, StorageError};
use crate::index::Index;
use crate::metadata::{BuildMetadata, DATA_DIR};

/// Size of the header in front of every block of a local data file
pub const LOCAL_BLOCK_HEADER_SIZE: u32 = 30;

/// Source of build metadata, index documents and stored blocks
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Load build metadata and the merged index
    async fn load(&self) -> Result<(BuildMetadata, Index)>;

    /// Container bytes of a stored block; `None` when the key is not stored
    async fn read_block(
        &self,
        metadata: &BuildMetadata,
        index: &Index,
        key: &Key,
    ) -> Result<Option<Vec<u8>>>;
}

/// Local installation: `.build.info`, `.idx` buckets and `data.NNN` files
#[derive(Debug, Clone)]
pub struct LocalArchive {
    install_dir: PathBuf,
    provider: LocalProvider,
}

impl LocalArchive {
    /// Archive rooted at an installation directory
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            provider: LocalProvider::new(),
        }
    }

    /// Installation directory
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Path of data file `number`
    pub fn data_file(&self, number: u32) -> PathBuf {
        self.install_dir
            .join(DATA_DIR)
            .join("data")
            .join(format!("data.{number:03}"))
    }
}

#[async_trait]
impl ArchiveBackend for LocalArchive {
    async fn load(&self) -> Result<(BuildMetadata, Index)> {
        futures::try_join!(
            BuildMetadata::load_local(&self.install_dir),
            Index::parse_local(&self.install_dir)
        )
    }

    async fn read_block(
        &self,
        _metadata: &BuildMetadata,
        index: &Index,
        key: &Key,
    ) -> Result<Option<Vec<u8>>> {
        let Some(entry) = index.lookup(key) else {
            return Ok(None);
        };
        let Some(size) = entry.size.checked_sub(LOCAL_BLOCK_HEADER_SIZE) else {
            return Err(StorageError::MalformedArchive(format!(
                "block {key} is {} bytes, smaller than its header",
                entry.size
            )));
        };

        let location = DataLocation::Path(self.data_file(entry.archive));
        let range = ByteRange::new(
            entry.offset + u64::from(LOCAL_BLOCK_HEADER_SIZE),
            u64::from(size),
        );
        trace!(%key, %location, %range, "reading local block");
        Ok(Some(self.provider.read(&location, range).await?))
    }
}

/// How a remote archive finds its build metadata
#[derive(Debug, Clone)]
pub enum MetadataSource {
    /// Fetch the build and CDN configurations with these keys
    Configs {
        /// Build configuration key
        build: Key,
        /// CDN configuration key
        cdn: Key,
    },
    /// Use metadata supplied by the caller
    Explicit(BuildMetadata),
}

/// CDN root: configuration documents, `.index` documents and archives
pub struct RemoteArchive {
    cdn_root: Url,
    source: MetadataSource,
    provider: Arc<dyn DataAccessProvider>,
}

impl std::fmt::Debug for RemoteArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteArchive")
            .field("cdn_root", &self.cdn_root.as_str())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl RemoteArchive {
    /// Archive read through an HTTP provider, cached on disk when configured
    pub fn new(cdn_root: Url, source: MetadataSource, config: &ContextConfig) -> Result<Self> {
        let remote = RemoteProvider::new(&config.remote)?;
        let provider: Arc<dyn DataAccessProvider> = match &config.cache_dir {
            Some(dir) => Arc::new(CachingProvider::new(remote, dir.clone())),
            None => Arc::new(remote),
        };
        Ok(Self::with_provider(cdn_root, source, provider))
    }

    /// Archive read through a caller-supplied provider
    pub fn with_provider(
        cdn_root: Url,
        source: MetadataSource,
        provider: Arc<dyn DataAccessProvider>,
    ) -> Self {
        Self {
            cdn_root,
            source,
            provider,
        }
    }

    /// CDN root URL
    pub fn cdn_root(&self) -> &Url {
        &self.cdn_root
    }
}

#[async_trait]
impl ArchiveBackend for RemoteArchive {
    async fn load(&self) -> Result<(BuildMetadata, Index)> {
        let metadata = match &self.source {
            MetadataSource::Configs { build, cdn } => {
                BuildMetadata::load_remote(self.provider.as_ref(), &self.cdn_root, build, cdn)
                    .await?
            }
            MetadataSource::Explicit(metadata) => metadata.clone(),
        };
        let index =
            Index::parse_remote(&metadata.archives, self.provider.as_ref(), &self.cdn_root).await?;
        Ok((metadata, index))
    }

    async fn read_block(
        &self,
        metadata: &BuildMetadata,
        index: &Index,
        key: &Key,
    ) -> Result<Option<Vec<u8>>> {
        let (url, range) = match index.lookup(key) {
            Some(entry) => {
                let archive = metadata
                    .archives
                    .get(entry.archive as usize)
                    .ok_or_else(|| {
                        StorageError::MalformedArchive(format!(
                            "block {key} refers to archive {} of {}",
                            entry.archive,
                            metadata.archives.len()
                        ))
                    })?;
                (
                    cdn_data_url(&self.cdn_root, archive)?,
                    ByteRange::new(entry.offset, u64::from(entry.size)),
                )
            }
            // Blocks outside every archive are stored as loose files
            None if key.len() == 16 => (cdn_data_url(&self.cdn_root, key)?, ByteRange::full()),
            None => return Ok(None),
        };

        let location = DataLocation::Url(url);
        trace!(%key, %location, %range, "reading remote block");
        match self.provider.read(&location, range).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if range.is_full() && e.is_not_found() => {
                debug!(%key, "block not stored on CDN");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
