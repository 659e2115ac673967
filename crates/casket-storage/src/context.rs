//! Archive context: name to content resolution
//!
//! ```text
//! name -> name hash -> root table -> content checksum
//!      -> encoding table -> storage keys -> index -> blocks -> BLTE -> bytes
//! ```
//!
//! Tables are loaded once, on first use, and shared immutably by every
//! later call. A failed load latches the context into
//! [`ContextState::Failed`].

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use casket_crypto::{Checksum, Key, name_hash};
use casket_formats::blte;
use casket_formats::encoding::EncodingTable;
use casket_formats::root::RootTable;
use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::{ArchiveBackend, LocalArchive, MetadataSource, RemoteArchive};
use crate::config::ContextConfig;
use crate::error::{Result, StorageError};
use crate::index::Index;
use crate::metadata::BuildMetadata;

/// Lifecycle of an archive context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No table has been requested yet
    Uninitialized,
    /// Tables are being loaded
    TablesLoading,
    /// Tables are loaded; resolution calls run concurrently from here
    Ready,
    /// Loading failed; every call returns [`StorageError::ContextFailed`]
    Failed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::TablesLoading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The tables of one build
#[derive(Debug)]
pub struct ArchiveTables {
    /// Build metadata the tables were bootstrapped from
    pub metadata: BuildMetadata,
    /// Storage key to block location
    pub index: Index,
    /// Content checksum to storage keys
    pub encoding: EncodingTable,
    /// Name hash and file id to content checksum
    pub root: RootTable,
}

/// Resolves names, name hashes and file ids to file content
pub struct ArchiveContext<B> {
    backend: B,
    config: ContextConfig,
    tables: OnceCell<Arc<ArchiveTables>>,
    state: Mutex<ContextState>,
    failure: OnceLock<String>,
}

/// Context over a local installation
pub type LocalContext = ArchiveContext<LocalArchive>;

/// Context over a CDN root
pub type RemoteContext = ArchiveContext<RemoteArchive>;

impl<B: fmt::Debug> fmt::Debug for ArchiveContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveContext")
            .field("backend", &self.backend)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl LocalContext {
    /// Context over the installation at `install_dir`
    pub fn open_local(install_dir: impl Into<PathBuf>, config: ContextConfig) -> Self {
        Self::new(LocalArchive::new(install_dir), config)
    }
}

impl RemoteContext {
    /// Context over a CDN root, bootstrapped from build and CDN configuration keys
    pub fn open_remote(
        cdn_root: Url,
        build_config: Key,
        cdn_config: Key,
        config: ContextConfig,
    ) -> Result<Self> {
        let source = MetadataSource::Configs {
            build: build_config,
            cdn: cdn_config,
        };
        Ok(Self::new(RemoteArchive::new(cdn_root, source, &config)?, config))
    }

    /// Context over a CDN root with caller-supplied build metadata
    pub fn from_metadata(
        cdn_root: Url,
        metadata: BuildMetadata,
        config: ContextConfig,
    ) -> Result<Self> {
        let source = MetadataSource::Explicit(metadata);
        Ok(Self::new(RemoteArchive::new(cdn_root, source, &config)?, config))
    }
}

impl<B: ArchiveBackend> ArchiveContext<B> {
    /// Context over any backend; nothing is read until the first call
    pub fn new(backend: B, config: ContextConfig) -> Self {
        Self {
            backend,
            config,
            tables: OnceCell::new(),
            state: Mutex::new(ContextState::Uninitialized),
            failure: OnceLock::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        *self.state.lock()
    }

    /// Configuration the context was created with
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Backend the context reads from
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loaded tables, loading them on first use
    pub async fn tables(&self) -> Result<Arc<ArchiveTables>> {
        self.check_failed()?;
        self.tables
            .get_or_try_init(|| self.load_tables())
            .await
            .cloned()
    }

    /// Content of a file by name
    ///
    /// The name is matched case-insensitively and `/` and `\` are
    /// interchangeable. `Ok(None)` means the name is not in the archive.
    pub async fn resolve_by_name(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.resolve_by_hash(name_hash(name)).await
    }

    /// Content of a file by name hash
    pub async fn resolve_by_hash(&self, hash: u64) -> Result<Option<Vec<u8>>> {
        let tables = self.tables().await?;
        let Some(checksum) = tables.root.lookup(hash, self.config.locale) else {
            debug!(hash = %format!("{hash:016x}"), locale = %self.config.locale, "name not in root table");
            return Ok(None);
        };
        self.resolve_checksum(&tables, &checksum).await
    }

    /// Content of a file by numeric file id
    pub async fn resolve_by_file_data_id(&self, file_data_id: u32) -> Result<Option<Vec<u8>>> {
        let tables = self.tables().await?;
        let Some(checksum) = tables
            .root
            .lookup_by_file_data_id(file_data_id, self.config.locale)
        else {
            debug!(file_data_id, "file id not in root table");
            return Ok(None);
        };
        self.resolve_checksum(&tables, &checksum).await
    }

    /// Whether a name has a root entry for the configured locales
    pub async fn is_known(&self, name: &str) -> Result<bool> {
        self.is_known_hash(name_hash(name)).await
    }

    /// Whether a name hash has a root entry for the configured locales
    pub async fn is_known_hash(&self, hash: u64) -> Result<bool> {
        let tables = self.tables().await?;
        Ok(tables.root.lookup(hash, self.config.locale).is_some())
    }

    async fn resolve_checksum(
        &self,
        tables: &ArchiveTables,
        checksum: &Checksum,
    ) -> Result<Option<Vec<u8>>> {
        let entry = tables.encoding.lookup(checksum).ok_or_else(|| {
            StorageError::MalformedArchive(format!(
                "root entry {checksum} has no encoding entry"
            ))
        })?;

        let blocks = try_join_all(
            entry
                .file_keys
                .iter()
                .map(|key| self.read_decoded(tables, key)),
        )
        .await?;

        let mut content = Vec::with_capacity(usize::try_from(entry.file_size).unwrap_or(0));
        for (key, block) in entry.file_keys.iter().zip(blocks) {
            let Some(block) = block else {
                debug!(%checksum, %key, "block not in index");
                return Ok(None);
            };
            content.extend_from_slice(&block);
        }

        if content.len() as u64 != entry.file_size {
            warn!(
                %checksum,
                expected = entry.file_size,
                actual = content.len(),
                "decoded size differs from encoding table"
            );
        }
        debug!(%checksum, blocks = entry.block_count(), size = content.len(), "resolved");
        Ok(Some(content))
    }

    /// Read and decode one block; `None` when the key is not stored
    async fn read_decoded(&self, tables: &ArchiveTables, key: &Key) -> Result<Option<Vec<u8>>> {
        let Some(raw) = self
            .backend
            .read_block(&tables.metadata, &tables.index, key)
            .await?
        else {
            return Ok(None);
        };
        decode_block(*key, raw).await.map(Some)
    }

    fn check_failed(&self) -> Result<()> {
        match self.failure.get() {
            Some(reason) => Err(StorageError::ContextFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn set_state(&self, state: ContextState) {
        *self.state.lock() = state;
    }

    async fn load_tables(&self) -> Result<Arc<ArchiveTables>> {
        self.check_failed()?;
        self.set_state(ContextState::TablesLoading);

        match self.build_tables().await {
            Ok(tables) => {
                self.set_state(ContextState::Ready);
                info!(
                    build = ?tables.metadata.build_name,
                    index = tables.index.len(),
                    encoding = tables.encoding.len(),
                    root = tables.root.len(),
                    "archive tables ready"
                );
                Ok(Arc::new(tables))
            }
            Err(e) => {
                warn!(error = %e, "archive tables failed to load");
                let _ = self.failure.set(e.to_string());
                self.set_state(ContextState::Failed);
                Err(e)
            }
        }
    }

    async fn build_tables(&self) -> Result<ArchiveTables> {
        let (metadata, index) = self.backend.load().await?;
        info!(
            entries = index.len(),
            archives = metadata.archives.len(),
            "index loaded"
        );

        let encoding_key = metadata.encoding_key;
        let raw = self
            .backend
            .read_block(&metadata, &index, &encoding_key)
            .await?
            .ok_or_else(|| {
                StorageError::Configuration(format!("encoding table {encoding_key} is not stored"))
            })?;
        let expected = metadata.encoding_content_key;
        let encoding = tokio::task::spawn_blocking(move || -> Result<EncodingTable> {
            let data = decode(encoding_key, &raw)?;
            if Key::from_data(&data) != expected {
                warn!(%expected, "encoding table checksum differs from build configuration");
            }
            Ok(EncodingTable::parse(&data)?)
        })
        .await??;
        info!(entries = encoding.len(), "encoding table loaded");

        let root_entry = encoding.lookup(&metadata.root_content_key).ok_or_else(|| {
            StorageError::MalformedArchive(format!(
                "root table {} has no encoding entry",
                metadata.root_content_key
            ))
        })?;
        let mut raw_blocks = Vec::with_capacity(root_entry.block_count());
        for key in &root_entry.file_keys {
            let raw = self
                .backend
                .read_block(&metadata, &index, key)
                .await?
                .ok_or_else(|| {
                    StorageError::MalformedArchive(format!("root table block {key} is not stored"))
                })?;
            raw_blocks.push((*key, raw));
        }
        let root = tokio::task::spawn_blocking(move || -> Result<RootTable> {
            let mut data = Vec::new();
            for (key, raw) in &raw_blocks {
                data.extend_from_slice(&decode(*key, raw)?);
            }
            Ok(RootTable::parse(&data)?)
        })
        .await??;
        info!(entries = root.len(), version = ?root.version(), "root table loaded");

        Ok(ArchiveTables {
            metadata,
            index,
            encoding,
            root,
        })
    }
}

fn decode(key: Key, raw: &[u8]) -> Result<Vec<u8>> {
    blte::decode_bytes(raw).map_err(|source| StorageError::MalformedContainer {
        key: key.to_hex(),
        source,
    })
}

async fn decode_block(key: Key, raw: Vec<u8>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || decode(key, &raw)).await?
}
