//! Storage key to archive location index
//!
//! An [`Index`] merges every index document of one archive generation:
//! the local `.idx` buckets of an installation or the `.index` documents of
//! the archives a CDN configuration lists. Documents are decoded in
//! parallel and merged in a fixed order; the first entry for a key wins.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use casket_access::{ByteRange, DataAccessProvider, DataLocation, cdn_index_url};
use casket_crypto::Key;
use casket_formats::archive::ArchiveIndex;
use casket_formats::local_index::{LocalIndex, parse_index_file_name};
use futures::future::try_join_all;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, StorageError};
use crate::metadata::DATA_DIR;

/// Location of one stored block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Storage key as stored in the index document
    pub key: Key,
    /// Archive number: `data.NNN` locally, position in the archive list remotely
    pub archive: u32,
    /// Offset of the block in the archive
    pub offset: u64,
    /// Size of the block in the archive
    pub size: u32,
}

/// Immutable `Key -> IndexEntry` map
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: HashMap<Key, IndexEntry>,
    key_length: usize,
}

impl Index {
    /// Build an index from entries; the first entry for a key wins
    pub fn from_entries(key_length: usize, entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let mut index = Self {
            entries: HashMap::new(),
            key_length,
        };
        let duplicates = index.merge(entries);
        if duplicates > 0 {
            debug!(duplicates, "ignored duplicate index entries");
        }
        index
    }

    /// Parse the `.idx` documents of a local installation
    ///
    /// Only the highest version of each bucket is read. Buckets are merged
    /// in ascending order.
    pub async fn parse_local(install_dir: &Path) -> Result<Self> {
        let data_dir = install_dir.join(DATA_DIR).join("data");
        let documents = latest_local_documents(&data_dir).await?;
        if documents.is_empty() {
            return Err(StorageError::Configuration(format!(
                "no index documents in {}",
                data_dir.display()
            )));
        }

        let parsed = try_join_all(documents.into_iter().map(|path| {
            tokio::task::spawn_blocking(move || -> Result<LocalIndex> {
                let name = document_name(&path);
                let data = std::fs::read(&path)?;
                LocalIndex::parse(&data).map_err(|e| StorageError::MalformedIndex {
                    document: name,
                    reason: e.to_string(),
                })
            })
        }))
        .await?;

        let mut index = Self {
            entries: HashMap::new(),
            key_length: 9,
        };
        let mut duplicates = 0;
        for document in parsed {
            let document = document?;
            duplicates += index.merge(document.records.iter().map(|r| IndexEntry {
                key: r.key,
                archive: u32::from(r.archive_id),
                offset: u64::from(r.offset),
                size: r.size,
            }));
        }

        info!(entries = index.len(), duplicates, "parsed local index");
        Ok(index)
    }

    /// Fetch and parse the `.index` document of every archive
    ///
    /// The archive number of an entry is the position of its archive in
    /// `archives`; earlier archives win on duplicate keys.
    pub async fn parse_remote<P: DataAccessProvider + ?Sized>(
        archives: &[Key],
        provider: &P,
        cdn_root: &Url,
    ) -> Result<Self> {
        let parsed = try_join_all(archives.iter().map(|archive| async move {
            let url = cdn_index_url(cdn_root, archive)?;
            let document = format!("{}.index", archive.to_hex());
            let data = provider
                .read(&DataLocation::Url(url), ByteRange::full())
                .await?;
            let parsed = tokio::task::spawn_blocking(move || {
                ArchiveIndex::parse(&data).map_err(|e| StorageError::MalformedIndex {
                    document,
                    reason: e.to_string(),
                })
            })
            .await??;
            Ok::<_, StorageError>(parsed)
        }))
        .await?;

        let key_length = parsed
            .first()
            .map_or(16, |doc| usize::from(doc.footer.ekey_length));
        let mut index = Self {
            entries: HashMap::new(),
            key_length,
        };
        let mut duplicates = 0;
        for (number, (archive, document)) in archives.iter().zip(&parsed).enumerate() {
            if usize::from(document.footer.ekey_length) != key_length {
                return Err(StorageError::MalformedIndex {
                    document: format!("{}.index", archive.to_hex()),
                    reason: format!(
                        "{}-byte keys, earlier documents use {key_length}",
                        document.footer.ekey_length
                    ),
                });
            }
            duplicates += index.merge(document.records.iter().map(|r| IndexEntry {
                key: r.key,
                archive: number as u32,
                offset: r.offset,
                size: r.size,
            }));
        }

        info!(
            archives = archives.len(),
            entries = index.len(),
            duplicates,
            "parsed remote index"
        );
        Ok(index)
    }

    /// Location of a key; longer keys are truncated to the index key length
    pub fn lookup(&self, key: &Key) -> Option<&IndexEntry> {
        if key.len() > self.key_length {
            self.entries.get(&key.truncate(self.key_length))
        } else {
            self.entries.get(key)
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the keys stored in the index documents
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Insert entries that are not present yet, returning how many were skipped
    fn merge(&mut self, entries: impl IntoIterator<Item = IndexEntry>) -> usize {
        let mut duplicates = 0;
        for entry in entries {
            match self.entries.entry(entry.key) {
                std::collections::hash_map::Entry::Occupied(_) => duplicates += 1,
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
        duplicates
    }
}

/// Highest version of each bucket's `.idx` document, in bucket order
async fn latest_local_documents(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dir = tokio::fs::read_dir(data_dir).await.map_err(|e| {
        StorageError::Configuration(format!("{}: {e}", data_dir.display()))
    })?;

    let mut latest: BTreeMap<u8, (u32, PathBuf)> = BTreeMap::new();
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name();
        let Some((bucket, version)) = name.to_str().and_then(parse_index_file_name) else {
            continue;
        };
        if latest
            .get(&bucket)
            .is_some_and(|(current, _)| *current >= version)
        {
            debug!(file = ?name, "skipping superseded index document");
            continue;
        }
        latest.insert(bucket, (version, entry.path()));
    }
    Ok(latest.into_values().map(|(_, path)| path).collect())
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
