//! Local file access

use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::trace;

use crate::error::{AccessError, Result};
use crate::location::{ByteRange, ByteReader, DataLocation};
use crate::provider::DataAccessProvider;

/// Reads ranges of files in a local installation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl LocalProvider {
    /// Create a provider
    pub const fn new() -> Self {
        Self
    }

    async fn open_file(path: &Path) -> Result<File> {
        let not_found = |reason: String| AccessError::LocationNotFound {
            location: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| not_found(e.to_string()))?;
        if !metadata.is_file() {
            return Err(not_found("not a regular file".to_string()));
        }
        File::open(path).await.map_err(|e| not_found(e.to_string()))
    }
}

#[async_trait]
impl DataAccessProvider for LocalProvider {
    async fn open(&self, location: &DataLocation, range: ByteRange) -> Result<ByteReader> {
        let DataLocation::Path(path) = location else {
            return Err(AccessError::UnsupportedLocation(location.to_string()));
        };

        let mut file = Self::open_file(path).await?;
        if range.offset > 0 {
            file.seek(SeekFrom::Start(range.offset)).await?;
        }
        trace!(path = %path.display(), %range, "opened local range");

        Ok(match range.length {
            Some(length) => Box::pin(file.take(length)),
            None => Box::pin(file),
        })
    }
}
