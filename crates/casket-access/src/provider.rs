//! Data access provider trait

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::error::Result;
use crate::location::{ByteRange, ByteReader, DataLocation};

/// Opens byte ranges of local files or remote documents
///
/// Implementations must be shareable across tasks. A returned reader holds
/// whatever handle backs it until it is dropped.
#[async_trait]
pub trait DataAccessProvider: Send + Sync {
    /// Open a range of a location as a stream
    async fn open(&self, location: &DataLocation, range: ByteRange) -> Result<ByteReader>;

    /// Read a range of a location into memory
    async fn read(&self, location: &DataLocation, range: ByteRange) -> Result<Vec<u8>> {
        let mut reader = self.open(location, range).await?;
        let capacity = range.length.and_then(|l| usize::try_from(l).ok()).unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);
        reader.read_to_end(&mut data).await?;
        Ok(data)
    }
}

#[async_trait]
impl<P: DataAccessProvider + ?Sized> DataAccessProvider for Arc<P> {
    async fn open(&self, location: &DataLocation, range: ByteRange) -> Result<ByteReader> {
        (**self).open(location, range).await
    }

    async fn read(&self, location: &DataLocation, range: ByteRange) -> Result<Vec<u8>> {
        (**self).read(location, range).await
    }
}
