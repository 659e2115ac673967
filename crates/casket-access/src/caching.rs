//! Write-once disk cache in front of a remote provider
//!
//! The first request for a `(url, range)` pair streams the remote body to
//! `<file>.part` while handing the same bytes to the caller, and renames the
//! file once the body has been read to the end. Requests that arrive while
//! a transfer is running wait on the same per-file mutex and are served the
//! finished file. A reader dropped before the end removes its partial file
//! and the next request transfers again.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Result;
use crate::location::{ByteRange, ByteReader, DataLocation};
use crate::provider::DataAccessProvider;

type Locks = DashMap<PathBuf, Arc<Mutex<()>>>;
type PendingRename = Pin<Box<dyn Future<Output = io::Result<()>> + Send>>;

/// Caches remote ranges on disk
///
/// Entries are never evicted. Local path locations pass straight through
/// to the wrapped provider.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    cache_dir: PathBuf,
    locks: Arc<Locks>,
}

impl<P: DataAccessProvider> CachingProvider<P> {
    /// Cache `inner` under `cache_dir`
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// File a `(url, range)` pair is cached in
    ///
    /// The directory layout mirrors the URL: host (and port), then each
    /// path segment. Partial ranges add `.{start}-{end}` to the file name.
    pub fn cache_path(&self, url: &Url, range: ByteRange) -> PathBuf {
        let mut path = self.cache_dir.clone();
        let host = url.host_str().unwrap_or("localhost");
        match url.port() {
            Some(port) => path.push(format!("{host}_{port}")),
            None => path.push(host),
        }

        let segments: Vec<&str> = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect();
        let (name, dirs) = segments.split_last().map_or(("index", &[][..]), |(n, d)| (*n, d));
        path.extend(dirs);

        if range.is_full() {
            path.push(name);
        } else {
            let end = range
                .length
                .map(|length| (range.offset + length).to_string())
                .unwrap_or_default();
            path.push(format!("{name}.{}-{end}", range.offset));
        }
        path
    }

    async fn open_cached(path: &Path) -> Option<File> {
        match File::open(path).await {
            Ok(file) => Some(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file unreadable, transferring");
                None
            }
        }
    }
}

#[async_trait]
impl<P: DataAccessProvider> DataAccessProvider for CachingProvider<P> {
    async fn open(&self, location: &DataLocation, range: ByteRange) -> Result<ByteReader> {
        let DataLocation::Url(url) = location else {
            return self.inner.open(location, range).await;
        };
        if range.is_empty() {
            return Ok(Box::pin(tokio::io::empty()));
        }

        let path = self.cache_path(url, range);
        if let Some(file) = Self::open_cached(&path).await {
            trace!(%url, %range, "cache hit");
            return Ok(Box::pin(file));
        }

        let lock = Arc::clone(self.locks.entry(path.clone()).or_default().value());
        let guard = lock.lock_owned().await;

        // Another request may have completed the file while we waited
        if let Some(file) = Self::open_cached(&path).await {
            trace!(%url, %range, "cache hit after wait");
            return Ok(Box::pin(file));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let part = part_path(&path);
        let file = File::create(&part).await?;
        let inner = match self.inner.open(location, range).await {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };
        debug!(%url, %range, path = %path.display(), "cache miss, transferring");

        Ok(Box::pin(TeeReader {
            inner,
            file: Some(file),
            pending: Vec::new(),
            written: 0,
            part,
            path,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
            rename: None,
            eof: false,
            finished: false,
        }))
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Hands the caller every byte of `inner` and copies it to the partial file
///
/// Bytes read in one poll are written to the file before the next read, so
/// the file never runs ahead of what the caller has seen.
struct TeeReader {
    inner: ByteReader,
    file: Option<File>,
    pending: Vec<u8>,
    written: usize,
    part: PathBuf,
    path: PathBuf,
    locks: Arc<Locks>,
    guard: Option<OwnedMutexGuard<()>>,
    rename: Option<PendingRename>,
    eof: bool,
    finished: bool,
}

impl TeeReader {
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let Some(file) = self.file.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        while self.written < self.pending.len() {
            let n = ready!(Pin::new(&mut *file).poll_write(cx, &self.pending[self.written..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.written += n;
        }
        self.pending.clear();
        self.written = 0;
        Poll::Ready(Ok(()))
    }

    fn poll_finish(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.finished {
            return Poll::Ready(Ok(()));
        }
        if self.rename.is_none() {
            if let Some(file) = self.file.as_mut() {
                ready!(Pin::new(&mut *file).poll_flush(cx))?;
            }
            self.file = None;
            self.rename = Some(Box::pin(tokio::fs::rename(
                self.part.clone(),
                self.path.clone(),
            )));
        }
        if let Some(rename) = self.rename.as_mut() {
            let renamed = ready!(rename.as_mut().poll(cx));
            self.rename = None;
            renamed?;
        }
        self.finished = true;
        self.locks.remove(&self.path);
        self.guard = None;
        debug!(path = %self.path.display(), "cached");
        Poll::Ready(Ok(()))
    }
}

impl AsyncRead for TeeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        if this.eof {
            return this.poll_finish(cx);
        }

        let before = buf.filled().len();
        ready!(this.inner.as_mut().poll_read(cx, buf))?;
        let fresh = &buf.filled()[before..];
        if fresh.is_empty() && buf.remaining() > 0 {
            this.eof = true;
            return this.poll_finish(cx);
        }
        this.pending.extend_from_slice(fresh);
        Poll::Ready(Ok(()))
    }
}

impl Drop for TeeReader {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.file = None;
        debug!(path = %self.path.display(), "transfer abandoned");

        // The lock is held until the partial file is gone so a retry cannot
        // start writing a file that is about to be removed
        let part = std::mem::take(&mut self.part);
        let guard = self.guard.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = tokio::fs::remove_file(&part).await {
                        trace!(path = %part.display(), error = %e, "partial file not removed");
                    }
                    drop(guard);
                });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_file(&part) {
                    trace!(path = %part.display(), error = %e, "partial file not removed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::local::LocalProvider;
    use crate::remote::{RemoteConfig, RemoteProvider};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn body() -> Vec<u8> {
        (0..50_000u32).map(|i| (i % 253) as u8).collect()
    }

    async fn server(expected_requests: u64, delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(body())
                    .set_delay(delay),
            )
            .expect(expected_requests)
            .mount(&server)
            .await;
        server
    }

    fn caching(dir: &Path) -> CachingProvider<RemoteProvider> {
        CachingProvider::new(RemoteProvider::new(&RemoteConfig::default()).unwrap(), dir)
    }

    fn url(server: &MockServer) -> DataLocation {
        DataLocation::Url(format!("{}/tpr/wow/data/ab/cd/abcd", server.uri()).parse().unwrap())
    }

    #[tokio::test]
    async fn test_second_request_served_from_disk() {
        let server = server(1, Duration::ZERO).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = caching(dir.path());
        let location = url(&server);

        let first = provider.read(&location, ByteRange::full()).await.unwrap();
        let second = provider.read(&location, ByteRange::full()).await.unwrap();
        assert_eq!(first, body());
        assert_eq!(second, body());

        let DataLocation::Url(u) = &location else { unreachable!() };
        let cached = provider.cache_path(u, ByteRange::full());
        assert!(cached.ends_with("tpr/wow/data/ab/cd/abcd"));
        assert_eq!(std::fs::read(&cached).unwrap(), body());
        assert!(!part_path(&cached).exists());
    }

    #[tokio::test]
    async fn test_ranges_cached_separately() {
        let server = server(2, Duration::ZERO).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = caching(dir.path());
        let location = url(&server);

        let range = ByteRange::new(100, 20);
        assert_eq!(provider.read(&location, range).await.unwrap(), &body()[100..120]);
        assert_eq!(provider.read(&location, range).await.unwrap(), &body()[100..120]);
        assert_eq!(provider.read(&location, ByteRange::full()).await.unwrap().len(), 50_000);

        let DataLocation::Url(u) = &location else { unreachable!() };
        assert!(provider.cache_path(u, range).ends_with("abcd.100-120"));
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_one_transfer() {
        let server = server(1, Duration::from_millis(200)).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(caching(dir.path()));
        let location = url(&server);

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let location = location.clone();
                tokio::spawn(async move { provider.read(&location, ByteRange::full()).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), body());
        }
    }

    #[tokio::test]
    async fn test_dropped_reader_discards_partial_file() {
        let server = server(2, Duration::ZERO).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = caching(dir.path());
        let location = url(&server);
        let DataLocation::Url(u) = &location else { unreachable!() };
        let cached = provider.cache_path(u, ByteRange::full());

        let mut reader = provider.open(&location, ByteRange::full()).await.unwrap();
        let mut head = [0u8; 16];
        reader.read_exact(&mut head).await.unwrap();
        assert!(part_path(&cached).exists());
        drop(reader);
        for _ in 0..100 {
            if !part_path(&cached).exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!part_path(&cached).exists());
        assert!(!cached.exists());

        assert_eq!(provider.read(&location, ByteRange::full()).await.unwrap(), body());
        assert!(cached.exists());
    }

    #[tokio::test]
    async fn test_retry_waits_for_abandoned_transfer_cleanup() {
        let server = server(2, Duration::ZERO).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = caching(dir.path());
        let location = url(&server);
        let DataLocation::Url(u) = &location else { unreachable!() };
        let cached = provider.cache_path(u, ByteRange::full());

        let mut reader = provider.open(&location, ByteRange::full()).await.unwrap();
        let mut head = [0u8; 16];
        reader.read_exact(&mut head).await.unwrap();
        drop(reader);

        // No pause: the retry queues behind the removal of the old partial file
        assert_eq!(provider.read(&location, ByteRange::full()).await.unwrap(), body());
        assert_eq!(std::fs::read(&cached).unwrap(), body());
        assert!(!part_path(&cached).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reader_finishes_after_end_of_body() {
        let server = server(1, Duration::ZERO).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = caching(dir.path());
        let location = url(&server);
        let DataLocation::Url(u) = &location else { unreachable!() };
        let cached = provider.cache_path(u, ByteRange::full());

        let mut reader = provider.open(&location, ByteRange::full()).await.unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, body());
        assert_eq!(reader.read(&mut [0u8; 8]).await.unwrap(), 0);
        drop(reader);

        assert_eq!(std::fs::read(&cached).unwrap(), body());
        assert!(!part_path(&cached).exists());
    }

    #[tokio::test]
    async fn test_paths_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.000");
        std::fs::write(&file, b"local").unwrap();

        let provider = CachingProvider::new(LocalProvider::new(), dir.path().join("cache"));
        let data = provider
            .read(&DataLocation::Path(file), ByteRange::full())
            .await
            .unwrap();
        assert_eq!(data, b"local");
        assert!(!dir.path().join("cache").exists());
    }
}
