//! Byte-range access to local installations and CDN roots
//!
//! Archive resolution only ever needs "these bytes of that document". This
//! crate hides where the document lives behind [`DataAccessProvider`]:
//!
//! - [`LocalProvider`] seeks into files of a local installation
//! - [`RemoteProvider`] issues HTTP `Range` requests against a CDN root
//! - [`CachingProvider`] keeps a write-once disk copy of every remote range
//!
//! Readers are [`ByteReader`] streams; dropping one releases the file handle
//! or connection behind it.
//!
//! # Examples
//!
//! ```no_run
//! use casket_access::{ByteRange, DataAccessProvider, DataLocation, LocalProvider};
//!
//! # async fn example() -> casket_access::Result<()> {
//! let location = DataLocation::Path("World of Warcraft/Data/data/data.000".into());
//! let block = LocalProvider::new()
//!     .read(&location, ByteRange::new(30, 1024))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod caching;
pub mod cdn;
pub mod error;
pub mod local;
pub mod location;
pub mod provider;
pub mod remote;

pub use caching::CachingProvider;
pub use cdn::{cdn_config_url, cdn_data_url, cdn_index_url};
pub use error::{AccessError, Result};
pub use local::LocalProvider;
pub use location::{ByteRange, ByteReader, DataLocation};
pub use provider::DataAccessProvider;
pub use remote::{RemoteConfig, RemoteProvider};
