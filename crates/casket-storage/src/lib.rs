//! Name-to-content resolution over CASC archives
//!
//! An [`ArchiveContext`] turns a file name into file content by walking the
//! tables of one build:
//!
//! - the root table maps the name hash to a content checksum
//! - the encoding table maps the checksum to one or more storage keys
//! - the archive index maps each storage key to a block in a data archive
//! - each block is a BLTE container that decodes to part of the file
//!
//! Two backends provide the bytes. [`LocalArchive`] reads an installation
//! on disk (`.build.info`, `Data/config`, `Data/data`). [`RemoteArchive`]
//! reads a CDN root over HTTP, optionally through a disk cache.
//!
//! # Example
//!
//! ```no_run
//! use casket_storage::{ContextConfig, Locale, LocalContext};
//!
//! # async fn example() -> casket_storage::Result<()> {
//! let context = LocalContext::open_local(
//!     "/games/World of Warcraft",
//!     ContextConfig::default().with_locale(Locale::EnUs),
//! );
//!
//! if let Some(data) = context.resolve_by_name("DBFilesClient\\Item.dbc").await? {
//!     println!("Item.dbc: {} bytes", data.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

// Where blocks come from
pub mod backend;

pub mod config;

// Resolution pipeline
pub mod context;

pub mod error;

// Storage key to block location
pub mod index;

// Build bootstrap
pub mod metadata;

pub use backend::{ArchiveBackend, LOCAL_BLOCK_HEADER_SIZE, LocalArchive, MetadataSource, RemoteArchive};
pub use casket_access::RemoteConfig;
pub use casket_formats::root::{Locale, LocaleFlags};
pub use config::ContextConfig;
pub use context::{ArchiveContext, ArchiveTables, ContextState, LocalContext, RemoteContext};
pub use error::{Result, StorageError};
pub use index::{Index, IndexEntry};
pub use metadata::BuildMetadata;
