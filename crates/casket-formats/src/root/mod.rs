//! Root table: name hashes and file ids to content checksums
//!
//! Three generations of the table are understood:
//!
//! - headerless tables with 12-byte block headers and interleaved
//!   `ckey, name_hash` records
//! - `MFST`/`TSFM` tables (classic 12-byte or extended 24-byte header) with
//!   17-byte block headers and separated id, ckey and name hash arrays
//! - version 4 tables whose block headers carry 40-bit content flags
//!
//! Blocks flagged `NO_NAME_HASH` omit the name hash array and can only be
//! resolved by file id.

mod builder;
mod entry;
mod error;
mod flags;
mod header;
mod table;

pub use builder::{RootBuilder, RootRecord};
pub use entry::RootEntry;
pub use error::{Result, RootError};
pub use flags::{ContentFlags, Locale, LocaleFlags};
pub use header::{CLASSIC_HEADER_SIZE, EXTENDED_HEADER_SIZE, RootHeader, RootMagic, RootVersion};
pub use table::RootTable;
