//! CDN archive index (`.index`) documents
//!
//! Each remote archive has an index listing the blocks it stores. The
//! document is a run of fixed-size pages of `(key, size, offset)` records,
//! a table of contents and a footer describing the field widths.

mod builder;
mod error;
mod footer;
mod index;

pub use builder::ArchiveIndexBuilder;
pub use error::IndexError;
pub use footer::{FOOTER_FIXED_SIZE, IndexFooter};
pub use index::{ArchiveIndex, ArchiveIndexRecord};
