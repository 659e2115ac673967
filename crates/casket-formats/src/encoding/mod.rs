//! Encoding table: content checksums to encoding keys
//!
//! Resolution only needs the content key half of the table. Its layout:
//!
//! ```text
//! header (22 bytes, BE) | espec strings | ckey page index | ckey pages | ekey ...
//! ```
//!
//! Each content key page holds records of `key_count u8, size u40 BE,
//! ckey, key_count x ekey`; a zero key count ends the page.

mod builder;
mod entry;
mod error;
mod header;
mod table;

pub use builder::EncodingBuilder;
pub use entry::EncodingEntry;
pub use error::EncodingError;
pub use header::{ENCODING_HEADER_SIZE, EncodingHeader, PAGE_INDEX_ENTRY_SIZE};
pub use table::{EncodingTable, PageInfo};
