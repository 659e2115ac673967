//! Byte-format decoders for CASC archive resolution
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate decodes every document the resolver reads on its way from a
//! file name to file content, and provides a builder for each of them so
//! fixtures are produced from the same layout definitions.
//!
//! # Supported Formats
//!
//! - **BLTE**: chunked, per-chunk checksummed container around stored blocks
//! - **Encoding**: content checksum to storage keys table
//! - **Root**: name hash and file id to content checksum table
//! - **Archive**: CDN `.index` documents listing the blocks of an archive
//! - **Local index**: installation `.idx` documents with 9-byte key prefixes
//! - **Config**: build configuration, CDN configuration and `.build.info`
//!
//! # Examples
//!
//! ```
//! use casket_formats::blte::{self, BlteBuilder, CompressionMode};
//!
//! let data = BlteBuilder::new()
//!     .add_chunked(b"hello, container", 8, CompressionMode::ZLib)
//!     .build()
//!     .unwrap();
//! assert_eq!(blte::decode_bytes(&data).unwrap(), b"hello, container");
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod blte;
pub mod config;
pub mod encoding;
pub mod local_index;
pub mod root;
