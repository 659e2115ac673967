//! Key types and hash primitives for CASC archive resolution
//!
//! This crate provides the value types and hash functions every other
//! `casket` crate builds on.
//!
//! # Components
//!
//! - **Keys**: [`Key`] (and its alias [`Checksum`]), an inline byte sequence of
//!   1 to 16 bytes used both as a storage key and as a content identifier
//! - **Hashing**: MD5 for content identifiers, Bob Jenkins' lookup2 and
//!   lookup3 hashes, and the 64-bit path hash used by root tables
//!
//! # Examples
//!
//! ## Content Keys
//!
//! ```
//! use casket_crypto::Key;
//!
//! let key = Key::from_data(b"Hello, World!");
//! assert_eq!(key.to_hex(), "65a8e27d8879283831b664bd8b7f0ad4");
//!
//! let prefix = key.truncate(9);
//! assert_eq!(prefix.len(), 9);
//! ```
//!
//! ## Path Hashing
//!
//! ```
//! use casket_crypto::name_hash;
//!
//! assert_eq!(name_hash("foo/bar.dbc"), name_hash("FOO\\BAR.DBC"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod jenkins;
pub mod key;
pub mod name;

pub use error::CryptoError;

// Re-export commonly used types
pub use jenkins::{Jenkins96, hashlittle, hashlittle2, jenkins_hash};
pub use key::{Checksum, Key, MAX_KEY_LENGTH, md5_digest};
pub use name::{name_hash, normalize_name};
