//! Build configuration, CDN configuration and `.build.info` documents
//!
//! These are the text entry points of an installation: `.build.info`
//! names the active build, the build configuration references the
//! encoding and root tables, and the CDN configuration lists the archives.

mod build_config;
mod build_info;
mod cdn_config;
mod document;
mod error;

pub use build_config::BuildConfig;
pub use build_info::{BuildInfo, BuildInfoRow};
pub use cdn_config::CdnConfig;
pub use document::ConfigDocument;
pub use error::ConfigError;
