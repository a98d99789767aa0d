//! Package construction, naming, metadata and development build retention
//!
//! # Layout
//!
//! - **builder**: archive assembly with a scoped working directory
//! - **descriptor**: generated `config.lua`
//! - **metadata**: JSON records and streamed SHA-256
//! - **naming**: release / development file names and their parsing
//! - **inventory**: packages already on disk
//! - **retention**: keep the K newest development builds
//! - **migrate**: legacy checksum sidecar migration and cleanup

pub mod builder;
pub mod descriptor;
pub mod inventory;
pub mod metadata;
pub mod migrate;
pub mod naming;
pub mod retention;

pub use builder::{BuiltPackage, PackageBuilder};
pub use naming::BuildKind;
pub use retention::DevRetentionPolicy;
