//! Package metadata records
//!
//! One JSON record per package, same base name, `.json` extension. Size and
//! hash are always recomputed from the package itself, so a record can be
//! regenerated from the archive alone.

use super::naming::BuildKind;
use crate::core::error::{PackageError, RailError, RailResult, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Hashing block size
const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Metadata for one built package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
  pub version: String,
  pub build_kind: BuildKind,
  pub created_at: DateTime<Utc>,
  /// Package file name (no directory)
  pub package_file: String,
  pub size_bytes: u64,
  /// Lowercase hex SHA-256 of the package
  pub sha256: String,
  pub compatibility: String,
  pub description: String,
}

impl PackageMetadata {
  /// Build a record for the package at `package`, recomputing its size and hash
  pub fn from_package(
    package: &Path,
    version: &str,
    build_kind: BuildKind,
    created_at: DateTime<Utc>,
    compatibility: &str,
    description: &str,
  ) -> RailResult<Self> {
    let digest = hash_file(package)?;
    Self::with_digest(package, digest, version, build_kind, created_at, compatibility, description)
  }

  /// Build a record from a size and hash computed before the package reached `package`
  pub fn with_digest(
    package: &Path,
    (size_bytes, sha256): (u64, String),
    version: &str,
    build_kind: BuildKind,
    created_at: DateTime<Utc>,
    compatibility: &str,
    description: &str,
  ) -> RailResult<Self> {
    let package_file = package
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .ok_or_else(|| RailError::message(format!("Package path has no file name: {}", package.display())))?;

    Ok(Self {
      version: version.to_string(),
      build_kind,
      created_at,
      package_file,
      size_bytes,
      sha256,
      compatibility: compatibility.to_string(),
      description: description.to_string(),
    })
  }

  /// Record path for a package path
  pub fn path_for(package: &Path) -> PathBuf {
    package.with_extension("json")
  }

  /// Write the record next to the package
  ///
  /// Failure is `MetadataWriteFailed`: the package itself stays valid.
  pub fn write(&self, path: &Path) -> RailResult<()> {
    let json = serde_json::to_string_pretty(self)?;
    fs::write(path, format!("{}\n", json)).map_err(|e| {
      RailError::Package(PackageError::MetadataWriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })
  }

  pub fn read(path: &Path) -> RailResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read metadata {}", path.display()))?;
    let metadata = serde_json::from_str(&content)?;
    Ok(metadata)
  }
}

/// Size and SHA-256 of a file, streamed in fixed-size blocks
pub fn hash_file(path: &Path) -> RailResult<(u64, String)> {
  let file = File::open(path).with_context(|| format!("Failed to open {} for hashing", path.display()))?;
  let mut reader = BufReader::new(file);
  let mut hasher = Sha256::new();
  let mut buffer = vec![0u8; HASH_BLOCK_SIZE];
  let mut size = 0u64;

  loop {
    let read = reader.read(&mut buffer)?;
    if read == 0 {
      break;
    }
    hasher.update(&buffer[..read]);
    size += read as u64;
  }

  Ok((size, hex::encode(hasher.finalize())))
}
