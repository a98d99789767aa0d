//! Packages already on disk
//!
//! Scans output directories for files following the package naming
//! convention. Anything that does not parse is left alone.

use super::metadata::PackageMetadata;
use super::naming::{BuildKind, PackageName};
use crate::core::config::PackageConfig;
use crate::core::error::{RailResult, ResultExt};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the legacy checksum sidecar (`<package file>.sha256`)
pub const LEGACY_SIDECAR_EXT: &str = "sha256";

/// A package file and its decoded name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
  pub path: PathBuf,
  pub name: PackageName,
}

impl PackageEntry {
  pub fn file_name(&self) -> String {
    self.name.file_name()
  }

  pub fn metadata_path(&self) -> PathBuf {
    PackageMetadata::path_for(&self.path)
  }

  pub fn sidecar_path(&self) -> PathBuf {
    sidecar_path(&self.path)
  }

  /// Metadata record, if present and parseable
  pub fn read_metadata(&self) -> Option<PackageMetadata> {
    let path = self.metadata_path();
    if !path.is_file() {
      return None;
    }
    match PackageMetadata::read(&path) {
      Ok(metadata) => Some(metadata),
      Err(e) => {
        tracing::warn!("ignoring unreadable metadata {}: {}", path.display(), e);
        None
      }
    }
  }

  /// Build time: from the file name for development builds, else file mtime
  pub fn created_at(&self) -> RailResult<DateTime<Utc>> {
    if let Some(at) = self.name.timestamp {
      return Ok(at);
    }
    let modified = fs::metadata(&self.path)
      .and_then(|m| m.modified())
      .with_context(|| format!("Failed to read modification time of {}", self.path.display()))?;
    Ok(DateTime::<Utc>::from(modified))
  }

  /// Recompute and write the metadata record from the package alone
  pub fn regenerate_metadata(&self, package: &PackageConfig) -> RailResult<PackageMetadata> {
    let metadata = PackageMetadata::from_package(
      &self.path,
      &self.name.version.to_string(),
      self.name.kind,
      self.created_at()?,
      &package.compatibility,
      &package.description,
    )?;
    metadata.write(&self.metadata_path())?;
    Ok(metadata)
  }
}

/// `<package file>.sha256`
pub fn sidecar_path(package: &Path) -> PathBuf {
  let mut name = package.as_os_str().to_os_string();
  name.push(".");
  name.push(LEGACY_SIDECAR_EXT);
  PathBuf::from(name)
}

/// Newest first: timestamp descending, then file name descending
pub fn newest_first(a: &PackageEntry, b: &PackageEntry) -> Ordering {
  b.name
    .timestamp
    .cmp(&a.name.timestamp)
    .then_with(|| b.file_name().cmp(&a.file_name()))
}

/// Packages named for `package` directly inside `dir` (missing dir = none)
pub fn scan(dir: &Path, package: &PackageConfig) -> RailResult<Vec<PackageEntry>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let name = package.name();
  let mut entries = Vec::new();
  for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
    let entry = entry?;
    let path = entry.path();
    if !path.is_file() {
      continue;
    }
    if let Some(parsed) = PackageName::parse_path(&path, &name, &package.extension) {
      entries.push(PackageEntry { path, name: parsed });
    }
  }
  entries.sort_by(newest_first);
  Ok(entries)
}

/// Development packages in `dir`, newest first
pub fn scan_dev(dir: &Path, package: &PackageConfig) -> RailResult<Vec<PackageEntry>> {
  Ok(
    scan(dir, package)?
      .into_iter()
      .filter(|e| e.name.kind == BuildKind::Development)
      .collect(),
  )
}

/// Packages across several directories, each directory scanned once
pub fn scan_all(dirs: &[PathBuf], package: &PackageConfig) -> RailResult<Vec<PackageEntry>> {
  let mut seen: Vec<PathBuf> = Vec::new();
  let mut entries = Vec::new();
  for dir in dirs {
    let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
    if seen.contains(&canonical) {
      continue;
    }
    seen.push(canonical);
    entries.extend(scan(dir, package)?);
  }
  entries.sort_by(newest_first);
  Ok(entries)
}
