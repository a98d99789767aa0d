//! Metadata maintenance
//!
//! Older builds shipped a bare `<package>.sha256` checksum sidecar instead of a
//! JSON record. `migrate` creates the missing records from the packages
//! themselves; `cleanup_legacy` removes sidecars that are no longer needed and
//! records whose package is gone.

use super::inventory::{self, LEGACY_SIDECAR_EXT, PackageEntry};
use super::naming::PackageName;
use crate::core::config::PackageConfig;
use crate::core::error::{RailResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a metadata migration
#[derive(Debug, Default)]
pub struct MigrationReport {
  /// Records created (or that would be)
  pub created: Vec<PathBuf>,
  /// Legacy sidecars removed after comparison (or that would be)
  pub sidecars_removed: Vec<PathBuf>,
  /// Packages whose sidecar hash disagreed with the recomputed one
  pub mismatches: Vec<(PathBuf, String, String)>,
  pub failures: Vec<(PathBuf, String)>,
}

/// Outcome of a legacy cleanup
#[derive(Debug, Default)]
pub struct CleanupReport {
  /// Files removed (or that would be)
  pub removed: Vec<PathBuf>,
  pub failures: Vec<(PathBuf, String)>,
}

/// Create JSON records for packages that lack them
pub fn migrate(dirs: &[PathBuf], package: &PackageConfig, dry_run: bool) -> RailResult<MigrationReport> {
  let mut report = MigrationReport::default();

  for entry in inventory::scan_all(dirs, package)? {
    let record = entry.metadata_path();
    if record.is_file() {
      continue;
    }

    if dry_run {
      report.created.push(record);
      if entry.sidecar_path().is_file() {
        report.sidecars_removed.push(entry.sidecar_path());
      }
      continue;
    }

    let metadata = match entry.regenerate_metadata(package) {
      Ok(metadata) => metadata,
      Err(e) => {
        report.failures.push((entry.path.clone(), e.to_string()));
        continue;
      }
    };
    report.created.push(record);

    let sidecar = entry.sidecar_path();
    if !sidecar.is_file() {
      continue;
    }
    match read_sidecar(&sidecar) {
      Ok(Some(legacy)) if legacy != metadata.sha256 => {
        tracing::warn!("{}: legacy checksum differs from package", entry.path.display());
        report.mismatches.push((entry.path.clone(), legacy, metadata.sha256.clone()));
      }
      Ok(_) => {}
      Err(e) => tracing::warn!("{}", e),
    }
    match fs::remove_file(&sidecar) {
      Ok(()) => report.sidecars_removed.push(sidecar),
      Err(e) => report.failures.push((sidecar, e.to_string())),
    }
  }

  Ok(report)
}

/// Remove sidecars of packages that have JSON records, and orphaned records/sidecars
pub fn cleanup_legacy(dirs: &[PathBuf], package: &PackageConfig, dry_run: bool) -> RailResult<CleanupReport> {
  let mut report = CleanupReport::default();
  let mut seen: Vec<PathBuf> = Vec::new();

  for dir in dirs {
    if !dir.is_dir() {
      continue;
    }
    let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
    if seen.contains(&canonical) {
      continue;
    }
    seen.push(canonical);

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
      .with_context(|| format!("Failed to list {}", dir.display()))?
      .filter_map(|e| e.ok().map(|e| e.path()))
      .filter(|p| p.is_file())
      .collect();
    files.sort();

    for path in files {
      if should_remove(&path, package) {
        if dry_run {
          report.removed.push(path);
          continue;
        }
        match fs::remove_file(&path) {
          Ok(()) => report.removed.push(path),
          Err(e) => report.failures.push((path, e.to_string())),
        }
      }
    }
  }

  Ok(report)
}

/// Whether a file in an output directory is legacy or orphaned
fn should_remove(path: &Path, package: &PackageConfig) -> bool {
  let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
    return false;
  };
  let name = package.name();

  // <package>.sha256: remove once JSON exists or the package is gone
  if let Some(package_file) = file_name.strip_suffix(&format!(".{}", LEGACY_SIDECAR_EXT))
    && let Some(parsed) = PackageName::parse(package_file, &name, &package.extension)
  {
    let entry = PackageEntry {
      path: path.with_file_name(package_file),
      name: parsed,
    };
    return !entry.path.is_file() || entry.metadata_path().is_file();
  }

  // <base>.json: remove when no package has that base
  if let Some(base) = file_name.strip_suffix(".json") {
    let package_file = format!("{}.{}", base, package.extension);
    if PackageName::parse(&package_file, &name, &package.extension).is_some() {
      return !path.with_file_name(package_file).is_file();
    }
  }

  false
}

/// First token of a sidecar, lowercased
fn read_sidecar(path: &Path) -> RailResult<Option<String>> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(content.split_whitespace().next().map(|t| t.to_ascii_lowercase()))
}
