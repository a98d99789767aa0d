//! Development build retention
//!
//! Keeps the K most recent development packages. Retained packages missing a
//! metadata record get one regenerated; pruned packages lose their record and
//! any legacy checksum sidecar too. Per-file failures are collected, never
//! fatal to the rest of the pass.

use super::inventory::{self, PackageEntry};
use crate::core::config::PackageConfig;
use crate::core::context::WorkflowContext;
use crate::core::error::RailResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one retention pass
#[derive(Debug, Default)]
pub struct PruneReport {
  pub kept: Vec<PathBuf>,
  /// Files removed (or that would be, in dry-run)
  pub removed: Vec<PathBuf>,
  /// Metadata records regenerated for kept packages (or that would be)
  pub regenerated: Vec<PathBuf>,
  pub failures: Vec<(PathBuf, String)>,
  pub dry_run: bool,
}

impl PruneReport {
  pub fn print(&self) {
    let verb = if self.dry_run { "Would remove" } else { "Removed" };
    for path in &self.removed {
      println!("   🗑️  {} {}", verb, display_name(path));
    }
    let verb = if self.dry_run { "Would regenerate" } else { "Regenerated" };
    for path in &self.regenerated {
      println!("   📝 {} {}", verb, display_name(path));
    }
    for (path, reason) in &self.failures {
      eprintln!("   ⚠️  Could not process {}: {}", display_name(path), reason);
    }
    println!("🧹 Keeping {} development build(s)", self.kept.len());
  }
}

fn display_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

/// Retention over one development output directory
pub struct DevRetentionPolicy {
  dev_dir: PathBuf,
  package: PackageConfig,
  dry_run: bool,
}

impl DevRetentionPolicy {
  pub fn new(dev_dir: &Path, package: PackageConfig, dry_run: bool) -> Self {
    Self {
      dev_dir: dev_dir.to_path_buf(),
      package,
      dry_run,
    }
  }

  pub fn from_context(ctx: &WorkflowContext) -> Self {
    Self::new(&ctx.dev_dir(), ctx.config.package.clone(), ctx.options.dry_run)
  }

  /// Development packages, newest first
  pub fn list(&self) -> RailResult<Vec<PackageEntry>> {
    inventory::scan_dev(&self.dev_dir, &self.package)
  }

  /// Keep the `keep` newest development packages and remove the rest
  pub fn prune(&self, keep: usize) -> RailResult<PruneReport> {
    let entries = self.list()?;
    let mut report = PruneReport {
      dry_run: self.dry_run,
      ..Default::default()
    };

    let split = keep.min(entries.len());
    let (retained, expired) = entries.split_at(split);

    for entry in retained {
      report.kept.push(entry.path.clone());
      let record = entry.metadata_path();
      if record.is_file() {
        continue;
      }
      if self.dry_run {
        report.regenerated.push(record);
        continue;
      }
      match entry.regenerate_metadata(&self.package) {
        Ok(_) => report.regenerated.push(record),
        Err(e) => report.failures.push((record, e.to_string())),
      }
    }

    for entry in expired {
      self.expire(entry, &mut report);
    }

    Ok(report)
  }

  /// Remove one package, then its record and legacy sidecar
  ///
  /// A package that could not be removed keeps its record.
  fn expire(&self, entry: &PackageEntry, report: &mut PruneReport) {
    let companions: Vec<PathBuf> = [entry.metadata_path(), entry.sidecar_path()]
      .into_iter()
      .filter(|p| p.exists())
      .collect();

    if self.dry_run {
      report.removed.push(entry.path.clone());
      report.removed.extend(companions);
      return;
    }

    if let Err(e) = fs::remove_file(&entry.path) {
      report.failures.push((entry.path.clone(), e.to_string()));
      return;
    }
    tracing::debug!("removed {}", entry.path.display());
    report.removed.push(entry.path.clone());

    for path in companions {
      match fs::remove_file(&path) {
        Ok(()) => report.removed.push(path),
        Err(e) => report.failures.push((path, e.to_string())),
      }
    }
  }
}
