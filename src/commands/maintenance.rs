//! Maintenance commands: `--list`, `--migrate-metadata`, `--cleanup-legacy`

use crate::core::context::WorkflowContext;
use crate::core::error::RailResult;
use crate::package::inventory;
use crate::package::migrate;
use crate::utils::{format_count, format_mb};
use std::path::{Path, PathBuf};

fn output_dirs(ctx: &WorkflowContext) -> Vec<PathBuf> {
  vec![ctx.release_dir(), ctx.dev_dir()]
}

fn display_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

/// List packages, newest first, with their metadata
pub fn run_list(ctx: &WorkflowContext) -> RailResult<()> {
  let entries = inventory::scan_all(&output_dirs(ctx), &ctx.config.package)?;
  if entries.is_empty() {
    println!(
      "📭 No packages found in {} or {}",
      ctx.release_dir().display(),
      ctx.dev_dir().display()
    );
    return Ok(());
  }

  println!("📦 {} package(s):", entries.len());
  for entry in &entries {
    println!("\n   {}", entry.file_name());
    match entry.read_metadata() {
      Some(metadata) => {
        println!("      version:  {} ({})", metadata.version, metadata.build_kind);
        println!(
          "      size:     {} bytes ({})",
          format_count(metadata.size_bytes),
          format_mb(metadata.size_bytes)
        );
        println!("      created:  {}", metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("      sha256:   {}", metadata.sha256);
      }
      None => {
        println!("      version:  {} ({})", entry.name.version, entry.name.kind);
        println!("      (no metadata)");
      }
    }
  }
  Ok(())
}

pub fn run_migrate(ctx: &WorkflowContext) -> RailResult<()> {
  let dry_run = ctx.options.dry_run;
  let report = migrate::migrate(&output_dirs(ctx), &ctx.config.package, dry_run)?;

  let verb = if dry_run { "Would create" } else { "Created" };
  for path in &report.created {
    println!("   📝 {} {}", verb, display_name(path));
  }
  let verb = if dry_run { "Would remove" } else { "Removed" };
  for path in &report.sidecars_removed {
    println!("   🗑️  {} {}", verb, display_name(path));
  }
  for (path, legacy, actual) in &report.mismatches {
    eprintln!(
      "⚠️  {}: legacy checksum {} does not match package ({})",
      display_name(path),
      legacy,
      actual
    );
  }
  for (path, reason) in &report.failures {
    eprintln!("⚠️  Could not migrate {}: {}", display_name(path), reason);
  }

  if report.created.is_empty() {
    println!("✅ Every package already has a metadata record");
  } else {
    println!("✅ {} metadata record(s) {}", report.created.len(), if dry_run { "to create" } else { "created" });
  }
  Ok(())
}

pub fn run_cleanup(ctx: &WorkflowContext) -> RailResult<()> {
  let dry_run = ctx.options.dry_run;
  let report = migrate::cleanup_legacy(&output_dirs(ctx), &ctx.config.package, dry_run)?;

  let verb = if dry_run { "Would remove" } else { "Removed" };
  for path in &report.removed {
    println!("   🗑️  {} {}", verb, display_name(path));
  }
  for (path, reason) in &report.failures {
    eprintln!("⚠️  Could not remove {}: {}", display_name(path), reason);
  }
  println!("🧹 {} legacy file(s) {}", report.removed.len(), if dry_run { "to remove" } else { "removed" });
  Ok(())
}
