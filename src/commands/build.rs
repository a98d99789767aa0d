//! Package build command

use crate::checks::{CheckInput, create_default_gate};
use crate::core::context::WorkflowContext;
use crate::core::error::RailResult;
use crate::package::{BuildKind, BuiltPackage, DevRetentionPolicy, PackageBuilder};
use crate::version::Version;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Build one package; `None` in dry-run
///
/// With `--run-tests` the validation gate (including the test suite) runs first.
pub fn run_build(ctx: &WorkflowContext, version: &Version, kind: BuildKind) -> RailResult<Option<BuiltPackage>> {
  if ctx.options.run_tests && !ctx.options.skip_validation {
    run_validation(ctx)?;
  }

  let builder = PackageBuilder::from_context(ctx);
  if ctx.options.dry_run {
    let output = builder.output_path(version, kind, ctx.clock.now());
    println!("🔍 Would build {} package: {}", kind, output.display());
    return Ok(None);
  }

  println!("📦 Building {} package v{}...", kind, version);
  let built = builder.build_project(version, kind)?;
  for warning in &built.warnings {
    eprintln!("⚠️  {}", warning);
  }
  built.print_summary();

  println!("\n✅ Package created: {}", built.package.display());
  println!("🔐 SHA-256: {}", built.metadata.sha256);
  if let Some(path) = &built.metadata_path {
    println!("📝 Metadata: {}", path.display());
  }
  Ok(Some(built))
}

fn run_validation(ctx: &WorkflowContext) -> RailResult<()> {
  let gate = create_default_gate(&ctx.config, true);
  if ctx.options.dry_run {
    println!("🔍 Would run checks:");
    for (name, description) in gate.describe() {
      println!("   - {}: {}", name, description);
    }
    return Ok(());
  }

  println!("🔎 Running validation...");
  let report = gate.run(CheckInput {
    root: ctx.root.clone(),
    document: ctx.document_path(),
    config: Arc::clone(&ctx.config),
    runner: Arc::clone(&ctx.runner),
    cancel: Arc::new(AtomicBool::new(false)),
  })?;
  report.print();
  report.into_result()?;
  Ok(())
}

/// Prune development builds down to the retention count
pub fn run_retention(ctx: &WorkflowContext) -> RailResult<()> {
  let keep = ctx.retain_dev();
  let report = DevRetentionPolicy::from_context(ctx).prune(keep)?;
  report.print();
  Ok(())
}
