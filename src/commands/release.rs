//! Release command: the full workflow

use crate::core::context::WorkflowContext;
use crate::core::error::RailResult;
use crate::release::ReleaseOrchestrator;
use crate::release::orchestrator::StepRecord;

/// Run the release workflow
pub fn run_release(ctx: &WorkflowContext) -> RailResult<()> {
  let report = ReleaseOrchestrator::new(ctx.clone()).run()?;
  tracing::debug!("release workflow finished: {:?}", report.state);

  if report.dry_run {
    let stops: Vec<&StepRecord> = report
      .records
      .iter()
      .filter(|r| r.summary.starts_with("would stop"))
      .collect();
    if !stops.is_empty() {
      println!("\n🔍 A real run would stop at: {}", stops[0].step);
    }
  }

  if !report.warnings.is_empty() {
    println!("\n⚠️  {} warning(s):", report.warnings.len());
    for warning in &report.warnings {
      println!("   - {}", warning);
    }
  }

  if !report.dry_run
    && let Some(version) = report.version
  {
    println!();
    println!("Next steps:");
    if !ctx.options.push {
      println!(
        "  git push {} {} {}",
        ctx.config.git.remote,
        ctx.release_branch(&version),
        ctx.tag_name(&version)
      );
    }
    if let Some(built) = &report.package {
      println!("  Distribute {}", built.package.display());
    }
  }
  Ok(())
}
