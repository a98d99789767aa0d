//! CLI commands for mpkg-rail
//!
//! ## Maintenance (run first, short-circuit everything else)
//! - **list**: show release and development packages with their metadata
//! - **migrate**: create JSON records for packages that only have legacy sidecars
//! - **cleanup**: remove legacy sidecars and orphaned records
//!
//! ## Release
//! - **release**: the full workflow (see `release::orchestrator`)
//!
//! ## Build & Git steps
//! - **build**: release or development package, then retention for dev builds
//! - **git**: individual branch / commit / tag steps
//!
//! All commands take the `WorkflowContext` built once in `main`.

pub mod build;
pub mod git;
pub mod maintenance;
pub mod release;

use crate::core::context::WorkflowContext;
use crate::core::error::{RailError, RailResult};
use crate::package::BuildKind;
use crate::version::{Version, VersionResolver};

/// Actions requested on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct Actions {
  pub release: bool,
  pub dev: bool,
  pub git_branch: bool,
  pub git_commit: bool,
  pub git_tag: bool,
  pub list: bool,
  pub migrate_metadata: bool,
  pub cleanup_legacy: bool,
}

impl Actions {
  fn maintenance(&self) -> bool {
    self.list || self.migrate_metadata || self.cleanup_legacy
  }

  fn git_steps(&self) -> bool {
    self.git_branch || self.git_commit || self.git_tag
  }
}

/// Dispatch in fixed order: maintenance, release, build, git steps
pub fn run(ctx: &mut WorkflowContext, actions: Actions) -> RailResult<()> {
  if actions.maintenance() {
    if actions.list {
      maintenance::run_list(ctx)?;
    }
    if actions.migrate_metadata {
      maintenance::run_migrate(ctx)?;
    }
    if actions.cleanup_legacy {
      maintenance::run_cleanup(ctx)?;
    }
    return Ok(());
  }

  if actions.release {
    return release::run_release(ctx);
  }

  // No action flags: plain release package
  let build_kind = if actions.dev {
    Some(BuildKind::Development)
  } else if !actions.git_steps() {
    Some(BuildKind::Release)
  } else {
    None
  };

  let version = resolve_version(ctx)?;

  let built = match build_kind {
    Some(kind) => build::run_build(ctx, &version, kind)?,
    None => None,
  };

  if actions.git_branch {
    git::run_branch(ctx, &version)?;
  }
  if actions.git_commit {
    match (&built, actions.dev) {
      (Some(package), true) => git::run_dev_commit(ctx, &version, package)?,
      (None, true) => println!("🔍 Would commit the development build to the highest release branch"),
      _ => git::run_commit(ctx, &version)?,
    }
  }
  if actions.git_tag {
    git::run_tag(ctx, &version)?;
  }

  if actions.dev {
    build::run_retention(ctx)?;
  }
  Ok(())
}

/// Resolve the working version once and store it in the context
///
/// Inconsistency between the documents is a warning unless `--strict-version`.
pub fn resolve_version(ctx: &mut WorkflowContext) -> RailResult<Version> {
  if let Some(version) = ctx.version {
    return Ok(version);
  }

  let resolver = VersionResolver::from_context(ctx)?;
  let (version, source) = resolver.resolve_with_source(ctx.options.explicit_version.as_deref())?;
  println!("🔢 Version: {} (from {})", version, source);

  let report = resolver.consistency_report(&version);
  if let Some(error) = report.to_error() {
    if ctx.options.strict_version {
      return Err(RailError::Version(error));
    }
    for detail in report.details() {
      eprintln!("⚠️  Version {}: {}", version, detail);
    }
  }

  ctx.version = Some(version);
  Ok(version)
}
