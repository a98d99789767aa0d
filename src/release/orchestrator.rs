//! Release workflow state machine
//!
//! ```text
//! Init -> Validated -> VersionUpdated -> Branched -> Committed -> Packaged -> Tagged -> (Pushed) -> Done
//!   \__________________________________ any step ______________________________________/
//!                                           |
//!                                      Failed(step)
//! ```
//!
//! Steps run strictly in order and are never retried. A hard failure leaves the
//! repository as it is (no rollback) and moves the machine to `Failed(step)`.
//! In dry-run every step makes its decision with read-only queries and prints
//! what it would do; hard stops become printed intentions and the run always
//! reaches `Done`.

use super::branch::{BranchManager, BranchOutcome, MergeOutcome};
use super::commit::{ChangeCommitter, CommitOutcome};
use super::tag::{TagManager, TagOutcome};
use crate::checks::{CheckInput, ValidationGate, create_default_gate};
use crate::core::context::WorkflowContext;
use crate::core::error::{GitError, RailError, RailResult, VersionError};
use crate::package::{BuildKind, BuiltPackage, PackageBuilder};
use crate::version::{Version, VersionResolver};
use std::fmt;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// One step of the release workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  ResolveVersion,
  CleanTree,
  Validate,
  UpdateVersion,
  Branch,
  Commit,
  MergeMainline,
  Package,
  Tag,
  Push,
}

impl Step {
  /// State reached when the step succeeds (`None`: no state change)
  fn target(self) -> Option<WorkflowState> {
    match self {
      Step::ResolveVersion | Step::MergeMainline => None,
      Step::CleanTree | Step::Validate => Some(WorkflowState::Validated),
      Step::UpdateVersion => Some(WorkflowState::VersionUpdated),
      Step::Branch => Some(WorkflowState::Branched),
      Step::Commit => Some(WorkflowState::Committed),
      Step::Package => Some(WorkflowState::Packaged),
      Step::Tag => Some(WorkflowState::Tagged),
      Step::Push => Some(WorkflowState::Pushed),
    }
  }

  fn needs_version(self) -> bool {
    !matches!(self, Step::CleanTree | Step::Validate)
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Step::ResolveVersion => "resolve version",
      Step::CleanTree => "clean tree check",
      Step::Validate => "validation",
      Step::UpdateVersion => "update version",
      Step::Branch => "release branch",
      Step::Commit => "release commit",
      Step::MergeMainline => "mainline merge",
      Step::Package => "package build",
      Step::Tag => "release tag",
      Step::Push => "push",
    };
    write!(f, "{}", label)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
  Init,
  Validated,
  VersionUpdated,
  Branched,
  Committed,
  Packaged,
  Tagged,
  Pushed,
  Done,
  /// Absorbing: the named step failed
  Failed(Step),
}

/// What one step did (or would have done)
#[derive(Debug, Clone)]
pub struct StepRecord {
  pub step: Step,
  pub summary: String,
}

/// Result of a completed run
#[derive(Debug)]
pub struct WorkflowReport {
  pub state: WorkflowState,
  pub version: Option<Version>,
  pub records: Vec<StepRecord>,
  pub package: Option<BuiltPackage>,
  /// Non-fatal conditions (inconsistent versions, failed merge, metadata write)
  pub warnings: Vec<String>,
  pub dry_run: bool,
}

/// Sequencer for the full release workflow
pub struct ReleaseOrchestrator {
  ctx: WorkflowContext,
  gate: Option<ValidationGate>,
  state: WorkflowState,
  records: Vec<StepRecord>,
  warnings: Vec<String>,
  package: Option<BuiltPackage>,
}

impl ReleaseOrchestrator {
  pub fn new(ctx: WorkflowContext) -> Self {
    Self {
      ctx,
      gate: None,
      state: WorkflowState::Init,
      records: Vec::new(),
      warnings: Vec::new(),
      package: None,
    }
  }

  /// Use `gate` instead of the built-in checks
  #[cfg(test)]
  pub fn with_gate(mut self, gate: ValidationGate) -> Self {
    self.gate = Some(gate);
    self
  }

  #[cfg(test)]
  pub fn state(&self) -> WorkflowState {
    self.state
  }

  /// Steps this run will take, after skip flags and configuration
  pub fn plan(&self) -> Vec<Step> {
    let options = &self.ctx.options;
    let mut steps = vec![Step::ResolveVersion];
    if !options.skip_git_check {
      steps.push(Step::CleanTree);
    }
    if !options.skip_validation {
      steps.push(Step::Validate);
    }
    steps.extend([Step::UpdateVersion, Step::Branch, Step::Commit]);
    if self.ctx.config.git.merge_to_mainline {
      steps.push(Step::MergeMainline);
    }
    steps.extend([Step::Package, Step::Tag]);
    if options.push {
      steps.push(Step::Push);
    }
    steps
  }

  fn dry_run(&self) -> bool {
    self.ctx.options.dry_run
  }

  /// Run every planned step in order
  pub fn run(mut self) -> RailResult<WorkflowReport> {
    let steps = self.plan();
    if self.dry_run() {
      println!("🔍 Dry-run mode (no changes will be made)\n");
    }
    println!("🚀 Release workflow: {} step(s)", steps.len());

    for step in steps {
      if self.dry_run() && step.needs_version() && step != Step::ResolveVersion && self.ctx.version.is_none() {
        self.record(step, "skipped: no version".to_string());
        continue;
      }

      // Read-only queries can fail too (no repository, unreadable refs)
      let result = match self.run_step(step) {
        Err(e) if self.dry_run() => self.stop(e),
        other => other,
      };
      match result {
        Ok(summary) => {
          self.record(step, summary);
          if let Some(next) = step.target() {
            self.state = next;
          }
        }
        Err(e) => {
          self.state = WorkflowState::Failed(step);
          eprintln!("\n❌ Release stopped at step: {}", step);
          if !self.records.is_empty() {
            let done: Vec<String> = self.records.iter().map(|r| r.step.to_string()).collect();
            eprintln!("   Completed: {}", done.join(", "));
          }
          eprintln!("   Nothing was rolled back.");
          return Err(e);
        }
      }
    }

    self.state = WorkflowState::Done;
    if self.dry_run() {
      println!("\n🔍 Dry run complete; repository and outputs untouched");
    } else if let Some(version) = &self.ctx.version {
      println!("\n✅ Release v{} complete", version);
    }

    Ok(WorkflowReport {
      state: self.state,
      version: self.ctx.version,
      records: self.records,
      package: self.package,
      warnings: self.warnings,
      dry_run: self.ctx.options.dry_run,
    })
  }

  fn record(&mut self, step: Step, summary: String) {
    println!("   {} {}: {}", if self.dry_run() { "🔍" } else { "✅" }, step, summary);
    self.records.push(StepRecord { step, summary });
  }

  fn warn(&mut self, message: String) {
    eprintln!("   ⚠️  {}", message);
    tracing::warn!("{}", message);
    self.warnings.push(message);
  }

  /// A hard stop: an error normally, a printed intention in dry-run
  fn stop(&self, error: RailError) -> RailResult<String> {
    if self.dry_run() {
      Ok(format!("would stop: {}", error.to_string().replace('\n', " ")))
    } else {
      Err(error)
    }
  }

  fn version(&self) -> RailResult<Version> {
    self
      .ctx
      .version
      .ok_or_else(|| RailError::message("No version resolved before a version-dependent step"))
  }

  fn run_step(&mut self, step: Step) -> RailResult<String> {
    match step {
      Step::ResolveVersion => self.resolve_version(),
      Step::CleanTree => self.clean_tree(),
      Step::Validate => self.validate(),
      Step::UpdateVersion => self.update_version(),
      Step::Branch => self.branch(),
      Step::Commit => self.commit(),
      Step::MergeMainline => self.merge_mainline(),
      Step::Package => self.build_package(),
      Step::Tag => self.tag(),
      Step::Push => self.push(),
    }
  }

  fn resolve_version(&mut self) -> RailResult<String> {
    let resolver = VersionResolver::from_context(&self.ctx)?;
    let (version, source) = match resolver.resolve_with_source(self.ctx.options.explicit_version.as_deref()) {
      Ok(resolved) => resolved,
      Err(e) => return self.stop(e),
    };
    self.ctx.version = Some(version);

    let report = resolver.consistency_report(&version);
    if let Some(error) = report.to_error() {
      if self.ctx.options.strict_version {
        return self.stop(RailError::Version(error));
      }
      for detail in report.details() {
        self.warn(format!("version {}: {}", version, detail));
      }
    }
    Ok(format!("v{} (from {})", version, source))
  }

  fn clean_tree(&mut self) -> RailResult<String> {
    let changes = self.ctx.git().status_porcelain()?;
    if changes.is_empty() {
      return Ok("working tree clean".to_string());
    }
    self.stop(RailError::Git(GitError::RepositoryDirty { changes }))
  }

  fn validate(&mut self) -> RailResult<String> {
    let gate = match self.gate.take() {
      Some(gate) => gate,
      None => create_default_gate(&self.ctx.config, self.ctx.options.run_tests),
    };
    let names = gate.check_names().join(", ");
    if self.dry_run() {
      return Ok(format!("would run checks: {}", names));
    }

    let input = CheckInput {
      root: self.ctx.root.clone(),
      document: self.ctx.document_path(),
      config: Arc::clone(&self.ctx.config),
      runner: Arc::clone(&self.ctx.runner),
      cancel: Arc::new(AtomicBool::new(false)),
    };
    let report = gate.run(input)?;
    report.print();
    let report = report.into_result()?;
    Ok(format!("{} check(s) passed", report.outcomes.len()))
  }

  fn update_version(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let resolver = VersionResolver::from_context(&self.ctx)?;
    let path = resolver.document_path().to_path_buf();
    let xml = match fs::read_to_string(&path) {
      Ok(xml) => xml,
      Err(e) => {
        return self.stop(RailError::Version(VersionError::SourceUnavailable {
          path,
          reason: e.to_string(),
        }));
      }
    };

    let Some(stamped) = resolver.stamp_header(&xml, &version) else {
      return Ok(match resolver.extract_header(&xml) {
        Some(_) => format!("header already reads v{}", version),
        None => "no `Package v` header comment; left unchanged".to_string(),
      });
    };
    if self.dry_run() {
      return Ok(format!("would stamp header to v{}", version));
    }
    fs::write(&path, stamped).map_err(|e| {
      RailError::Version(VersionError::SourceUnavailable {
        path: path.clone(),
        reason: e.to_string(),
      })
    })?;
    Ok(format!("header stamped to v{}", version))
  }

  fn branch(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let branches = BranchManager::from_context(&self.ctx);
    let outcome = if self.dry_run() {
      branches.plan(&version)?
    } else {
      branches.ensure_branch(&version)?
    };
    let would = if self.dry_run() { "would " } else { "" };
    Ok(match outcome {
      BranchOutcome::Created(b) => format!("{}create {}", would, b),
      BranchOutcome::CheckedOut(b) => format!("{}check out existing {}", would, b),
      BranchOutcome::AlreadyCurrent(b) => format!("already on {}", b),
    })
  }

  fn commit(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let committer = ChangeCommitter::from_context(&self.ctx);
    let files = self.ctx.config.commit_files();
    if self.dry_run() {
      let paths = committer.stageable(&files);
      return Ok(format!(
        "would commit [{}] as \"{}\"",
        paths.join(", "),
        super::commit::release_message(&version)
      ));
    }
    Ok(match committer.commit(&version, &files)? {
      CommitOutcome::Committed(sha) => format!("committed {}", &sha[..sha.len().min(12)]),
      CommitOutcome::NothingToCommit => "nothing to commit".to_string(),
    })
  }

  fn merge_mainline(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let branches = BranchManager::from_context(&self.ctx);
    if self.dry_run() {
      return Ok(format!(
        "would merge {} into {}",
        branches.branch_name(&version),
        branches.mainline()
      ));
    }
    Ok(match branches.merge_into_mainline(&version) {
      MergeOutcome::Merged => format!("merged into {}", branches.mainline()),
      MergeOutcome::MainlineMissing(mainline) => {
        self.warn(format!("mainline branch '{}' not found; merge skipped", mainline));
        "skipped".to_string()
      }
      MergeOutcome::Failed(reason) => {
        self.warn(reason);
        "failed (continuing)".to_string()
      }
    })
  }

  fn build_package(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let builder = PackageBuilder::from_context(&self.ctx);
    if self.dry_run() {
      let output = builder.output_path(&version, BuildKind::Release, self.ctx.clock.now());
      return Ok(format!("would build {}", output.display()));
    }

    BranchManager::from_context(&self.ctx).require_current(&version)?;
    let built = builder.build_project(&version, BuildKind::Release)?;
    built.print_summary();
    for warning in &built.warnings {
      self.warn(warning.clone());
    }
    let summary = format!("{} (sha256 {})", built.package.display(), built.metadata.sha256);
    self.package = Some(built);
    Ok(summary)
  }

  fn tag(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let tags = TagManager::from_context(&self.ctx);
    let force = self.ctx.options.force_tag;
    let outcome = if self.dry_run() {
      match tags.plan(&version, force) {
        Ok(outcome) => outcome,
        Err(e) => return self.stop(e),
      }
    } else {
      BranchManager::from_context(&self.ctx).require_current(&version)?;
      tags.tag(&version, force)?
    };
    let would = if self.dry_run() { "would " } else { "" };
    Ok(match outcome {
      TagOutcome::Created(t) => format!("{}create {}", would, t),
      TagOutcome::Replaced(t) => format!("{}replace {} at HEAD", would, t),
    })
  }

  fn push(&mut self) -> RailResult<String> {
    let version = self.version()?;
    let remote = self.ctx.config.git.remote.clone();
    let refs = [self.ctx.release_branch(&version), self.ctx.tag_name(&version)];
    if self.dry_run() {
      return Ok(format!("would push {} to {}", refs.join(" and "), remote));
    }

    let git = self.ctx.git();
    for refname in &refs {
      let output = git.push(&remote, refname);
      if !output.success() {
        return Err(RailError::Git(GitError::PushFailed {
          remote,
          refname: refname.clone(),
          reason: output.diagnostic(),
        }));
      }
    }
    Ok(format!("pushed {} to {}", refs.join(" and "), remote))
  }
}
