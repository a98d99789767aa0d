//! Workflow context - build once, pass everywhere
//!
//! Everything a step needs to make decisions lives here: the project root, the
//! loaded configuration, the run options from the command line, the resolved
//! version, a clock and the command runner. Nothing is global; tests build a
//! context with a fixed clock and a scripted runner.
//!
//! ```text
//! main.rs:
//!   WorkflowContext::build() -> WorkflowContext
//!   |
//!   v
//! commands/release.rs, build.rs, git.rs, maintenance.rs:
//!   fn run_*(ctx: &mut WorkflowContext)
//! ```

use crate::core::config::RailConfig;
use crate::core::error::RailResult;
use crate::core::runner::{CommandRunner, SystemRunner};
use crate::core::vcs::SystemGit;
use crate::version::Version;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of "now" for package names, descriptor dates and metadata
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock pinned to one instant
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

/// Run options from the command line
#[derive(Debug, Clone, Default)]
pub struct WorkflowOptions {
  /// Read-only queries only; print intentions instead of mutating
  pub dry_run: bool,
  pub skip_validation: bool,
  pub skip_git_check: bool,
  pub force_tag: bool,
  pub push: bool,
  /// Include the external test suite in the validation gate
  pub run_tests: bool,
  /// Promote version inconsistency to a hard failure
  pub strict_version: bool,
  /// Version passed with --version, if any
  pub explicit_version: Option<String>,
  /// Override for the package output path
  pub output: Option<PathBuf>,
  /// Override for the number of retained development builds
  pub retain: Option<usize>,
}

/// Shared state for one invocation
#[derive(Clone)]
pub struct WorkflowContext {
  /// Project root directory
  pub root: PathBuf,

  /// Loaded configuration (defaults when no mpkg.toml exists)
  pub config: Arc<RailConfig>,

  pub options: WorkflowOptions,

  /// Version resolved by the first step that needs one
  pub version: Option<Version>,

  pub clock: Arc<dyn Clock>,

  pub runner: Arc<dyn CommandRunner>,
}

impl WorkflowContext {
  /// Build the context for a real run: config from disk, system clock and runner
  pub fn build(root: &Path, options: WorkflowOptions) -> RailResult<Self> {
    let config = RailConfig::load_or_default(root)?;
    Ok(Self::with_parts(
      root,
      config,
      options,
      Arc::new(SystemClock),
      Arc::new(SystemRunner),
    ))
  }

  /// Assemble a context from explicit parts
  pub fn with_parts(
    root: &Path,
    config: RailConfig,
    options: WorkflowOptions,
    clock: Arc<dyn Clock>,
    runner: Arc<dyn CommandRunner>,
  ) -> Self {
    Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      options,
      version: None,
      clock,
      runner,
    }
  }

  /// Git handle bound to the project root; read-only under --dry-run
  pub fn git(&self) -> SystemGit {
    let git = SystemGit::new(&self.root, Arc::clone(&self.runner));
    if self.options.dry_run { git.read_only() } else { git }
  }

  /// Resolve a project-relative path
  pub fn path(&self, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
      relative.to_path_buf()
    } else {
      self.root.join(relative)
    }
  }

  pub fn document_path(&self) -> PathBuf {
    self.path(&self.config.package.document)
  }

  pub fn changelog_path(&self) -> PathBuf {
    self.path(&self.config.package.changelog)
  }

  pub fn release_dir(&self) -> PathBuf {
    self.path(&self.config.output.release_dir)
  }

  pub fn dev_dir(&self) -> PathBuf {
    self.path(&self.config.output.dev_dir)
  }

  /// Retention count: --retain wins over config
  pub fn retain_dev(&self) -> usize {
    self.options.retain.unwrap_or(self.config.output.retain_dev)
  }

  pub fn release_branch(&self, version: &Version) -> String {
    format!("{}{}", self.config.git.release_branch_prefix, version)
  }

  pub fn tag_name(&self, version: &Version) -> String {
    format!("{}{}", self.config.git.tag_prefix, version)
  }
}
