//! Release branch management
//!
//! `release/v<version>` is created once and reused afterwards. Repository state
//! is queried before every mutation; nothing is remembered between calls.

use crate::core::context::WorkflowContext;
use crate::core::error::{GitError, RailError, RailResult};
use crate::core::vcs::SystemGit;
use crate::version::Version;

/// What `ensure_branch` did (or would do)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
  /// Branch was missing and was created from HEAD
  Created(String),
  /// Branch existed and was checked out
  CheckedOut(String),
  /// Branch was already HEAD
  AlreadyCurrent(String),
}

impl BranchOutcome {
  pub fn branch(&self) -> &str {
    match self {
      BranchOutcome::Created(b) | BranchOutcome::CheckedOut(b) | BranchOutcome::AlreadyCurrent(b) => b,
    }
  }
}

/// Result of the post-branch mainline merge; never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
  Merged,
  MainlineMissing(String),
  /// Merge or checkout failed; the message says which
  Failed(String),
}

pub struct BranchManager {
  git: SystemGit,
  prefix: String,
  mainline: String,
}

impl BranchManager {
  pub fn new(git: SystemGit, prefix: &str, mainline: &str) -> Self {
    Self {
      git,
      prefix: prefix.to_string(),
      mainline: mainline.to_string(),
    }
  }

  pub fn from_context(ctx: &WorkflowContext) -> Self {
    Self::new(ctx.git(), &ctx.config.git.release_branch_prefix, &ctx.config.git.mainline)
  }

  pub fn branch_name(&self, version: &Version) -> String {
    format!("{}{}", self.prefix, version)
  }

  pub fn mainline(&self) -> &str {
    &self.mainline
  }

  /// What `ensure_branch` would do, using read-only queries
  pub fn plan(&self, version: &Version) -> RailResult<BranchOutcome> {
    let branch = self.branch_name(version);
    if self.git.current_branch()? == branch {
      return Ok(BranchOutcome::AlreadyCurrent(branch));
    }
    if self.git.branch_exists(&branch) {
      Ok(BranchOutcome::CheckedOut(branch))
    } else {
      Ok(BranchOutcome::Created(branch))
    }
  }

  /// Check out the release branch, creating it from HEAD if needed
  pub fn ensure_branch(&self, version: &Version) -> RailResult<BranchOutcome> {
    let outcome = self.plan(version)?;
    let output = match &outcome {
      BranchOutcome::AlreadyCurrent(_) => return Ok(outcome),
      BranchOutcome::CheckedOut(branch) => self.git.checkout(branch),
      BranchOutcome::Created(branch) => self.git.create_branch(branch),
    };

    if !output.success() {
      return Err(RailError::Git(GitError::BranchOpFailed {
        branch: outcome.branch().to_string(),
        stderr: output.diagnostic(),
      }));
    }
    tracing::debug!("branch step: {:?}", outcome);
    Ok(outcome)
  }

  /// Make sure HEAD is the release branch before a step that writes to it
  ///
  /// A failed return from the mainline merge can leave HEAD elsewhere.
  pub fn require_current(&self, version: &Version) -> RailResult<()> {
    let branch = self.branch_name(version);
    let current = self.git.current_branch()?;
    if current == branch {
      return Ok(());
    }

    tracing::debug!("HEAD is {}, switching back to {}", current, branch);
    let output = self.git.checkout(&branch);
    if !output.success() {
      return Err(RailError::Git(GitError::BranchOpFailed {
        branch,
        stderr: format!("HEAD is on {}: {}", current, output.diagnostic()),
      }));
    }
    Ok(())
  }

  /// Release branch with the greatest version
  ///
  /// Ties (e.g. `release/v1.2.3` and `release/v1.2.3.0`) keep the branch git
  /// lists first. Branches whose suffix is not a version are ignored.
  pub fn highest_release_branch(&self) -> RailResult<Option<(String, Version)>> {
    let mut best: Option<(String, Version)> = None;
    for branch in self.git.list_branches(&self.prefix)? {
      let Some(version) = branch
        .strip_prefix(&self.prefix)
        .and_then(|v| Version::parse(v).ok())
      else {
        continue;
      };
      let better = match &best {
        Some((_, current)) => version > *current,
        None => true,
      };
      if better {
        best = Some((branch, version));
      }
    }
    Ok(best)
  }

  /// Merge the release branch into mainline, then return to the release branch
  pub fn merge_into_mainline(&self, version: &Version) -> MergeOutcome {
    let branch = self.branch_name(version);
    if !self.git.branch_exists(&self.mainline) {
      return MergeOutcome::MainlineMissing(self.mainline.clone());
    }

    let checkout = self.git.checkout(&self.mainline);
    if !checkout.success() {
      return MergeOutcome::Failed(format!("could not check out {}: {}", self.mainline, checkout.diagnostic()));
    }

    let merge = self.git.merge_no_ff(&branch);
    let mut failure = None;
    if !merge.success() {
      failure = Some(format!("merge of {} into {} failed: {}", branch, self.mainline, merge.diagnostic()));
      let abort = self.git.merge_abort();
      if !abort.success() {
        tracing::warn!("merge --abort failed: {}", abort.diagnostic());
      }
    }

    let back = self.git.checkout(&branch);
    if !back.success() {
      let msg = format!("could not switch back to {}: {}", branch, back.diagnostic());
      return MergeOutcome::Failed(match failure {
        Some(f) => format!("{}; {}", f, msg),
        None => msg,
      });
    }

    match failure {
      Some(f) => MergeOutcome::Failed(f),
      None => MergeOutcome::Merged,
    }
  }
}
