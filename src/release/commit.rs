//! Release commits
//!
//! Stages exactly the designated files and commits only those paths; anything
//! else already in the index stays staged and out of the release commit.
//! "Nothing to commit" is success: a re-run after a completed commit is a no-op.

use crate::core::context::WorkflowContext;
use crate::core::error::{GitError, RailError, RailResult};
use crate::core::vcs::SystemGit;
use crate::utils::path_to_git_format;
use crate::version::Version;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
  /// New commit SHA
  Committed(String),
  NothingToCommit,
}

pub struct ChangeCommitter {
  git: SystemGit,
  root: PathBuf,
}

/// Commit message for a release
pub fn release_message(version: &Version) -> String {
  format!("Prepare release v{}", version)
}

impl ChangeCommitter {
  pub fn new(git: SystemGit, root: &Path) -> Self {
    Self {
      git,
      root: root.to_path_buf(),
    }
  }

  pub fn from_context(ctx: &WorkflowContext) -> Self {
    Self::new(ctx.git(), &ctx.root)
  }

  /// Files that exist, as git pathspecs relative to the root; missing files warn
  pub fn stageable(&self, files: &[PathBuf]) -> Vec<String> {
    let mut paths = Vec::new();
    for file in files {
      let absolute = if file.is_absolute() {
        file.clone()
      } else {
        self.root.join(file)
      };
      if !absolute.exists() {
        eprintln!("⚠️  Skipping {}: file not found", file.display());
        continue;
      }
      let relative = absolute.strip_prefix(&self.root).unwrap_or(&absolute);
      paths.push(path_to_git_format(relative));
    }
    paths
  }

  /// Commit `files` as the release commit for `version`
  pub fn commit(&self, version: &Version, files: &[PathBuf]) -> RailResult<CommitOutcome> {
    self.commit_with_message(files, &release_message(version), false)
  }

  /// Stage `files` and commit with `message`
  ///
  /// `force_add` stages files even when they are ignored (build artifacts).
  pub fn commit_with_message(&self, files: &[PathBuf], message: &str, force_add: bool) -> RailResult<CommitOutcome> {
    let paths = self.stageable(files);
    if paths.is_empty() {
      return Ok(CommitOutcome::NothingToCommit);
    }

    let add = self.git.add(&paths, force_add);
    if !add.success() {
      return Err(RailError::Git(GitError::CommitFailed {
        stderr: add.diagnostic(),
      }));
    }

    if !self.git.has_staged_changes(&paths)? {
      return Ok(CommitOutcome::NothingToCommit);
    }

    let output = self.git.commit(message, &paths);
    if !output.success() {
      let diagnostic = output.diagnostic();
      if is_nothing_to_commit(&diagnostic) {
        return Ok(CommitOutcome::NothingToCommit);
      }
      return Err(RailError::Git(GitError::CommitFailed { stderr: diagnostic }));
    }

    Ok(CommitOutcome::Committed(self.git.head_commit()?))
  }
}

fn is_nothing_to_commit(output: &str) -> bool {
  output.contains("nothing to commit") || output.contains("nothing added to commit")
}
