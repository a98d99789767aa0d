//! System git backend
//!
//! Every git invocation goes through the workflow's [`CommandRunner`], so a
//! scripted runner can stand in for git in tests. Nothing is cached: each
//! query re-reads repository state.

use crate::core::error::{GitError, RailError, RailResult};
use crate::core::runner::{CommandOutput, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config overrides applied to every git call (don't trust user config for output format)
const GIT_OVERRIDES: [&str; 4] = ["-c", "advice.detachedHead=false", "-c", "core.quotePath=false"];

/// Git subcommands that change repository state
const MUTATING_SUBCOMMANDS: &[&str] = &[
  "add", "checkout", "switch", "commit", "merge", "push", "reset", "rm", "restore", "stash", "rebase",
];

/// Git backend using the system git executable
#[derive(Clone)]
pub struct SystemGit {
  /// Working tree root
  work_tree: PathBuf,
  runner: Arc<dyn CommandRunner>,
  /// Refuse mutating commands (dry-run)
  read_only: bool,
}

impl SystemGit {
  pub fn new(work_tree: &Path, runner: Arc<dyn CommandRunner>) -> Self {
    Self {
      work_tree: work_tree.to_path_buf(),
      runner,
      read_only: false,
    }
  }

  /// Handle that refuses every command which would change the repository
  pub fn read_only(mut self) -> Self {
    self.read_only = true;
    self
  }

  /// Run git with the given arguments, returning the raw output
  pub fn run(&self, args: &[&str]) -> CommandOutput {
    let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 5);
    argv.push("git");
    argv.extend_from_slice(&GIT_OVERRIDES);
    argv.extend_from_slice(args);

    if self.read_only && is_mutating(&argv) {
      let command = format!("git {}", args.join(" "));
      tracing::warn!("dry run: refused `{}`", command);
      return CommandOutput {
        stdout: String::new(),
        stderr: format!("dry run: refused to run `{}`", command),
        exit_code: 1,
      };
    }
    self.runner.run(&argv, Some(&self.work_tree))
  }

  /// Run git and return trimmed stdout, or `CommandFailed`
  fn run_checked(&self, args: &[&str]) -> RailResult<String> {
    let output = self.run(args);
    if !output.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: output.diagnostic(),
      }));
    }
    Ok(output.stdout.trim().to_string())
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> RailResult<String> {
    self.run_checked(&["rev-parse", "HEAD"])
  }

  /// Get current branch name ("HEAD" when detached)
  pub fn current_branch(&self) -> RailResult<String> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]);
    if !output.success() {
      return Ok("HEAD".to_string());
    }
    Ok(output.stdout.trim().to_string())
  }

  pub fn branch_exists(&self, branch: &str) -> bool {
    let refname = format!("refs/heads/{}", branch);
    self.run(&["rev-parse", "--verify", "--quiet", &refname]).success()
  }

  pub fn tag_exists(&self, tag: &str) -> bool {
    let refname = format!("refs/tags/{}", tag);
    self.run(&["rev-parse", "--verify", "--quiet", &refname]).success()
  }

  /// Porcelain status lines; empty when the tree is clean
  pub fn status_porcelain(&self) -> RailResult<Vec<String>> {
    let output = self.run(&["status", "--porcelain"]);
    if !output.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: "git status --porcelain".to_string(),
        stderr: output.diagnostic(),
      }));
    }
    Ok(
      output
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(String::from)
        .collect(),
    )
  }

  /// Whether any of `paths` has staged changes (other staged files don't count)
  pub fn has_staged_changes(&self, paths: &[String]) -> RailResult<bool> {
    let mut args = vec!["diff", "--cached", "--quiet", "--"];
    args.extend(paths.iter().map(String::as_str));
    let output = self.run(&args);
    match output.exit_code {
      0 => Ok(false),
      1 => Ok(true),
      _ => Err(RailError::Git(GitError::CommandFailed {
        command: "git diff --cached --quiet".to_string(),
        stderr: output.diagnostic(),
      })),
    }
  }

  pub fn checkout(&self, branch: &str) -> CommandOutput {
    self.run(&["checkout", branch])
  }

  /// Create `branch` from HEAD and check it out
  pub fn create_branch(&self, branch: &str) -> CommandOutput {
    self.run(&["checkout", "-b", branch])
  }

  /// Stage `paths`; `force` also stages ignored files
  pub fn add(&self, paths: &[String], force: bool) -> CommandOutput {
    let mut args = vec!["add"];
    if force {
      args.push("-f");
    }
    args.push("--");
    args.extend(paths.iter().map(String::as_str));
    self.run(&args)
  }

  /// Commit only `paths`, leaving anything else in the index staged
  pub fn commit(&self, message: &str, paths: &[String]) -> CommandOutput {
    let mut args = vec!["commit", "-m", message, "--only", "--"];
    args.extend(paths.iter().map(String::as_str));
    self.run(&args)
  }

  /// Create an annotated tag at HEAD
  pub fn create_tag(&self, tag: &str, message: &str, force: bool) -> CommandOutput {
    let mut args = vec!["tag", "-a"];
    if force {
      args.push("-f");
    }
    args.extend([tag, "-m", message]);
    self.run(&args)
  }

  pub fn merge_no_ff(&self, branch: &str) -> CommandOutput {
    self.run(&["merge", "--no-ff", "--no-edit", branch])
  }

  pub fn merge_abort(&self) -> CommandOutput {
    self.run(&["merge", "--abort"])
  }

  pub fn push(&self, remote: &str, refname: &str) -> CommandOutput {
    self.run(&["push", remote, refname])
  }

  /// Local branches starting with `prefix`, in git's listing order (sorted by refname)
  pub fn list_branches(&self, prefix: &str) -> RailResult<Vec<String>> {
    let pattern = format!("refs/heads/{}*", prefix);
    let stdout = self.run_checked(&["for-each-ref", "--format=%(refname:short)", &pattern])?;
    Ok(
      stdout
        .lines()
        .map(|l| l.trim())
        .filter(|l| l.starts_with(prefix))
        .map(String::from)
        .collect(),
    )
  }
}

/// Git subcommand of an argv, skipping the program name and `-c key=value` / `-C dir` pairs
pub(crate) fn git_subcommand<'a>(argv: &[&'a str]) -> Option<&'a str> {
  let mut iter = argv.iter().skip(1);
  while let Some(arg) = iter.next() {
    match *arg {
      "-c" | "-C" => {
        iter.next();
      }
      a if a.starts_with('-') => {}
      a => return Some(a),
    }
  }
  None
}

/// Whether a git argv changes repository state
///
/// A read-only handle refuses these; tests use it to audit dry runs.
pub(crate) fn is_mutating(argv: &[&str]) -> bool {
  let Some(sub) = git_subcommand(argv) else {
    return false;
  };
  let rest: Vec<&str> = argv
    .iter()
    .skip_while(|a| **a != sub)
    .skip(1)
    .copied()
    .collect();

  match sub {
    "tag" | "branch" => !rest.is_empty() && !rest.iter().any(|a| matches!(*a, "-l" | "--list")),
    s => MUTATING_SUBCOMMANDS.contains(&s),
  }
}
