//! Integration tests for the individual git steps

use crate::helpers::{TestWorkspace, git, run_mpkg_rail, run_mpkg_rail_raw};
use anyhow::Result;

#[test]
fn test_git_branch_is_idempotent() -> Result<()> {
  let ws = TestWorkspace::new()?;

  run_mpkg_rail(&ws.path, &["--git-branch", "--version", "1.2.0"])?;
  assert_eq!(ws.current_branch()?, "release/v1.2.0");

  let output = run_mpkg_rail(&ws.path, &["--git-branch", "--version", "1.2.0"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Already on release/v1.2.0"));
  assert_eq!(ws.current_branch()?, "release/v1.2.0");

  // Git steps alone build nothing
  assert!(!ws.file_exists("dist"));
  Ok(())
}

#[test]
fn test_git_branch_reuses_existing_branch() -> Result<()> {
  let ws = TestWorkspace::new()?;
  git(&ws.path, &["branch", "release/v1.0.0"])?;

  let output = run_mpkg_rail(&ws.path, &["--git-branch"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Checked out existing branch release/v1.0.0"));
  assert_eq!(ws.current_branch()?, "release/v1.0.0");
  Ok(())
}

#[test]
fn test_git_tag_twice() -> Result<()> {
  let ws = TestWorkspace::new()?;

  run_mpkg_rail(&ws.path, &["--git-tag"])?;
  assert_eq!(ws.tags()?, vec!["v1.0.0".to_string()]);

  let second = run_mpkg_rail_raw(&ws.path, &["--git-tag"])?;
  assert_eq!(second.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));

  ws.write_file("CHANGELOG.md", "# Changelog\n\n## [1.0.0] - 2024-02-01\n- Fixed\n")?;
  let head = ws.commit("Touch changelog")?;
  run_mpkg_rail(&ws.path, &["--git-tag", "--force-tag"])?;
  let target = git(&ws.path, &["rev-parse", "v1.0.0^{commit}"])?;
  assert_eq!(String::from_utf8_lossy(&target.stdout).trim(), head);

  let message = git(&ws.path, &["tag", "-l", "--format=%(contents:subject)", "v1.0.0"])?;
  assert_eq!(String::from_utf8_lossy(&message.stdout).trim(), "Release v1.0.0");
  Ok(())
}

#[test]
fn test_git_commit_stages_release_files_only() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("CHANGELOG.md", "# Changelog\n\n## [1.1.0] - 2024-02-01\n- More\n")?;
  ws.write_file("notes.txt", "not part of the release")?;

  run_mpkg_rail(&ws.path, &["--git-commit"])?;

  assert_eq!(ws.git_log(1)?, vec!["Prepare release v1.1.0".to_string()]);
  assert_eq!(ws.status()?, vec!["?? notes.txt".to_string()]);

  // Re-running has nothing to commit and still succeeds
  let output = run_mpkg_rail(&ws.path, &["--git-commit"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing to commit"));
  Ok(())
}

#[test]
fn test_git_steps_run_in_order() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("CHANGELOG.md", "# Changelog\n\n## [1.1.0] - 2024-02-01\n- More\n")?;

  run_mpkg_rail(&ws.path, &["--git-tag", "--git-commit", "--git-branch"])?;

  assert_eq!(ws.current_branch()?, "release/v1.1.0");
  let target = git(&ws.path, &["rev-parse", "v1.1.0^{commit}"])?;
  assert_eq!(String::from_utf8_lossy(&target.stdout).trim(), ws.head()?);
  assert_eq!(ws.git_log(1)?, vec!["Prepare release v1.1.0".to_string()]);
  Ok(())
}

#[test]
fn test_dev_build_committed_to_highest_release_branch() -> Result<()> {
  let ws = TestWorkspace::new()?;
  git(&ws.path, &["branch", "release/v0.9.0"])?;
  git(&ws.path, &["branch", "release/v1.0.0"])?;

  run_mpkg_rail(&ws.path, &["--dev", "--git-commit"])?;

  // Back where we started, artifact still on disk
  assert_eq!(ws.current_branch()?, "main");
  let builds = ws.list_dir("dist/dev")?;
  assert_eq!(builds.len(), 2, "builds: {:?}", builds);

  let log = git(&ws.path, &["log", "-1", "--format=%s", "release/v1.0.0"])?;
  let subject = String::from_utf8_lossy(&log.stdout).trim().to_string();
  assert!(subject.starts_with("Add development build v1.0.0"), "subject: {}", subject);

  let tree = git(&ws.path, &["ls-tree", "-r", "--name-only", "release/v1.0.0"])?;
  let tracked = String::from_utf8_lossy(&tree.stdout).to_string();
  assert!(tracked.contains("dist/dev/package-v1.0.0-dev-"), "tracked: {}", tracked);

  let other = git(&ws.path, &["log", "-1", "--format=%s", "release/v0.9.0"])?;
  assert_eq!(String::from_utf8_lossy(&other.stdout).trim(), "Initial package");
  Ok(())
}

#[test]
fn test_dev_commit_returns_to_detached_head() -> Result<()> {
  let ws = TestWorkspace::new()?;
  git(&ws.path, &["branch", "release/v1.0.0"])?;
  let start = ws.head()?;
  git(&ws.path, &["checkout", "--detach"])?;

  run_mpkg_rail(&ws.path, &["--dev", "--git-commit"])?;

  assert_eq!(ws.current_branch()?, "HEAD");
  assert_eq!(ws.head()?, start);
  let log = git(&ws.path, &["log", "-1", "--format=%s", "release/v1.0.0"])?;
  assert!(String::from_utf8_lossy(&log.stdout).starts_with("Add development build v1.0.0"));
  Ok(())
}

#[test]
fn test_git_dry_run_changes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_mpkg_rail(&ws.path, &["--git-branch", "--git-tag", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Would create branch release/v1.0.0"), "stdout: {}", stdout);
  assert!(stdout.contains("Would create tag v1.0.0"), "stdout: {}", stdout);
  assert_eq!(ws.branches()?, vec!["main".to_string()]);
  assert!(ws.tags()?.is_empty());
  Ok(())
}
