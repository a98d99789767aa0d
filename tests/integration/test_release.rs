//! Integration tests for `mpkg-rail --release`

use crate::helpers::{TestWorkspace, run_mpkg_rail, run_mpkg_rail_raw};
use anyhow::Result;

#[test]
fn test_release_full_workflow() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_mpkg_rail(&ws.path, &["--release"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Release v1.0.0 complete"), "stdout: {}", stdout);

  assert_eq!(ws.current_branch()?, "release/v1.0.0");
  assert_eq!(ws.tags()?, vec!["v1.0.0".to_string()]);
  assert!(ws.file_exists("dist/package-v1.0.0.mpackage"));
  assert!(ws.file_exists("dist/package-v1.0.0.json"));

  let metadata: serde_json::Value = serde_json::from_str(&ws.read_file("dist/package-v1.0.0.json")?)?;
  assert_eq!(metadata["version"], "1.0.0");
  assert_eq!(metadata["build_kind"], "release");
  assert_eq!(metadata["package_file"], "package-v1.0.0.mpackage");

  Ok(())
}

#[test]
fn test_release_stamps_and_commits_new_version() -> Result<()> {
  let ws = TestWorkspace::new()?;

  run_mpkg_rail(&ws.path, &["--release", "--version", "1.1.0", "--skip-validation"])?;

  assert!(ws.read_file("package.xml")?.contains("Package v1.1.0"));
  assert_eq!(ws.current_branch()?, "release/v1.1.0");
  assert_eq!(ws.git_log(1)?, vec!["Prepare release v1.1.0".to_string()]);
  assert!(ws.status()?.is_empty());

  // Mainline got the release through a merge commit
  crate::helpers::git(&ws.path, &["checkout", "main"])?;
  assert!(ws.read_file("package.xml")?.contains("Package v1.1.0"));
  Ok(())
}

#[test]
fn test_release_commit_leaves_other_staged_files_alone() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("unrelated.txt", "work in progress")?;
  crate::helpers::git(&ws.path, &["add", "unrelated.txt"])?;

  run_mpkg_rail(
    &ws.path,
    &["--release", "--version", "1.1.0", "--skip-validation", "--skip-git-check"],
  )?;

  assert_eq!(ws.git_log(1)?, vec!["Prepare release v1.1.0".to_string()]);
  assert_eq!(ws.commit_files("release/v1.1.0")?, vec!["package.xml".to_string()]);
  assert!(ws.staged()?.contains(&"unrelated.txt".to_string()));
  Ok(())
}

#[test]
fn test_release_dry_run_outside_repository_completes() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  std::fs::write(dir.path().join("CHANGELOG.md"), crate::helpers::CHANGELOG)?;
  std::fs::write(dir.path().join("package.xml"), crate::helpers::PACKAGE_XML)?;

  let output = run_mpkg_rail(dir.path(), &["--release", "--dry-run", "--version", "3.0.0"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("would stop"), "stdout: {}", stdout);
  assert!(stdout.contains("Dry run complete"), "stdout: {}", stdout);
  assert!(!dir.path().join(".git").exists());
  Ok(())
}

#[test]
fn test_release_dry_run_on_dirty_repository() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("package.xml", "<MudletPackage version=\"1.001\"/>\n")?;
  ws.write_file("notes.txt", "scratch")?;
  let status_before = ws.status()?;
  let head_before = ws.head()?;

  let output = run_mpkg_rail(&ws.path, &["--release", "--dry-run", "--version", "3.0.0", "--push"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("would stop"), "stdout: {}", stdout);
  assert!(stdout.contains("release/v3.0.0"), "stdout: {}", stdout);
  assert!(stdout.contains("v3.0.0"), "stdout: {}", stdout);

  assert_eq!(ws.status()?, status_before);
  assert_eq!(ws.head()?, head_before);
  assert_eq!(ws.branches()?, vec!["main".to_string()]);
  assert!(ws.tags()?.is_empty());
  assert!(!ws.file_exists("dist"));
  assert_eq!(ws.read_file("package.xml")?, "<MudletPackage version=\"1.001\"/>\n");
  Ok(())
}

#[test]
fn test_release_refuses_dirty_repository() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("notes.txt", "scratch")?;

  let output = run_mpkg_rail_raw(&ws.path, &["--release", "--skip-validation"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("uncommitted"), "stderr: {}", stderr);
  assert_eq!(ws.branches()?, vec!["main".to_string()]);
  Ok(())
}

#[test]
fn test_release_twice_needs_force_tag() -> Result<()> {
  let ws = TestWorkspace::new()?;
  run_mpkg_rail(&ws.path, &["--release", "--skip-validation"])?;

  let second = run_mpkg_rail_raw(&ws.path, &["--release", "--skip-validation"])?;
  assert_eq!(second.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));

  run_mpkg_rail(&ws.path, &["--release", "--skip-validation", "--force-tag"])?;
  let tag_target = crate::helpers::git(&ws.path, &["rev-parse", "v1.0.0^{commit}"])?;
  assert_eq!(String::from_utf8_lossy(&tag_target.stdout).trim(), ws.head()?);
  Ok(())
}

#[test]
fn test_version_mismatch_warns() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_mpkg_rail(&ws.path, &["--release", "--dry-run", "--version", "2.0.0"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("changelog has 1.0.0"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_strict_version_mismatch_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_mpkg_rail_raw(&ws.path, &["--release", "--version", "2.0.0", "--strict-version"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("inconsistent"));
  assert_eq!(ws.branches()?, vec!["main".to_string()]);
  Ok(())
}
