//! Integration tests for `--list`, `--migrate-metadata` and `--cleanup-legacy`

use crate::helpers::{TestWorkspace, run_mpkg_rail, run_mpkg_rail_raw};
use anyhow::Result;

#[test]
fn test_list_empty() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_mpkg_rail(&ws.path, &["--list"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("No packages found"));
  Ok(())
}

#[test]
fn test_list_shows_metadata() -> Result<()> {
  let ws = TestWorkspace::new()?;
  run_mpkg_rail(&ws.path, &[])?;
  ws.write_file("dist/dev/package-v1.0.0-dev-20240101-120000.mpackage", "bare")?;

  let output = run_mpkg_rail(&ws.path, &["--list"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("2 package(s)"), "stdout: {}", stdout);
  assert!(stdout.contains("package-v1.0.0.mpackage"));
  assert!(stdout.contains("sha256:"));
  assert!(stdout.contains("(no metadata)"));
  Ok(())
}

#[test]
fn test_migrate_metadata() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("dist/package-v0.9.0.mpackage", "legacy build")?;
  ws.write_file("dist/package-v0.9.0.mpackage.sha256", "deadbeef  package-v0.9.0.mpackage\n")?;

  // Dry run only reports
  let output = run_mpkg_rail(&ws.path, &["--migrate-metadata", "--dry-run"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Would create package-v0.9.0.json"));
  assert!(!ws.file_exists("dist/package-v0.9.0.json"));

  let output = run_mpkg_rail(&ws.path, &["--migrate-metadata"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("does not match"), "stderr: {}", stderr);

  assert!(ws.file_exists("dist/package-v0.9.0.json"));
  assert!(!ws.file_exists("dist/package-v0.9.0.mpackage.sha256"));
  let metadata: serde_json::Value = serde_json::from_str(&ws.read_file("dist/package-v0.9.0.json")?)?;
  assert_eq!(metadata["version"], "0.9.0");
  assert_eq!(metadata["size_bytes"], 12);
  Ok(())
}

#[test]
fn test_cleanup_legacy() -> Result<()> {
  let ws = TestWorkspace::new()?;
  run_mpkg_rail(&ws.path, &[])?;
  ws.write_file("dist/package-v1.0.0.mpackage.sha256", "abc  package-v1.0.0.mpackage\n")?;
  ws.write_file("dist/package-v0.8.0.json", "{}")?;
  ws.write_file("dist/README.txt", "keep me")?;

  run_mpkg_rail(&ws.path, &["--cleanup-legacy"])?;

  assert_eq!(
    ws.list_dir("dist")?,
    vec!["README.txt", "package-v1.0.0.json", "package-v1.0.0.mpackage"]
  );
  Ok(())
}

#[test]
fn test_maintenance_conflicts_with_build_flags() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_mpkg_rail_raw(&ws.path, &["--list", "--release"])?;
  assert!(!output.status.success());
  assert!(ws.branches()? == vec!["main".to_string()]);
  Ok(())
}
