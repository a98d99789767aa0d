//! Integration tests for package builds and development retention

use crate::helpers::{TestWorkspace, run_mpkg_rail, run_mpkg_rail_raw};
use anyhow::Result;
use std::fs::File;

fn member_names(path: &std::path::Path) -> Result<Vec<String>> {
  let archive = zip::ZipArchive::new(File::open(path)?)?;
  let mut names: Vec<String> = archive.file_names().map(String::from).collect();
  names.sort();
  Ok(names)
}

fn sha256_of(ws: &TestWorkspace, record: &str) -> Result<String> {
  let metadata: serde_json::Value = serde_json::from_str(&ws.read_file(record)?)?;
  Ok(metadata["sha256"].as_str().unwrap_or_default().to_string())
}

#[test]
fn test_default_builds_release_package() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_mpkg_rail(&ws.path, &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Package contents"), "stdout: {}", stdout);
  assert!(stdout.contains("config.lua"));

  let names = member_names(&ws.path.join("dist/package-v1.0.0.mpackage"))?;
  assert_eq!(names, vec!["config.lua", "images/icon.png", "package.xml"]);
  // Plain builds never touch git
  assert_eq!(ws.branches()?, vec!["main".to_string()]);
  Ok(())
}

#[test]
fn test_release_build_is_reproducible() -> Result<()> {
  let ws = TestWorkspace::new()?;

  run_mpkg_rail(&ws.path, &["--version", "1.0.0"])?;
  let first = sha256_of(&ws, "dist/package-v1.0.0.json")?;
  run_mpkg_rail(&ws.path, &["--version", "1.0.0"])?;
  let second = sha256_of(&ws, "dist/package-v1.0.0.json")?;

  assert_eq!(first.len(), 64);
  assert_eq!(first, second);
  Ok(())
}

#[test]
fn test_descriptor_carries_version() -> Result<()> {
  let ws = TestWorkspace::new()?;
  run_mpkg_rail(&ws.path, &["--version", "1.2.3.4"])?;

  let mut archive = zip::ZipArchive::new(File::open(ws.path.join("dist/package-v1.2.3.4.mpackage"))?)?;
  let mut lua = String::new();
  std::io::Read::read_to_string(&mut archive.by_name("config.lua")?, &mut lua)?;
  assert!(lua.contains("version = \"1.2.3.4\""), "config.lua: {}", lua);
  assert!(lua.contains("mpackage = \"package\""), "config.lua: {}", lua);
  Ok(())
}

#[test]
fn test_dev_build_and_retention() -> Result<()> {
  let ws = TestWorkspace::new()?;
  for n in 1..=4 {
    ws.write_file(&format!("dist/dev/package-v1.0.0-dev-20200101-00000{}.mpackage", n), "old build")?;
  }

  let output = run_mpkg_rail(&ws.path, &["--dev", "--retain", "2"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Keeping 2 development build(s)"), "stdout: {}", stdout);

  let files = ws.list_dir("dist/dev")?;
  assert_eq!(files.len(), 4, "files: {:?}", files);
  assert!(files.contains(&"package-v1.0.0-dev-20200101-000004.mpackage".to_string()));
  assert!(files.contains(&"package-v1.0.0-dev-20200101-000004.json".to_string()));
  assert!(!files.contains(&"package-v1.0.0-dev-20200101-000001.mpackage".to_string()));

  let new_build = files
    .iter()
    .find(|f| f.ends_with(".mpackage") && !f.contains("20200101"))
    .cloned()
    .unwrap_or_default();
  assert!(new_build.starts_with("package-v1.0.0-dev-"), "files: {:?}", files);
  Ok(())
}

#[test]
fn test_output_override() -> Result<()> {
  let ws = TestWorkspace::new()?;
  run_mpkg_rail(&ws.path, &["--output", "out/custom.mpackage"])?;

  assert!(ws.file_exists("out/custom.mpackage"));
  assert!(ws.file_exists("out/custom.json"));
  assert!(!ws.file_exists("dist"));
  Ok(())
}

#[test]
fn test_missing_resources_warn() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::remove_dir_all(ws.path.join("images"))?;

  let output = run_mpkg_rail(&ws.path, &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("directory not found"), "stderr: {}", stderr);
  assert_eq!(
    member_names(&ws.path.join("dist/package-v1.0.0.mpackage"))?,
    vec!["config.lua", "package.xml"]
  );
  Ok(())
}

#[test]
fn test_unresolved_version_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("CHANGELOG.md", "# Changelog\n\n## [Unreleased]\n")?;
  ws.write_file("package.xml", "<?xml version=\"1.0\"?>\n<MudletPackage version=\"1.001\"/>\n")?;

  let output = run_mpkg_rail_raw(&ws.path, &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Could not resolve a version"));
  assert!(!ws.file_exists("dist"));
  Ok(())
}

#[test]
fn test_leading_zero_version_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_mpkg_rail_raw(&ws.path, &["--version", "01.02.03"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid version '01.02.03'"));
  assert!(!ws.file_exists("dist"));
  Ok(())
}

#[test]
fn test_missing_document_fails_without_artifact() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::remove_file(ws.path.join("package.xml"))?;

  let output = run_mpkg_rail_raw(&ws.path, &["--version", "1.0.0"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!ws.file_exists("dist/package-v1.0.0.mpackage"));
  Ok(())
}
