//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const CHANGELOG: &str = "# Changelog\n\n## [Unreleased]\n\n## [1.0.0] - 2024-01-01\n- First release\n";

pub const PACKAGE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Demo Package v1.0.0 -->
<!DOCTYPE MudletPackage>
<MudletPackage version="1.001">
  <ScriptPackage>
    <Script isActive="yes" isFolder="no">
      <name>hello</name>
      <packageName></packageName>
      <script>cecho("hello")</script>
    </Script>
  </ScriptPackage>
</MudletPackage>
"#;

/// A package project in a git repository with one commit on main
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a project with a changelog, package document and images/ directory
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(path.join("CHANGELOG.md"), CHANGELOG)?;
    std::fs::write(path.join("package.xml"), PACKAGE_XML)?;
    std::fs::create_dir_all(path.join("images"))?;
    std::fs::write(path.join("images/icon.png"), b"\x89PNG not really")?;
    // Build output stays out of the tree
    std::fs::write(path.join(".gitignore"), "dist/\n")?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial package"])?;

    Ok(Self { _root: root, path })
  }

  /// Files changed by `rev`
  pub fn commit_files(&self, rev: &str) -> Result<Vec<String>> {
    let output = git(&self.path, &["diff-tree", "--no-commit-id", "--name-only", "-r", rev])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }

  /// Paths currently staged in the index
  pub fn staged(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["diff", "--cached", "--name-only"])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }

  /// Write a file relative to the project root
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    self.head()
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn current_branch(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Local branch names
  pub fn branches(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["for-each-ref", "--format=%(refname:short)", "refs/heads/"])?;
    Ok(lines(&output))
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "-l"])?;
    Ok(lines(&output))
  }

  /// Porcelain status lines
  pub fn status(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(lines(&output))
  }

  /// Get git log
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(lines(&output))
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// File names in a project directory, sorted
  pub fn list_dir(&self, path: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(self.path.join(path))? {
      names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
  }
}

fn lines(output: &Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .map(|l| l.trim().to_string())
    .filter(|l| !l.is_empty())
    .collect()
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run mpkg-rail, failing on a non-zero exit
pub fn run_mpkg_rail(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_mpkg_rail_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "mpkg-rail command failed: mpkg-rail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run mpkg-rail and return its output whatever the exit status
pub fn run_mpkg_rail_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_mpkg-rail");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run mpkg-rail")
}
