use crate::core::error::{ConfigError, RailError, RailResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Configuration for mpkg-rail
/// Searched in order: mpkg.toml, .mpkg.toml, .config/mpkg.toml
///
/// Every section is optional; a project without a config file gets the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailConfig {
  #[serde(default)]
  pub package: PackageConfig,
  #[serde(default)]
  pub output: OutputConfig,
  #[serde(default)]
  pub git: GitConfig,
  #[serde(default)]
  pub validation: ValidationConfig,
}

/// What goes into the archive and how it is described
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Package name used in file names and the descriptor (default: document file stem)
  #[serde(default)]
  pub name: Option<String>,

  /// Source XML document (the package body)
  #[serde(default = "default_document")]
  pub document: PathBuf,

  /// Changelog maintained newest-first
  #[serde(default = "default_changelog")]
  pub changelog: PathBuf,

  /// Resource directories copied verbatim into the archive
  #[serde(default = "default_resources")]
  pub resources: Vec<PathBuf>,

  /// Archive file extension (without the dot)
  #[serde(default = "default_extension")]
  pub extension: String,

  /// Generated descriptor file name inside the archive
  #[serde(default = "default_descriptor")]
  pub descriptor: String,

  #[serde(default = "default_author")]
  pub author: String,

  /// Display title (default: package name)
  #[serde(default)]
  pub title: Option<String>,

  #[serde(default = "default_description")]
  pub description: String,

  /// Compatibility tag recorded in package metadata
  #[serde(default = "default_compatibility")]
  pub compatibility: String,

  /// Expected root element of the package document
  #[serde(default = "default_root_element")]
  pub root_element: String,
}

fn default_document() -> PathBuf {
  PathBuf::from("package.xml")
}

fn default_changelog() -> PathBuf {
  PathBuf::from("CHANGELOG.md")
}

fn default_resources() -> Vec<PathBuf> {
  vec![PathBuf::from("images")]
}

fn default_extension() -> String {
  "mpackage".to_string()
}

fn default_descriptor() -> String {
  "config.lua".to_string()
}

fn default_author() -> String {
  "Unknown".to_string()
}

fn default_description() -> String {
  "Packaged with mpkg-rail".to_string()
}

fn default_compatibility() -> String {
  "mudlet-4".to_string()
}

fn default_root_element() -> String {
  "MudletPackage".to_string()
}

impl Default for PackageConfig {
  fn default() -> Self {
    Self {
      name: None,
      document: default_document(),
      changelog: default_changelog(),
      resources: default_resources(),
      extension: default_extension(),
      descriptor: default_descriptor(),
      author: default_author(),
      title: None,
      description: default_description(),
      compatibility: default_compatibility(),
      root_element: default_root_element(),
    }
  }
}

impl PackageConfig {
  /// Package name, falling back to the document's file stem
  pub fn name(&self) -> String {
    self.name.clone().unwrap_or_else(|| {
      self
        .document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string())
    })
  }

  /// Display title, falling back to the package name
  pub fn title(&self) -> String {
    self.title.clone().unwrap_or_else(|| self.name())
  }
}

/// Where built packages land and how many development builds are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
  #[serde(default = "default_release_dir")]
  pub release_dir: PathBuf,

  #[serde(default = "default_dev_dir")]
  pub dev_dir: PathBuf,

  /// Number of development builds retained after a dev build (K)
  #[serde(default = "default_retain_dev")]
  pub retain_dev: usize,
}

fn default_release_dir() -> PathBuf {
  PathBuf::from("dist")
}

fn default_dev_dir() -> PathBuf {
  PathBuf::from("dist/dev")
}

fn default_retain_dev() -> usize {
  3
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      release_dir: default_release_dir(),
      dev_dir: default_dev_dir(),
      retain_dev: default_retain_dev(),
    }
  }
}

/// Branch, tag and remote conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
  /// Remote used by --push (default: "origin")
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Mainline branch the release branch is merged into (default: "main")
  #[serde(default = "default_mainline")]
  pub mainline: String,

  /// Release branch prefix; the branch is `<prefix><version>` (default: "release/v")
  #[serde(default = "default_release_branch_prefix")]
  pub release_branch_prefix: String,

  /// Tag prefix; the tag is `<prefix><version>` (default: "v")
  #[serde(default = "default_tag_prefix")]
  pub tag_prefix: String,

  /// Files staged by the release commit (default: changelog + package document)
  #[serde(default)]
  pub commit_files: Option<Vec<PathBuf>>,

  /// Run the post-branch merge into mainline (default: true)
  #[serde(default = "default_true")]
  pub merge_to_mainline: bool,
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_mainline() -> String {
  "main".to_string()
}

fn default_release_branch_prefix() -> String {
  "release/v".to_string()
}

fn default_tag_prefix() -> String {
  "v".to_string()
}

fn default_true() -> bool {
  true
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      remote: default_remote(),
      mainline: default_mainline(),
      release_branch_prefix: default_release_branch_prefix(),
      tag_prefix: default_tag_prefix(),
      commit_files: None,
      merge_to_mainline: true,
    }
  }
}

/// Validation gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
  /// Worker pool width
  #[serde(default = "default_workers")]
  pub workers: usize,

  /// Whole-gate timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,

  /// External test suite command, run with --run-tests (e.g. ["python3", "run_tests.py"])
  #[serde(default)]
  pub test_command: Vec<String>,

  /// Lua compiler executables probed for script syntax checks, in order
  #[serde(default = "default_luac_candidates")]
  pub luac_candidates: Vec<String>,
}

fn default_workers() -> usize {
  4
}

fn default_timeout_secs() -> u64 {
  300
}

fn default_luac_candidates() -> Vec<String> {
  ["luac", "luac5.1", "luac5.2", "luac5.3", "luac5.4"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ValidationConfig {
  fn default() -> Self {
    Self {
      workers: default_workers(),
      timeout_secs: default_timeout_secs(),
      test_command: Vec::new(),
      luac_candidates: default_luac_candidates(),
    }
  }
}

impl RailConfig {
  /// Find config file in search order: mpkg.toml, .mpkg.toml, .config/mpkg.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("mpkg.toml"),
      path.join(".mpkg.toml"),
      path.join(".config").join("mpkg.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, or defaults when no config file exists
  pub fn load_or_default(path: &Path) -> RailResult<Self> {
    match Self::find_config_path(path) {
      Some(config_path) => Self::load_from(&config_path),
      None => {
        tracing::debug!("no mpkg.toml found under {}, using defaults", path.display());
        Ok(Self::default())
      }
    }
  }

  /// Load and validate a specific config file
  pub fn load_from(config_path: &Path) -> RailResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: RailConfig = toml_edit::de::from_str(&content).map_err(|e| {
      RailError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Validate values serde cannot
  pub fn validate(&self) -> RailResult<()> {
    if self.validation.workers == 0 {
      return Err(bad_value("validation.workers", "must be at least 1"));
    }
    if self.validation.timeout_secs == 0 {
      return Err(bad_value("validation.timeout_secs", "must be at least 1"));
    }
    if self.package.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(bad_value("package.name", "must not be empty"));
    }
    if self.package.extension.is_empty() || self.package.extension.contains('.') {
      return Err(bad_value("package.extension", "must be a bare extension such as \"mpackage\""));
    }
    if self.git.release_branch_prefix.is_empty() {
      return Err(bad_value("git.release_branch_prefix", "must not be empty"));
    }
    for resource in &self.package.resources {
      if !is_contained(resource) {
        return Err(bad_value(
          "package.resources",
          &format!("'{}' must be a relative path inside the project", resource.display()),
        ));
      }
    }
    Ok(())
  }

  /// Files staged by the release commit
  pub fn commit_files(&self) -> Vec<PathBuf> {
    self
      .git
      .commit_files
      .clone()
      .unwrap_or_else(|| vec![self.package.changelog.clone(), self.package.document.clone()])
  }
}

fn bad_value(field: &str, reason: &str) -> RailError {
  RailError::Config(ConfigError::BadValue {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}

/// Relative path with no `..` or root components
fn is_contained(path: &Path) -> bool {
  path
    .components()
    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
