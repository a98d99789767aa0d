//! Error types for mpkg-rail with contextual messages and exit codes
//!
//! Every failure the release workflow can hit is categorised here. Each category
//! knows whether it carries a help hint, and all of them map to the single
//! hard-failure exit code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for mpkg-rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Any hard failure (validation, dirty tree, tag collision, build I/O, unresolved version)
  Failure = 1,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for mpkg-rail
#[derive(Debug)]
pub enum RailError {
  /// Configuration errors
  Config(ConfigError),

  /// Version resolution and consistency errors
  Version(VersionError),

  /// Git operation errors
  Git(GitError),

  /// Package build and metadata errors
  Package(PackageError),

  /// Validation gate errors
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Categorised errors keep their category; only I/O and message errors are
  /// rewrapped so the context line shows up in the printed summary.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(e) => RailError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    ExitCode::Failure
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Version(e) => e.help_message(),
      RailError::Git(e) => e.help_message(),
      RailError::Package(e) => e.help_message(),
      RailError::Validation(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      RailError::Io(_) => None,
    }
  }

  /// Whether the workflow may log this error and continue
  ///
  /// Everything not listed here halts the workflow.
  pub fn is_non_fatal(&self) -> bool {
    matches!(
      self,
      RailError::Package(PackageError::MetadataWriteFailed { .. })
        | RailError::Version(VersionError::Inconsistent { .. })
    )
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Version(e) => write!(f, "{}", e),
      RailError::Git(e) => write!(f, "{}", e),
      RailError::Package(e) => write!(f, "{}", e),
      RailError::Validation(e) => write!(f, "{}", e),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<zip::result::ZipError> for RailError {
  fn from(err: zip::result::ZipError) -> Self {
    RailError::message(format!("Archive error: {}", err))
  }
}

impl From<walkdir::Error> for RailError {
  fn from(err: walkdir::Error) -> Self {
    RailError::message(format!("Directory walk error: {}", err))
  }
}

impl From<regex::Error> for RailError {
  fn from(err: regex::Error) -> Self {
    RailError::message(format!("Pattern error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for RailError {
  fn from(err: std::path::StripPrefixError) -> Self {
    RailError::message(format!("Path strip prefix error: {}", err))
  }
}

impl From<VersionError> for RailError {
  fn from(err: VersionError) -> Self {
    RailError::Version(err)
  }
}

impl From<GitError> for RailError {
  fn from(err: GitError) -> Self {
    RailError::Git(err)
  }
}

impl From<PackageError> for RailError {
  fn from(err: PackageError) -> Self {
    RailError::Package(err)
  }
}

impl From<ValidationError> for RailError {
  fn from(err: ValidationError) -> Self {
    RailError::Validation(err)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but could not be parsed
  Invalid { path: PathBuf, reason: String },

  /// A field holds a value the workflow cannot use
  BadValue { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Fix the TOML syntax or delete the file to fall back to defaults.".to_string()),
      ConfigError::BadValue { field, .. } => Some(format!("Check the `{}` entry in mpkg.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::BadValue { field, reason } => {
        write!(f, "Invalid value for '{}': {}", field, reason)
      }
    }
  }
}

/// Version resolution errors
#[derive(Debug)]
pub enum VersionError {
  /// A document needed by the step is missing or unreadable
  SourceUnavailable { path: PathBuf, reason: String },

  /// No version supplied and none found in either document
  Unresolved { changelog: PathBuf, document: PathBuf },

  /// Supplied string is not N.N.N or N.N.N.N
  Invalid { input: String },

  /// Documents disagree with the resolved version
  Inconsistent { version: String, details: Vec<String> },
}

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::Unresolved { .. } => Some(
        "Pass --version <N.N.N>, add a `## [N.N.N]` heading to the changelog, or a `Package vN.N.N` comment to the package document."
          .to_string(),
      ),
      VersionError::Invalid { .. } => Some("Versions must be three or four dot-separated numbers without leading zeros, e.g. 2.1.0 or 2.1.0.1".to_string()),
      VersionError::Inconsistent { .. } => {
        Some("Update the changelog heading and package comment to agree, or drop --strict-version.".to_string())
      }
      VersionError::SourceUnavailable { path, .. } => Some(format!("Check that {} exists and is readable.", path.display())),
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::SourceUnavailable { path, reason } => {
        write!(f, "Source unavailable: {} ({})", path.display(), reason)
      }
      VersionError::Unresolved { changelog, document } => {
        write!(
          f,
          "Could not resolve a version from {} or {}",
          changelog.display(),
          document.display()
        )
      }
      VersionError::Invalid { input } => write!(f, "Invalid version '{}'", input),
      VersionError::Inconsistent { version, details } => {
        write!(f, "Version {} is inconsistent across sources", version)?;
        for detail in details {
          write!(f, "\n  - {}", detail)?;
        }
        Ok(())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Uncommitted changes when a clean tree is required
  RepositoryDirty { changes: Vec<String> },

  /// Branch checkout or creation failed
  BranchOpFailed { branch: String, stderr: String },

  /// Commit failed for a reason other than "nothing to commit"
  CommitFailed { stderr: String },

  /// Tag already exists and force was not requested
  TagExists { tag: String },

  /// Push failed
  PushFailed {
    remote: String,
    refname: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepositoryDirty { .. } => {
        Some("Commit or stash your changes first, or pass --skip-git-check.".to_string())
      }
      GitError::TagExists { tag } => Some(format!(
        "Pass --force-tag to move {} to the current commit, or bump the version.",
        tag
      )),
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have. Pull first.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your credentials for the remote.".to_string())
        } else {
          None
        }
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepositoryDirty { changes } => {
        write!(f, "Repository has {} uncommitted change(s)", changes.len())?;
        for change in changes.iter().take(10) {
          write!(f, "\n  {}", change)?;
        }
        if changes.len() > 10 {
          write!(f, "\n  ... and {} more", changes.len() - 10)?;
        }
        Ok(())
      }
      GitError::BranchOpFailed { branch, stderr } => {
        write!(f, "Branch operation on '{}' failed: {}", branch, stderr)
      }
      GitError::CommitFailed { stderr } => write!(f, "Commit failed: {}", stderr),
      GitError::TagExists { tag } => write!(f, "Tag '{}' already exists", tag),
      GitError::PushFailed { remote, refname, reason } => {
        write!(f, "Push of {} to {} failed: {}", refname, remote, reason)
      }
    }
  }
}

/// Package build errors
#[derive(Debug)]
pub enum PackageError {
  /// Build aborted; no artifact was left behind
  BuildFailed { stage: String, reason: String },

  /// Package is valid but its metadata record could not be written
  MetadataWriteFailed { path: PathBuf, reason: String },
}

impl PackageError {
  fn help_message(&self) -> Option<String> {
    match self {
      PackageError::BuildFailed { .. } => None,
      PackageError::MetadataWriteFailed { .. } => {
        Some("Run with --migrate-metadata to regenerate metadata from the package.".to_string())
      }
    }
  }
}

impl fmt::Display for PackageError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackageError::BuildFailed { stage, reason } => {
        write!(f, "Package build failed while {}: {}", stage, reason)
      }
      PackageError::MetadataWriteFailed { path, reason } => {
        write!(f, "Could not write metadata {}: {}", path.display(), reason)
      }
    }
  }
}

/// Validation gate errors
#[derive(Debug)]
pub enum ValidationError {
  /// One or more checks reported failure
  Failed { failed_checks: Vec<String>, errors: Vec<String> },

  /// Gate did not finish in time
  TimedOut { seconds: u64 },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::Failed { .. } => Some("Fix the reported problems or pass --skip-validation.".to_string()),
      ValidationError::TimedOut { .. } => {
        Some("Raise [validation] timeout_secs in mpkg.toml or pass --skip-validation.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::Failed { failed_checks, errors } => {
        write!(f, "Validation failed: {}", failed_checks.join(", "))?;
        for error in errors.iter().take(10) {
          write!(f, "\n  {}", error)?;
        }
        if errors.len() > 10 {
          write!(f, "\n  ... and {} more", errors.len() - 10)?;
        }
        Ok(())
      }
      ValidationError::TimedOut { seconds } => {
        write!(f, "Validation gate timed out after {}s", seconds)
      }
    }
  }
}

/// Result type alias for mpkg-rail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
