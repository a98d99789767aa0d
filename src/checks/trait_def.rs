//! Check trait abstraction for the validation gate
//!
//! Every validation the gate runs implements [`Check`]. Checks are independent:
//! each reads its own inputs, owns its temp files and reports a
//! [`CheckOutcome`]. A long-running check should poll [`CheckInput::cancelled`]
//! and stop early once the gate has given up on it.

use crate::core::config::RailConfig;
use crate::core::runner::CommandRunner;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Severity level for check diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Warning (non-blocking, but should be addressed)
  Warning,
  /// Error (blocking, must be fixed)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warning => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// One finding from a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub severity: Severity,
  pub message: String,
}

/// Result of running a check
#[derive(Debug, Clone)]
pub struct CheckOutcome {
  /// Name of the check that ran
  pub check_name: String,
  /// Check did not run (tool missing, not configured, cancelled)
  pub skipped: bool,
  pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
  pub fn new(check_name: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      skipped: false,
      diagnostics: Vec::new(),
    }
  }

  /// Outcome for a check that could not run; never a failure
  pub fn skipped(check_name: impl Into<String>, reason: impl Into<String>) -> Self {
    let mut outcome = Self::new(check_name);
    outcome.skipped = true;
    outcome.warning(reason);
    outcome
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(Severity::Error, message);
  }

  pub fn warning(&mut self, message: impl Into<String>) {
    self.push(Severity::Warning, message);
  }

  pub fn info(&mut self, message: impl Into<String>) {
    self.push(Severity::Info, message);
  }

  fn push(&mut self, severity: Severity, message: impl Into<String>) {
    self.diagnostics.push(Diagnostic {
      severity,
      message: message.into(),
    });
  }

  /// Passed unless an error was reported
  pub fn passed(&self) -> bool {
    !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
  }

  pub fn messages(&self, severity: Severity) -> impl Iterator<Item = &str> {
    self
      .diagnostics
      .iter()
      .filter(move |d| d.severity == severity)
      .map(|d| d.message.as_str())
  }
}

/// Inputs shared by every check in one gate run
#[derive(Clone)]
pub struct CheckInput {
  /// Project root directory
  pub root: PathBuf,
  /// Package document to validate
  pub document: PathBuf,
  pub config: Arc<RailConfig>,
  pub runner: Arc<dyn CommandRunner>,
  /// Raised by the gate when it stops waiting
  pub cancel: Arc<AtomicBool>,
}

impl CheckInput {
  pub fn cancelled(&self) -> bool {
    self.cancel.load(Ordering::Relaxed)
  }
}

/// Validation check trait
///
/// ```rust,ignore
/// struct MyCheck;
///
/// impl Check for MyCheck {
///   fn name(&self) -> &str {
///     "my-check"
///   }
///
///   fn description(&self) -> &str {
///     "Validates my custom requirement"
///   }
///
///   fn run(&self, input: &CheckInput) -> CheckOutcome {
///     let mut outcome = CheckOutcome::new(self.name());
///     if !input.document.exists() {
///       outcome.error("package document missing");
///     }
///     outcome
///   }
/// }
/// ```
pub trait Check: Send + Sync {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  /// Run the check
  fn run(&self, input: &CheckInput) -> CheckOutcome;
}
