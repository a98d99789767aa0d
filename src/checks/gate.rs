//! Validation gate
//!
//! Runs every registered check on a bounded rayon pool and waits for all of
//! them, up to a fixed timeout. Timing out is a hard failure: the shared cancel
//! flag is raised so in-flight checks stop early, and the gate returns without
//! waiting for them.

use super::script_syntax::ScriptSyntaxCheck;
use super::structure::DocumentStructureCheck;
use super::test_suite::TestSuiteCheck;
use super::trait_def::{Check, CheckInput, CheckOutcome, Severity};
use crate::core::config::RailConfig;
use crate::core::error::{RailError, RailResult, ValidationError};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Aggregated outcomes of one gate run
#[derive(Debug, Clone)]
pub struct GateReport {
  pub outcomes: Vec<CheckOutcome>,
}

impl GateReport {
  pub fn passed(&self) -> bool {
    self.outcomes.iter().all(CheckOutcome::passed)
  }

  pub fn failed_checks(&self) -> Vec<String> {
    self
      .outcomes
      .iter()
      .filter(|o| !o.passed())
      .map(|o| o.check_name.clone())
      .collect()
  }

  /// `Ok` when every check passed, else `ValidationError::Failed`
  pub fn into_result(self) -> RailResult<Self> {
    if self.passed() {
      return Ok(self);
    }
    let errors = self
      .outcomes
      .iter()
      .flat_map(|o| o.messages(Severity::Error).map(move |m| format!("{}: {}", o.check_name, m)))
      .collect();
    Err(RailError::Validation(ValidationError::Failed {
      failed_checks: self.failed_checks(),
      errors,
    }))
  }

  pub fn print(&self) {
    for outcome in &self.outcomes {
      let icon = if outcome.skipped {
        "⏭️ "
      } else if outcome.passed() {
        "✅"
      } else {
        "❌"
      };
      println!("   {} {}", icon, outcome.check_name);
      for diagnostic in &outcome.diagnostics {
        match diagnostic.severity {
          Severity::Error => println!("      ❌ {}", diagnostic.message),
          Severity::Warning => println!("      ⚠️  {}", diagnostic.message),
          Severity::Info => tracing::info!("{}: {}", outcome.check_name, diagnostic.message),
        }
      }
    }
  }
}

/// Bounded, cancellable runner for a set of checks
pub struct ValidationGate {
  checks: Vec<Arc<dyn Check>>,
  workers: usize,
  timeout: Duration,
}

impl ValidationGate {
  pub fn new(workers: usize, timeout: Duration) -> Self {
    Self {
      checks: Vec::new(),
      workers: workers.max(1),
      timeout,
    }
  }

  pub fn with_check(mut self, check: Arc<dyn Check>) -> Self {
    self.checks.push(check);
    self
  }

  pub fn check_names(&self) -> Vec<&str> {
    self.checks.iter().map(|c| c.name()).collect()
  }

  /// `(name, description)` of every registered check
  pub fn describe(&self) -> Vec<(&str, &str)> {
    self.checks.iter().map(|c| (c.name(), c.description())).collect()
  }

  /// Run all checks; blocks until they finish or the timeout elapses
  pub fn run(&self, input: CheckInput) -> RailResult<GateReport> {
    let cancel = Arc::clone(&input.cancel);
    let checks = self.checks.clone();
    let workers = self.workers;
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
      let result = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map(|pool| {
          pool.install(|| {
            checks
              .par_iter()
              .map(|check| {
                if input.cancelled() {
                  return CheckOutcome::skipped(check.name(), "cancelled");
                }
                tracing::debug!("running check {} ({})", check.name(), check.description());
                check.run(&input)
              })
              .collect::<Vec<_>>()
          })
        })
        .map_err(|e| e.to_string());
      // Receiver is gone after a timeout
      let _ = tx.send(result);
    });

    match rx.recv_timeout(self.timeout) {
      Ok(Ok(outcomes)) => Ok(GateReport { outcomes }),
      Ok(Err(e)) => Err(RailError::with_help(
        format!("Could not start validation workers: {}", e),
        "Lower [validation] workers in mpkg.toml",
      )),
      Err(RecvTimeoutError::Timeout) => {
        cancel.store(true, Ordering::Relaxed);
        Err(RailError::Validation(ValidationError::TimedOut {
          seconds: self.timeout.as_secs(),
        }))
      }
      Err(RecvTimeoutError::Disconnected) => Err(RailError::message("Validation worker terminated unexpectedly")),
    }
  }
}

/// Gate with the built-in checks; the test suite only when requested
pub fn create_default_gate(config: &RailConfig, run_tests: bool) -> ValidationGate {
  let mut gate = ValidationGate::new(
    config.validation.workers,
    Duration::from_secs(config.validation.timeout_secs),
  )
  .with_check(Arc::new(DocumentStructureCheck))
  .with_check(Arc::new(ScriptSyntaxCheck));

  if run_tests {
    gate = gate.with_check(Arc::new(TestSuiteCheck));
  }
  gate
}
