//! External test suite check
//!
//! Runs the project's own test command (`[validation] test_command`) from the
//! project root. Only part of the gate with `--run-tests`.

use super::trait_def::{Check, CheckInput, CheckOutcome};

/// Lines of output kept from a failing run
const TAIL_LINES: usize = 20;

pub struct TestSuiteCheck;

impl Check for TestSuiteCheck {
  fn name(&self) -> &str {
    "test-suite"
  }

  fn description(&self) -> &str {
    "Project test suite passes"
  }

  fn run(&self, input: &CheckInput) -> CheckOutcome {
    let command = &input.config.validation.test_command;
    if command.is_empty() {
      return CheckOutcome::skipped(self.name(), "no [validation] test_command configured");
    }
    if input.cancelled() {
      return CheckOutcome::skipped(self.name(), "cancelled");
    }

    let argv: Vec<&str> = command.iter().map(String::as_str).collect();
    let output = input.runner.run(&argv, Some(&input.root));

    let mut outcome = CheckOutcome::new(self.name());
    if output.success() {
      outcome.info(format!("`{}` passed", command.join(" ")));
      return outcome;
    }

    outcome.error(format!("`{}` exited with {}", command.join(" "), output.exit_code));
    let combined = format!("{}\n{}", output.stdout, output.stderr);
    let lines: Vec<&str> = combined.lines().filter(|l| !l.trim().is_empty()).collect();
    for line in &lines[lines.len().saturating_sub(TAIL_LINES)..] {
      outcome.info(line.to_string());
    }
    outcome
  }
}
