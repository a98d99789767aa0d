//! External command execution
//!
//! Every subprocess the workflow starts goes through [`CommandRunner`]. A
//! non-zero exit is data, not an error: callers inspect [`CommandOutput`] and
//! decide what the exit status means for their step.

use std::io;
use std::path::Path;
use std::process::Command;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
  pub exit_code: i32,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  /// stderr if present, otherwise stdout (git prints some failures on stdout)
  pub fn diagnostic(&self) -> String {
    let stderr = self.stderr.trim();
    if stderr.is_empty() {
      self.stdout.trim().to_string()
    } else {
      stderr.to_string()
    }
  }
}

/// Runs external executables
pub trait CommandRunner: Send + Sync {
  /// Run `argv[0]` with the remaining arguments, optionally in `cwd`
  fn run(&self, argv: &[&str], cwd: Option<&Path>) -> CommandOutput;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, argv: &[&str], cwd: Option<&Path>) -> CommandOutput {
    let Some((program, args)) = argv.split_first() else {
      return CommandOutput {
        stdout: String::new(),
        stderr: "empty command".to_string(),
        exit_code: 1,
      };
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
      cmd.current_dir(dir);
    }

    tracing::debug!("exec: {}", argv.join(" "));

    match cmd.output() {
      Ok(output) => CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        // Killed by signal has no code
        exit_code: output.status.code().unwrap_or(-1),
      },
      Err(e) if e.kind() == io::ErrorKind::NotFound => CommandOutput {
        stdout: String::new(),
        stderr: format!("executable not found: {}", program),
        exit_code: 1,
      },
      Err(e) => CommandOutput {
        stdout: String::new(),
        stderr: format!("failed to start {}: {}", program, e),
        exit_code: 1,
      },
    }
  }
}
