//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars. Bars are only drawn when
//! stderr is a terminal; otherwise every call is a no-op.

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// Progress bar for files written into an archive
pub struct FileProgress {
  inner: Option<(Progress, Bar)>,
}

impl FileProgress {
  /// Create a progress bar, or a silent one when stderr is not a terminal
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    if !std::io::stderr().is_terminal() || total == 0 {
      return Self::hidden();
    }
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      inner: Some((progress, bar)),
    }
  }

  pub fn hidden() -> Self {
    Self { inner: None }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    if let Some((progress, bar)) = self.inner.as_mut() {
      progress.inc_and_draw(bar, 1);
    }
  }
}
