//! Utility functions for cross-platform path handling and output formatting

use std::path::{Component, Path};

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Archive member name for a path relative to the archive root
///
/// Normal components joined with `/`; no leading separator, no `.` or `..`.
pub fn archive_member_name(relative: &Path) -> Option<String> {
  let mut parts = Vec::new();
  for component in relative.components() {
    match component {
      Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
      Component::CurDir => {}
      _ => return None,
    }
  }
  if parts.is_empty() {
    return None;
  }
  Some(parts.join("/"))
}

/// `1234567` -> `1,234,567`
pub fn format_count(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// Bytes as MB with one decimal, matching the package summary lines
pub fn format_mb(bytes: u64) -> String {
  format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
