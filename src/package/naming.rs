//! Package file naming
//!
//! - release: `<name>-v<version>.<ext>`
//! - development: `<name>-v<version>-dev-<YYYYMMDD-HHMMSS>.<ext>` (UTC)
//!
//! Parsing is the exact inverse; anything else is not one of ours.

use crate::version::Version;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const DEV_MARKER: &str = "-dev-";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Release or development build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
  Release,
  Development,
}

impl fmt::Display for BuildKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildKind::Release => write!(f, "release"),
      BuildKind::Development => write!(f, "development"),
    }
  }
}

/// Decoded package file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
  pub name: String,
  pub version: Version,
  pub kind: BuildKind,
  /// Build time, development builds only
  pub timestamp: Option<DateTime<Utc>>,
  pub extension: String,
}

impl PackageName {
  pub fn release(name: &str, version: Version, extension: &str) -> Self {
    Self {
      name: name.to_string(),
      version,
      kind: BuildKind::Release,
      timestamp: None,
      extension: extension.to_string(),
    }
  }

  pub fn development(name: &str, version: Version, at: DateTime<Utc>, extension: &str) -> Self {
    Self {
      name: name.to_string(),
      version,
      kind: BuildKind::Development,
      timestamp: Some(at),
      extension: extension.to_string(),
    }
  }

  /// File name without the extension
  pub fn base_name(&self) -> String {
    match self.timestamp {
      Some(at) if self.kind == BuildKind::Development => {
        format!("{}-v{}{}{}", self.name, self.version, DEV_MARKER, at.format(TIMESTAMP_FORMAT))
      }
      _ => format!("{}-v{}", self.name, self.version),
    }
  }

  pub fn file_name(&self) -> String {
    format!("{}.{}", self.base_name(), self.extension)
  }

  /// Decode a file name produced for package `name` with extension `extension`
  pub fn parse(file_name: &str, name: &str, extension: &str) -> Option<Self> {
    let stem = file_name
      .strip_suffix(extension)?
      .strip_suffix('.')?
      .strip_prefix(name)?
      .strip_prefix("-v")?;

    match stem.split_once(DEV_MARKER) {
      Some((version, stamp)) => {
        let version = Version::parse(version).ok()?;
        let at = parse_timestamp(stamp)?;
        Some(Self::development(name, version, at, extension))
      }
      None => {
        let version = Version::parse(stem).ok()?;
        Some(Self::release(name, version, extension))
      }
    }
  }

  /// Decode the file name of `path`
  pub fn parse_path(path: &Path, name: &str, extension: &str) -> Option<Self> {
    let file_name = path.file_name()?.to_str()?;
    Self::parse(file_name, name, extension)
  }
}

/// `YYYYMMDD-HHMMSS`, strictly fifteen characters
fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
  let bytes = stamp.as_bytes();
  let well_formed = bytes.len() == 15
    && bytes[8] == b'-'
    && bytes.iter().enumerate().all(|(i, b)| i == 8 || b.is_ascii_digit());
  if !well_formed {
    return None;
  }
  NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
    .ok()
    .map(|naive| naive.and_utc())
}
