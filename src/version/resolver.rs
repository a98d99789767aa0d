//! Version resolution and cross-document consistency
//!
//! The two version patterns live here and nowhere else:
//!
//! - ChangeLog: the first (topmost) bracketed `[N.N.N]` or `[N.N.N.N]`
//! - Package document: the `Package vN.N.N[.N]` header comment
//!
//! An `[Unreleased]` heading never matches.

use super::Version;
use crate::core::context::WorkflowContext;
use crate::core::error::{RailResult, VersionError};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const CHANGELOG_PATTERN: &str = r"\[([0-9]+\.[0-9]+\.[0-9]+(?:\.[0-9]+)?)\]";
const HEADER_PATTERN: &str = r"Package v([0-9]+\.[0-9]+\.[0-9]+(?:\.[0-9]+)?)";

/// Where a resolved version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
  /// Passed on the command line
  Explicit,
  ChangeLog,
  HeaderDocument,
}

impl fmt::Display for VersionSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionSource::Explicit => write!(f, "command line"),
      VersionSource::ChangeLog => write!(f, "changelog"),
      VersionSource::HeaderDocument => write!(f, "package document"),
    }
  }
}

/// Per-source outcome of a consistency check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
  Match,
  /// Source holds a different version
  Mismatch(Version),
  /// Source readable but carries no version pattern
  NotFound,
  /// Source missing or unreadable
  Unavailable,
}

impl fmt::Display for SourceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SourceStatus::Match => write!(f, "matches"),
      SourceStatus::Mismatch(found) => write!(f, "has {}", found),
      SourceStatus::NotFound => write!(f, "has no version"),
      SourceStatus::Unavailable => write!(f, "is unavailable"),
    }
  }
}

/// Result of comparing a version against both documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
  pub version: Version,
  pub changelog: SourceStatus,
  pub document: SourceStatus,
}

impl ConsistencyReport {
  /// No source disagrees (missing versions are not disagreement)
  pub fn is_consistent(&self) -> bool {
    !matches!(self.changelog, SourceStatus::Mismatch(_)) && !matches!(self.document, SourceStatus::Mismatch(_))
  }

  /// One human-readable line per source that is not a match
  pub fn details(&self) -> Vec<String> {
    let mut details = Vec::new();
    if self.changelog != SourceStatus::Match {
      details.push(format!("changelog {}", self.changelog));
    }
    if self.document != SourceStatus::Match {
      details.push(format!("package document {}", self.document));
    }
    details
  }

  /// Convert a mismatch into `VersionError::Inconsistent`
  pub fn to_error(&self) -> Option<VersionError> {
    if self.is_consistent() {
      return None;
    }
    Some(VersionError::Inconsistent {
      version: self.version.to_string(),
      details: self.details(),
    })
  }
}

/// Extracts, compares and stamps versions in the project documents
pub struct VersionResolver {
  changelog_path: PathBuf,
  document_path: PathBuf,
  changelog_re: Regex,
  header_re: Regex,
}

impl VersionResolver {
  pub fn new(changelog_path: &Path, document_path: &Path) -> RailResult<Self> {
    Ok(Self {
      changelog_path: changelog_path.to_path_buf(),
      document_path: document_path.to_path_buf(),
      changelog_re: Regex::new(CHANGELOG_PATTERN)?,
      header_re: Regex::new(HEADER_PATTERN)?,
    })
  }

  pub fn from_context(ctx: &WorkflowContext) -> RailResult<Self> {
    Self::new(&ctx.changelog_path(), &ctx.document_path())
  }

  pub fn document_path(&self) -> &Path {
    &self.document_path
  }

  /// First bracketed version in changelog text
  pub fn extract_changelog(&self, text: &str) -> Option<Version> {
    self
      .changelog_re
      .captures(text)
      .and_then(|c| Version::parse(&c[1]).ok())
  }

  /// `Package vX` version in package document text
  pub fn extract_header(&self, text: &str) -> Option<Version> {
    self.header_re.captures(text).and_then(|c| Version::parse(&c[1]).ok())
  }

  /// Resolve the working version
  #[cfg(test)]
  pub fn resolve(&self, explicit: Option<&str>) -> RailResult<Version> {
    self.resolve_with_source(explicit).map(|(version, _)| version)
  }

  /// Resolve the working version and report which source supplied it
  ///
  /// Explicit input is validated and returned verbatim. Otherwise the
  /// changelog wins over the package document.
  pub fn resolve_with_source(&self, explicit: Option<&str>) -> RailResult<(Version, VersionSource)> {
    if let Some(input) = explicit {
      return Ok((Version::parse(input)?, VersionSource::Explicit));
    }

    match fs::read_to_string(&self.changelog_path) {
      Ok(text) => {
        if let Some(version) = self.extract_changelog(&text) {
          return Ok((version, VersionSource::ChangeLog));
        }
        tracing::debug!("no version heading in {}", self.changelog_path.display());
      }
      Err(e) => tracing::debug!("changelog {} unreadable: {}", self.changelog_path.display(), e),
    }

    if let Ok(text) = fs::read_to_string(&self.document_path)
      && let Some(version) = self.extract_header(&text)
    {
      return Ok((version, VersionSource::HeaderDocument));
    }

    Err(
      VersionError::Unresolved {
        changelog: self.changelog_path.clone(),
        document: self.document_path.clone(),
      }
      .into(),
    )
  }

  /// Compare `version` against both documents' text; `None` text means unavailable
  pub fn check_consistency(&self, version: &Version, xml: Option<&str>, changelog: Option<&str>) -> ConsistencyReport {
    let status = |found: Option<Option<Version>>| match found {
      None => SourceStatus::Unavailable,
      Some(None) => SourceStatus::NotFound,
      Some(Some(v)) if v == *version => SourceStatus::Match,
      Some(Some(v)) => SourceStatus::Mismatch(v),
    };

    ConsistencyReport {
      version: *version,
      changelog: status(changelog.map(|t| self.extract_changelog(t))),
      document: status(xml.map(|t| self.extract_header(t))),
    }
  }

  /// Read both documents from disk and check them against `version`
  pub fn consistency_report(&self, version: &Version) -> ConsistencyReport {
    let xml = fs::read_to_string(&self.document_path).ok();
    let changelog = fs::read_to_string(&self.changelog_path).ok();
    self.check_consistency(version, xml.as_deref(), changelog.as_deref())
  }

  /// Rewrite the first `Package vX` token to `version`
  ///
  /// Returns `None` when the document has no such token or it already reads `version`.
  pub fn stamp_header(&self, xml: &str, version: &Version) -> Option<String> {
    let caps = self.header_re.captures(xml)?;
    let current = caps.get(1)?;
    let replacement = version.to_string();
    if current.as_str() == replacement {
      return None;
    }

    let mut stamped = String::with_capacity(xml.len() + replacement.len());
    stamped.push_str(&xml[..current.start()]);
    stamped.push_str(&replacement);
    stamped.push_str(&xml[current.end()..]);
    Some(stamped)
  }
}
