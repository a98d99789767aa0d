//! Package version identifiers and their resolution from project documents

mod resolver;

pub use resolver::VersionResolver;

use crate::core::error::VersionError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Three or four numeric components: major.minor.patch[.build]
///
/// A missing build component compares as 0, but `Display` reproduces the
/// original component count, so `1.2.3` and `1.2.3.0` are equal yet print
/// differently. Leading zeros are rejected, so every accepted input prints
/// back exactly as given.
#[derive(Debug, Clone, Copy)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub build: Option<u64>,
}

impl Version {
  /// Parse `N.N.N` or `N.N.N.N`
  pub fn parse(input: &str) -> Result<Self, VersionError> {
    let invalid = || VersionError::Invalid {
      input: input.to_string(),
    };

    let parts: Vec<&str> = input.split('.').collect();
    if !(3..=4).contains(&parts.len()) {
      return Err(invalid());
    }

    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
      if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
      }
      // `01` would print back as `1` in branch, tag and file names
      if part.len() > 1 && part.starts_with('0') {
        return Err(invalid());
      }
      numbers.push(part.parse::<u64>().map_err(|_| invalid())?);
    }

    Ok(Self {
      major: numbers[0],
      minor: numbers[1],
      patch: numbers[2],
      build: numbers.get(3).copied(),
    })
  }

  fn key(&self) -> (u64, u64, u64, u64) {
    (self.major, self.minor, self.patch, self.build.unwrap_or(0))
  }
}

impl FromStr for Version {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Version::parse(s)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
    if let Some(build) = self.build {
      write!(f, ".{}", build)?;
    }
    Ok(())
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.key() == other.key()
  }
}

impl Eq for Version {}

impl Hash for Version {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.key().hash(state);
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    self.key().cmp(&other.key())
  }
}
