//! Release tags
//!
//! Annotated `v<version>` tags at HEAD. An existing tag is an error unless the
//! caller forces a replacement.

use crate::core::context::WorkflowContext;
use crate::core::error::{GitError, RailError, RailResult};
use crate::core::vcs::SystemGit;
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
  Created(String),
  /// Existing tag was moved to HEAD
  Replaced(String),
}

impl TagOutcome {
  pub fn tag(&self) -> &str {
    match self {
      TagOutcome::Created(t) | TagOutcome::Replaced(t) => t,
    }
  }
}

pub struct TagManager {
  git: SystemGit,
  prefix: String,
}

impl TagManager {
  pub fn new(git: SystemGit, prefix: &str) -> Self {
    Self {
      git,
      prefix: prefix.to_string(),
    }
  }

  pub fn from_context(ctx: &WorkflowContext) -> Self {
    Self::new(ctx.git(), &ctx.config.git.tag_prefix)
  }

  pub fn tag_name(&self, version: &Version) -> String {
    format!("{}{}", self.prefix, version)
  }

  /// What `tag` would do, without touching the repository
  pub fn plan(&self, version: &Version, force: bool) -> RailResult<TagOutcome> {
    let tag = self.tag_name(version);
    if !self.git.tag_exists(&tag) {
      return Ok(TagOutcome::Created(tag));
    }
    if force {
      Ok(TagOutcome::Replaced(tag))
    } else {
      Err(RailError::Git(GitError::TagExists { tag }))
    }
  }

  /// Create the release tag at HEAD
  pub fn tag(&self, version: &Version, force: bool) -> RailResult<TagOutcome> {
    let outcome = self.plan(version, force)?;
    let tag = outcome.tag().to_string();
    let message = format!("Release v{}", version);

    let output = self.git.create_tag(&tag, &message, force);
    if !output.success() {
      let diagnostic = output.diagnostic();
      // Lost a race with another tagger
      if diagnostic.contains("already exists") {
        return Err(RailError::Git(GitError::TagExists { tag }));
      }
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git tag -a {}", tag),
        stderr: diagnostic,
      }));
    }
    Ok(outcome)
  }
}
