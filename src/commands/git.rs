//! Individual git steps: `--git-branch`, `--git-commit`, `--git-tag`

use crate::core::context::WorkflowContext;
use crate::core::error::{GitError, RailError, RailResult, ResultExt};
use crate::package::BuiltPackage;
use crate::release::branch::BranchOutcome;
use crate::release::tag::TagOutcome;
use crate::release::{BranchManager, ChangeCommitter, CommitOutcome, TagManager};
use crate::version::Version;
use std::fs;

pub fn run_branch(ctx: &WorkflowContext, version: &Version) -> RailResult<()> {
  let branches = BranchManager::from_context(ctx);
  if ctx.options.dry_run {
    match branches.plan(version)? {
      BranchOutcome::Created(b) => println!("🔍 Would create branch {}", b),
      BranchOutcome::CheckedOut(b) => println!("🔍 Would check out existing branch {}", b),
      BranchOutcome::AlreadyCurrent(b) => println!("🔍 Already on {}", b),
    }
    return Ok(());
  }

  match branches.ensure_branch(version)? {
    BranchOutcome::Created(b) => println!("🌿 Created branch {}", b),
    BranchOutcome::CheckedOut(b) => println!("🌿 Checked out existing branch {}", b),
    BranchOutcome::AlreadyCurrent(b) => println!("🌿 Already on {}", b),
  }
  Ok(())
}

pub fn run_commit(ctx: &WorkflowContext, version: &Version) -> RailResult<()> {
  let committer = ChangeCommitter::from_context(ctx);
  let files = ctx.config.commit_files();
  if ctx.options.dry_run {
    println!("🔍 Would commit: {}", committer.stageable(&files).join(", "));
    return Ok(());
  }
  print_commit(committer.commit(version, &files)?);
  Ok(())
}

/// Commit a development package and its record onto the highest release branch
///
/// The branch (or detached commit) we started on is checked out again
/// afterwards, even when the commit fails.
pub fn run_dev_commit(ctx: &WorkflowContext, version: &Version, built: &BuiltPackage) -> RailResult<()> {
  let branches = BranchManager::from_context(ctx);
  let Some((target, _)) = branches.highest_release_branch()? else {
    eprintln!("⚠️  No release branches found; development build not committed");
    return Ok(());
  };

  let mut files = vec![built.package.clone()];
  if let Some(record) = &built.metadata_path {
    files.push(record.clone());
  }
  let file_name = built
    .package
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let message = format!("Add development build v{} ({})", version, file_name);

  // Checking out the original branch deletes files tracked only on the release branch
  let mut saved = Vec::new();
  for path in &files {
    saved.push((path.clone(), fs::read(path)?));
  }

  let git = ctx.git();
  let original = match git.current_branch()? {
    detached if detached == "HEAD" => git.head_commit()?,
    branch => branch,
  };
  let switch = original != target;
  if switch {
    let output = git.checkout(&target);
    if !output.success() {
      return Err(RailError::Git(GitError::BranchOpFailed {
        branch: target,
        stderr: output.diagnostic(),
      }));
    }
  }

  let result = ChangeCommitter::from_context(ctx).commit_with_message(&files, &message, true);

  if switch {
    let output = git.checkout(&original);
    if !output.success() {
      eprintln!("⚠️  Could not switch back to {}: {}", original, output.diagnostic());
    }
    for (path, bytes) in saved {
      if !path.exists() {
        fs::write(&path, bytes).context(format!("Failed to restore {}", path.display()))?;
      }
    }
  }

  let outcome = result?;
  println!("📌 Development build on {}:", target);
  print_commit(outcome);
  Ok(())
}

pub fn run_tag(ctx: &WorkflowContext, version: &Version) -> RailResult<()> {
  let tags = TagManager::from_context(ctx);
  let force = ctx.options.force_tag;
  if ctx.options.dry_run {
    match tags.plan(version, force) {
      Ok(TagOutcome::Created(t)) => println!("🔍 Would create tag {}", t),
      Ok(TagOutcome::Replaced(t)) => println!("🔍 Would replace tag {}", t),
      Err(e) => println!("🔍 Would stop: {}", e),
    }
    return Ok(());
  }

  match tags.tag(version, force)? {
    TagOutcome::Created(t) => println!("🏷️  Created tag {}", t),
    TagOutcome::Replaced(t) => println!("🏷️  Replaced tag {}", t),
  }
  Ok(())
}

fn print_commit(outcome: CommitOutcome) {
  match outcome {
    CommitOutcome::Committed(sha) => println!("📝 Committed {}", &sha[..sha.len().min(12)]),
    CommitOutcome::NothingToCommit => println!("📝 Nothing to commit"),
  }
}
