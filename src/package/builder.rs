//! Package construction
//!
//! Builds the archive in a scoped working directory, writes it to a temp file
//! beside the destination, hashes it there and persists it only once both
//! succeeded. The metadata record is derived from that hash.
//!
//! Output is reproducible: members are added in sorted order with fixed
//! timestamps and permissions, so identical inputs at the same version and
//! date hash identically.

use super::descriptor;
use super::metadata::{PackageMetadata, hash_file};
use super::naming::{BuildKind, PackageName};
use crate::core::config::PackageConfig;
use crate::core::context::{Clock, WorkflowContext};
use crate::core::error::{PackageError, RailError, RailResult};
use crate::ui::progress::FileProgress;
use crate::utils::{archive_member_name, format_count, format_mb};
use crate::version::Version;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// One file inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
  /// Relative, `/`-separated member path
  pub path: String,
  /// Uncompressed size
  pub size: u64,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuiltPackage {
  pub package: PathBuf,
  pub metadata: PackageMetadata,
  /// Where the metadata record was written, if writing succeeded
  pub metadata_path: Option<PathBuf>,
  pub members: Vec<ArchiveMember>,
  /// Non-fatal problems hit during the build
  pub warnings: Vec<String>,
}

impl BuiltPackage {
  /// Print the member list with sizes and totals
  pub fn print_summary(&self) {
    println!("\n📋 Package contents:");
    for member in &self.members {
      println!("   {} ({} bytes)", member.path, format_count(member.size));
    }
    let total: u64 = self.members.iter().map(|m| m.size).sum();
    println!(
      "\n📊 Total: {} files, {} bytes ({})",
      self.members.len(),
      format_count(total),
      format_mb(total)
    );
  }
}

/// Builds release and development packages for one project
pub struct PackageBuilder {
  root: PathBuf,
  package: PackageConfig,
  release_dir: PathBuf,
  dev_dir: PathBuf,
  output_override: Option<PathBuf>,
  clock: Arc<dyn Clock>,
}

fn build_failed(stage: &str, reason: impl ToString) -> RailError {
  RailError::Package(PackageError::BuildFailed {
    stage: stage.to_string(),
    reason: reason.to_string(),
  })
}

impl PackageBuilder {
  pub fn from_context(ctx: &WorkflowContext) -> Self {
    Self {
      root: ctx.root.clone(),
      package: ctx.config.package.clone(),
      release_dir: ctx.release_dir(),
      dev_dir: ctx.dev_dir(),
      output_override: ctx.options.output.as_ref().map(|p| ctx.path(p)),
      clock: Arc::clone(&ctx.clock),
    }
  }

  /// Destination of a package built at `at`
  pub fn output_path(&self, version: &Version, kind: BuildKind, at: DateTime<Utc>) -> PathBuf {
    if let Some(path) = &self.output_override {
      return path.clone();
    }
    let name = self.package.name();
    let ext = &self.package.extension;
    match kind {
      BuildKind::Release => self.release_dir.join(PackageName::release(&name, *version, ext).file_name()),
      BuildKind::Development => self
        .dev_dir
        .join(PackageName::development(&name, *version, at, ext).file_name()),
    }
  }

  /// Build from the configured document and resource directories
  pub fn build_project(&self, version: &Version, kind: BuildKind) -> RailResult<BuiltPackage> {
    let source = self.root.join(&self.package.document);
    let resources: Vec<PathBuf> = self.package.resources.iter().map(|r| self.root.join(r)).collect();
    self.build(&source, &resources, version, kind)
  }

  /// Build a package from `source` and `resource_dirs`
  pub fn build(
    &self,
    source: &Path,
    resource_dirs: &[PathBuf],
    version: &Version,
    kind: BuildKind,
  ) -> RailResult<BuiltPackage> {
    let now = self.clock.now();
    let output = self.output_path(version, kind, now);
    let mut warnings = Vec::new();

    if let Some(warning) = validate_source(source)? {
      warnings.push(warning);
    }

    let work = TempDir::new().map_err(|e| build_failed("creating working directory", e))?;
    tracing::debug!("working directory: {}", work.path().display());

    let source_name = source
      .file_name()
      .ok_or_else(|| build_failed("copying source", format!("{} has no file name", source.display())))?;
    fs::copy(source, work.path().join(source_name)).map_err(|e| build_failed("copying source", e))?;

    for dir in resource_dirs {
      if let Some(warning) = self.copy_resource_dir(dir, work.path()) {
        warnings.push(warning);
      }
    }

    let lua = descriptor::render(&self.package, version, now);
    fs::write(work.path().join(&self.package.descriptor), lua).map_err(|e| build_failed("writing descriptor", e))?;

    let (archive, members) = write_archive(work.path(), &output)?;
    let digest = seal(archive, &output)?;

    let metadata = PackageMetadata::with_digest(
      &output,
      digest,
      &version.to_string(),
      kind,
      now,
      &self.package.compatibility,
      &self.package.description,
    )
    .map_err(|e| build_failed("recording metadata", e))?;

    let record_path = PackageMetadata::path_for(&output);
    let metadata_path = match metadata.write(&record_path) {
      Ok(()) => Some(record_path),
      Err(e) if e.is_non_fatal() => {
        warnings.push(e.to_string());
        None
      }
      Err(e) => return Err(e),
    };

    for warning in &warnings {
      tracing::warn!("{}", warning);
    }

    Ok(BuiltPackage {
      package: output,
      metadata,
      metadata_path,
      members,
      warnings,
    })
  }

  /// Copy one resource directory into the working area; problems become warnings
  fn copy_resource_dir(&self, dir: &Path, work: &Path) -> Option<String> {
    if !dir.is_dir() {
      return Some(format!("{}/ directory not found, skipping", dir.display()));
    }

    let relative = dir
      .strip_prefix(&self.root)
      .ok()
      .filter(|r| archive_member_name(r).is_some())
      .map(Path::to_path_buf)
      .or_else(|| dir.file_name().map(PathBuf::from))?;
    let dest = work.join(&relative);

    match copy_tree(dir, &dest) {
      Ok(count) => {
        tracing::debug!("copied {} files from {}", count, dir.display());
        None
      }
      Err(e) => {
        let _ = fs::remove_dir_all(&dest);
        Some(format!("Could not copy {}: {}", dir.display(), e))
      }
    }
  }
}

/// Source must be a readable file; a missing XML declaration is only a warning
fn validate_source(source: &Path) -> RailResult<Option<String>> {
  if !source.exists() {
    return Err(build_failed("validating source", format!("{} not found", source.display())));
  }
  if !source.is_file() {
    return Err(build_failed("validating source", format!("{} is not a file", source.display())));
  }

  let file = File::open(source).map_err(|e| build_failed("validating source", e))?;
  let mut first_line = Vec::new();
  BufReader::new(file)
    .read_until(b'\n', &mut first_line)
    .map_err(|e| build_failed("validating source", e))?;

  let line = first_line.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&first_line[..]);
  if !line.trim_ascii_start().starts_with(b"<?xml") {
    return Ok(Some(format!("{} doesn't appear to be an XML file", source.display())));
  }
  Ok(None)
}

/// Copy a directory tree, returning the number of files copied
fn copy_tree(from: &Path, to: &Path) -> RailResult<usize> {
  let mut count = 0;
  for entry in WalkDir::new(from).sort_by_file_name() {
    let entry = entry?;
    let relative = entry.path().strip_prefix(from)?;
    let target = to.join(relative);
    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&target)?;
    } else if file_type.is_file() {
      fs::copy(entry.path(), &target)?;
      count += 1;
    } else {
      tracing::debug!("skipping non-regular file {}", entry.path().display());
    }
  }
  Ok(count)
}

/// Zip every file under `work` into a temp file beside `output`
fn write_archive(work: &Path, output: &Path) -> RailResult<(NamedTempFile, Vec<ArchiveMember>)> {
  const STAGE: &str = "writing archive";

  let mut files = Vec::new();
  for entry in WalkDir::new(work).sort_by_file_name() {
    let entry = entry.map_err(|e| build_failed(STAGE, e))?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry.path().strip_prefix(work).map_err(|e| build_failed(STAGE, e))?;
    let name = archive_member_name(relative)
      .ok_or_else(|| build_failed(STAGE, format!("bad member path {}", relative.display())))?;
    files.push((name, entry.path().to_path_buf()));
  }

  let out_dir = match output.parent() {
    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
    _ => PathBuf::from("."),
  };
  fs::create_dir_all(&out_dir).map_err(|e| build_failed("preparing output directory", e))?;
  let temp = NamedTempFile::new_in(&out_dir).map_err(|e| build_failed(STAGE, e))?;

  let fixed_time =
    zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).map_err(|e| build_failed(STAGE, format!("{:?}", e)))?;
  let options = SimpleFileOptions::default()
    .compression_method(zip::CompressionMethod::Deflated)
    .last_modified_time(fixed_time)
    .unix_permissions(0o644);

  let mut zip = ZipWriter::new(temp);
  let mut members = Vec::with_capacity(files.len());
  let mut progress = FileProgress::new(files.len(), "Packaging");

  for (name, path) in files {
    tracing::debug!("add {}", name);
    zip.start_file(name.clone(), options).map_err(|e| build_failed(STAGE, e))?;
    let mut file = File::open(&path).map_err(|e| build_failed(STAGE, e))?;
    let size = io::copy(&mut file, &mut zip).map_err(|e| build_failed(STAGE, e))?;
    members.push(ArchiveMember { path: name, size });
    progress.inc();
  }

  let mut temp = zip.finish().map_err(|e| build_failed(STAGE, e))?;
  temp.flush().map_err(|e| build_failed(STAGE, e))?;
  Ok((temp, members))
}

/// Hash the finished archive, then move it to `output`
///
/// On any failure the temp file is dropped and `output` is never created.
fn seal(archive: NamedTempFile, output: &Path) -> RailResult<(u64, String)> {
  let digest = hash_file(archive.path()).map_err(|e| build_failed("hashing archive", e))?;
  archive
    .persist(output)
    .map_err(|e| build_failed("writing archive", e.error))?;
  Ok(digest)
}
