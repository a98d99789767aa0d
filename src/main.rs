mod checks;
mod commands;
mod core;
mod package;
mod release;
mod ui;
mod utils;
mod version;

use clap::{ArgAction, Parser};
use core::context::{WorkflowContext, WorkflowOptions};
use core::error::{RailError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Release orchestration for single-archive packages
#[derive(Parser)]
#[command(name = "mpkg-rail")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Package version (N.N.N or N.N.N.N); auto-detected from the changelog, then the package document
  #[arg(long = "version", value_name = "V")]
  pkg_version: Option<String>,

  /// Build a development package instead of a release package
  #[arg(long, visible_alias = "test")]
  dev: bool,

  // ============================================================================
  // Release workflow
  // ============================================================================
  /// Run the full release workflow
  #[arg(long)]
  release: bool,

  /// Print every intended action without changing anything
  #[arg(long)]
  dry_run: bool,

  /// Push the release branch and tag after tagging
  #[arg(long)]
  push: bool,

  /// Replace an existing tag
  #[arg(long)]
  force_tag: bool,

  /// Skip the validation gate
  #[arg(long)]
  skip_validation: bool,

  /// Allow a dirty working tree
  #[arg(long)]
  skip_git_check: bool,

  /// Include the project's test suite in validation
  #[arg(long)]
  run_tests: bool,

  /// Fail when the changelog and package document disagree with the version
  #[arg(long)]
  strict_version: bool,

  // ============================================================================
  // Individual git steps
  // ============================================================================
  /// Create or check out release/v<version>
  #[arg(long)]
  git_branch: bool,

  /// Commit the release files (with --dev: commit the development build to the highest release branch)
  #[arg(long)]
  git_commit: bool,

  /// Create the v<version> tag
  #[arg(long)]
  git_tag: bool,

  // ============================================================================
  // Maintenance
  // ============================================================================
  /// List built packages and their metadata
  #[arg(long, conflicts_with_all = BUILD_FLAGS)]
  list: bool,

  /// Create JSON metadata for packages that lack it and drop legacy checksum files
  #[arg(long, conflicts_with_all = BUILD_FLAGS)]
  migrate_metadata: bool,

  /// Remove legacy checksum files and orphaned metadata
  #[arg(long, conflicts_with_all = BUILD_FLAGS)]
  cleanup_legacy: bool,

  // ============================================================================
  // Output
  // ============================================================================
  /// Package output path (overrides the configured directories)
  #[arg(long, value_name = "PATH")]
  output: Option<PathBuf>,

  /// Number of development builds to keep
  #[arg(long, value_name = "K")]
  retain: Option<usize>,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

/// Flags that build, release or touch git; maintenance excludes all of them
const BUILD_FLAGS: [&str; 5] = ["dev", "release", "git_branch", "git_commit", "git_tag"];

impl Cli {
  fn options(&self) -> WorkflowOptions {
    WorkflowOptions {
      dry_run: self.dry_run,
      skip_validation: self.skip_validation,
      skip_git_check: self.skip_git_check,
      force_tag: self.force_tag,
      push: self.push,
      run_tests: self.run_tests,
      strict_version: self.strict_version,
      explicit_version: self.pkg_version.clone(),
      output: self.output.clone(),
      retain: self.retain,
    }
  }

  fn actions(&self) -> commands::Actions {
    commands::Actions {
      release: self.release,
      dev: self.dev,
      git_branch: self.git_branch,
      git_commit: self.git_commit,
      git_tag: self.git_tag,
      list: self.list,
      migrate_metadata: self.migrate_metadata,
      cleanup_legacy: self.cleanup_legacy,
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };
  // RUST_LOG wins unless -v was given
  let filter = if verbose == 0 {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
  } else {
    EnvFilter::new(default)
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Build context once (loads mpkg.toml)
  let mut ctx = match WorkflowContext::build(&root, cli.options()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  if let Err(err) = commands::run(&mut ctx, cli.actions()) {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
