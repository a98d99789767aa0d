//! Core building blocks shared by every mpkg-rail command
//!
//! - **config**: mpkg.toml parsing and validation
//! - **context**: Workflow context built once per invocation
//! - **error**: Error taxonomy with contextual help messages
//! - **runner**: External command execution
//! - **vcs**: Git operations over the command runner (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod vcs;
