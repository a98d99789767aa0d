//! Validation gate and its checks
//!
//! All checks implement the `Check` trait and run on the gate's bounded worker
//! pool before packaging.
//!
//! # Built-in Checks
//!
//! - **document-structure**: well-formed XML, expected root element, script body heuristics
//! - **script-syntax**: every embedded script compiles with `luac -p` (skipped without luac)
//! - **test-suite**: the project's external test command (only with `--run-tests`)

mod document;
mod gate;
mod script_syntax;
mod structure;
mod test_suite;
mod trait_def;

pub use gate::{ValidationGate, create_default_gate};
pub use trait_def::CheckInput;
