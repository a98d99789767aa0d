//! Release workflow
//!
//! The managers each own one kind of repository mutation and re-query state
//! before acting. The orchestrator sequences them:
//!
//! ```text
//! resolve version -> clean tree -> validate -> stamp header -> branch -> commit
//!   -> (merge into mainline) -> package -> tag -> (push)
//! ```

pub mod branch;
pub mod commit;
pub mod orchestrator;
pub mod tag;

pub use branch::BranchManager;
pub use commit::{ChangeCommitter, CommitOutcome};
pub use orchestrator::ReleaseOrchestrator;
pub use tag::TagManager;
