pub mod system_git;

#[cfg(test)]
pub mod fake;

pub use system_git::SystemGit;
