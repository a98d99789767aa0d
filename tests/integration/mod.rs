//! Integration tests driving the mpkg-rail binary against real git repositories

mod helpers;
mod test_git;
mod test_maintenance;
mod test_package;
mod test_release;
