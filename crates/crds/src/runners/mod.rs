//! GitLab runner resources

pub mod user_runner;

pub use user_runner::*;
