//! Group-scoped GitLab resources

pub mod group;
pub mod member;

pub use group::*;
pub use member::*;
