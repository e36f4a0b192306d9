//! Project-scoped GitLab resources

pub mod access_token;
pub mod deploy_key;
pub mod deploy_token;
pub mod file;
pub mod hook;
pub mod member;
pub mod pipeline_schedule;
pub mod project;
pub mod variable;

pub use access_token::*;
pub use deploy_key::*;
pub use deploy_token::*;
pub use file::*;
pub use hook::*;
pub use member::*;
pub use pipeline_schedule::*;
pub use project::*;
pub use variable::*;
