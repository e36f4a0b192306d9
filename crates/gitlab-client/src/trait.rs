//! GitLabClient trait for mocking
//!
//! This trait abstracts the GitLabClient to enable mocking in unit tests.
//! The concrete GitLabClient implements this trait, and tests can use
//! `MockGitLabClient` (feature `test-util`).
//!
//! Every "get" returns `GitLabError::NotFound` when the remote answers 404.

use crate::error::GitLabError;
use crate::models::*;

/// Trait for GitLab API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait GitLabClientTrait: Send + Sync {
    /// Get the API base URL
    fn base_url(&self) -> &str;

    /// The user the credentials belong to
    async fn current_user(&self) -> Result<User, GitLabError>;

    // Users
    async fn list_users_by_username(&self, username: &str) -> Result<Vec<User>, GitLabError>;

    // Groups
    async fn get_group(&self, id: i64) -> Result<Group, GitLabError>;
    async fn create_group(&self, options: &GroupOptions) -> Result<Group, GitLabError>;
    async fn update_group(&self, id: i64, options: &GroupOptions) -> Result<Group, GitLabError>;
    async fn delete_group(&self, id: i64) -> Result<(), GitLabError>;
    async fn share_group(&self, id: i64, options: &ShareGroupOptions) -> Result<Group, GitLabError>;
    async fn unshare_group(&self, id: i64, group_id: i64) -> Result<(), GitLabError>;

    // Group members
    async fn get_group_member(&self, group_id: i64, user_id: i64) -> Result<Member, GitLabError>;
    async fn add_group_member(&self, group_id: i64, options: &MemberOptions) -> Result<Member, GitLabError>;
    async fn edit_group_member(&self, group_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError>;
    async fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<(), GitLabError>;

    // Projects
    async fn get_project(&self, id: i64) -> Result<Project, GitLabError>;
    async fn create_project(&self, options: &ProjectOptions) -> Result<Project, GitLabError>;
    async fn update_project(&self, id: i64, options: &ProjectOptions) -> Result<Project, GitLabError>;
    async fn delete_project(&self, id: i64, options: &DeleteProjectOptions) -> Result<(), GitLabError>;

    // Project members
    async fn get_project_member(&self, project_id: i64, user_id: i64) -> Result<Member, GitLabError>;
    async fn add_project_member(&self, project_id: i64, options: &MemberOptions) -> Result<Member, GitLabError>;
    async fn edit_project_member(&self, project_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError>;
    async fn remove_project_member(&self, project_id: i64, user_id: i64) -> Result<(), GitLabError>;

    // Project access tokens
    async fn get_project_access_token(&self, project_id: i64, id: i64) -> Result<ProjectAccessToken, GitLabError>;
    async fn create_project_access_token(&self, project_id: i64, options: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError>;
    async fn revoke_project_access_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError>;

    // Deploy tokens
    async fn get_project_deploy_token(&self, project_id: i64, id: i64) -> Result<DeployToken, GitLabError>;
    async fn create_project_deploy_token(&self, project_id: i64, options: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError>;
    async fn delete_project_deploy_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError>;

    // Project variables
    async fn get_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError>;
    async fn create_project_variable(&self, project_id: i64, options: &VariableOptions) -> Result<ProjectVariable, GitLabError>;
    async fn update_project_variable(&self, project_id: i64, key: &str, options: &VariableOptions) -> Result<ProjectVariable, GitLabError>;
    async fn remove_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError>;

    // Project hooks
    async fn get_project_hook(&self, project_id: i64, id: i64) -> Result<ProjectHook, GitLabError>;
    async fn add_project_hook(&self, project_id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError>;
    async fn edit_project_hook(&self, project_id: i64, id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError>;
    async fn delete_project_hook(&self, project_id: i64, id: i64) -> Result<(), GitLabError>;

    // Deploy keys
    async fn get_deploy_key(&self, project_id: i64, id: i64) -> Result<DeployKey, GitLabError>;
    async fn add_deploy_key(&self, project_id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError>;
    async fn update_deploy_key(&self, project_id: i64, id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError>;
    async fn delete_deploy_key(&self, project_id: i64, id: i64) -> Result<(), GitLabError>;

    // Pipeline schedules
    async fn get_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<PipelineSchedule, GitLabError>;
    async fn create_pipeline_schedule(&self, project_id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError>;
    async fn edit_pipeline_schedule(&self, project_id: i64, id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError>;
    async fn delete_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<(), GitLabError>;
    async fn create_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError>;
    async fn edit_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError>;
    async fn delete_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError>;

    // Repository files
    async fn get_file(&self, project_id: i64, file_path: &str, git_ref: &str) -> Result<RepositoryFile, GitLabError>;
    async fn create_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError>;
    async fn update_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError>;
    async fn delete_file(&self, project_id: i64, file_path: &str, options: &DeleteFileOptions) -> Result<(), GitLabError>;

    // Runners
    async fn get_runner(&self, id: i64) -> Result<Runner, GitLabError>;
    async fn create_user_runner(&self, options: &CreateRunnerOptions) -> Result<RunnerRegistration, GitLabError>;
    async fn update_runner(&self, id: i64, options: &RunnerOptions) -> Result<Runner, GitLabError>;
    async fn delete_runner(&self, id: i64) -> Result<(), GitLabError>;
}
