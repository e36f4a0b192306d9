//! Mock GitLabClient for unit testing
//!
//! This module provides an in-memory implementation of `GitLabClientTrait`
//! that can be used in unit tests without a running GitLab instance.
//!
//! Every trait call is appended to an ordered call log (`"<operation> <detail>"`)
//! so tests can assert exactly which remote calls were issued. Failures can be
//! injected per operation with `fail_once` and `fail_always`.
//!
//! The mock is organized into domain-specific modules:
//! - `groups.rs` - users, groups, group shares and group members
//! - `projects.rs` - projects and project members
//! - `tokens.rs` - project access tokens and deploy tokens
//! - `settings.rs` - project variables, hooks and deploy keys
//! - `pipelines.rs` - pipeline schedules and their variables
//! - `files.rs` - repository files
//! - `runners.rs` - runners

mod files;
mod groups;
mod pipelines;
mod projects;
mod runners;
mod settings;
mod tokens;

use crate::error::GitLabError;
use crate::gitlab_trait::GitLabClientTrait;
use crate::models::*;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock GitLabClient for testing
///
/// Clones share the same in-memory state.
#[derive(Clone, Default)]
pub struct MockGitLabClient {
    pub(crate) base_url: String,
    pub(crate) users: Arc<Mutex<HashMap<i64, User>>>,
    pub(crate) groups: Arc<Mutex<HashMap<i64, Group>>>,
    pub(crate) group_members: Arc<Mutex<HashMap<(i64, i64), Member>>>,
    pub(crate) projects: Arc<Mutex<HashMap<i64, Project>>>,
    pub(crate) project_members: Arc<Mutex<HashMap<(i64, i64), Member>>>,
    pub(crate) access_tokens: Arc<Mutex<HashMap<(i64, i64), ProjectAccessToken>>>,
    pub(crate) deploy_tokens: Arc<Mutex<HashMap<(i64, i64), DeployToken>>>,
    /// Keyed by (project, key, environment scope)
    pub(crate) variables: Arc<Mutex<HashMap<(i64, String, String), ProjectVariable>>>,
    pub(crate) hooks: Arc<Mutex<HashMap<(i64, i64), ProjectHook>>>,
    pub(crate) deploy_keys: Arc<Mutex<HashMap<(i64, i64), DeployKey>>>,
    pub(crate) schedules: Arc<Mutex<HashMap<(i64, i64), PipelineSchedule>>>,
    /// Keyed by (project, branch, path); content stored as plain text
    pub(crate) files: Arc<Mutex<HashMap<(i64, String, String), RepositoryFile>>>,
    pub(crate) runners: Arc<Mutex<HashMap<i64, Runner>>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    pub(crate) failures_once: Arc<Mutex<HashMap<String, VecDeque<u16>>>>,
    pub(crate) failures_always: Arc<Mutex<HashMap<String, u16>>>,
    pub(crate) next_id: Arc<Mutex<i64>>,
}

impl std::fmt::Debug for MockGitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGitLabClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MockGitLabClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            next_id: Arc::new(Mutex::new(1)),
            ..Default::default()
        }
    }

    /// Add a user to the mock store (for test setup)
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    /// Add a group to the mock store (for test setup)
    pub fn add_group(&self, group: Group) {
        self.bump_next_id(group.id);
        self.groups.lock().unwrap().insert(group.id, group);
    }

    /// Add a project to the mock store (for test setup)
    pub fn add_project(&self, project: Project) {
        self.bump_next_id(project.id);
        self.projects.lock().unwrap().insert(project.id, project);
    }

    /// Add a project access token (for test setup)
    pub fn add_project_access_token(&self, project_id: i64, token: ProjectAccessToken) {
        self.bump_next_id(token.id);
        self.access_tokens
            .lock()
            .unwrap()
            .insert((project_id, token.id), token);
    }

    /// Add a deploy token (for test setup)
    pub fn add_deploy_token(&self, project_id: i64, token: DeployToken) {
        self.bump_next_id(token.id);
        self.deploy_tokens
            .lock()
            .unwrap()
            .insert((project_id, token.id), token);
    }

    /// Add a pipeline schedule, including its variables (for test setup)
    pub fn add_pipeline_schedule(&self, project_id: i64, schedule: PipelineSchedule) {
        self.bump_next_id(schedule.id);
        self.schedules
            .lock()
            .unwrap()
            .insert((project_id, schedule.id), schedule);
    }

    /// Add a repository file with plain-text content (for test setup)
    pub fn add_file(&self, project_id: i64, branch: &str, file: RepositoryFile) {
        self.files.lock().unwrap().insert(
            (project_id, branch.to_string(), file.file_path.clone()),
            file,
        );
    }

    /// Add a runner (for test setup)
    pub fn add_runner(&self, runner: Runner) {
        self.bump_next_id(runner.id);
        self.runners.lock().unwrap().insert(runner.id, runner);
    }

    /// Get a stored group (for assertions)
    pub fn group(&self, id: i64) -> Option<Group> {
        self.groups.lock().unwrap().get(&id).cloned()
    }

    /// Get a stored project (for assertions)
    pub fn project(&self, id: i64) -> Option<Project> {
        self.projects.lock().unwrap().get(&id).cloned()
    }

    /// Get a stored pipeline schedule (for assertions)
    pub fn pipeline_schedule(&self, project_id: i64, id: i64) -> Option<PipelineSchedule> {
        self.schedules.lock().unwrap().get(&(project_id, id)).cloned()
    }

    /// Get a stored project variable (for assertions)
    pub fn project_variable(&self, project_id: i64, key: &str, scope: &str) -> Option<ProjectVariable> {
        self.variables
            .lock()
            .unwrap()
            .get(&(project_id, key.to_string(), scope.to_string()))
            .cloned()
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls to one operation, in order
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{} ", operation);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == operation || c.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Calls that mutate remote state (everything except reads)
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.starts_with("get_") && !c.starts_with("list_") && !c.starts_with("current_user"))
            .cloned()
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make the next call to `operation` fail with `status`
    pub fn fail_once(&self, operation: &str, status: u16) {
        self.failures_once
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(status);
    }

    /// Make every call to `operation` fail with `status`
    pub fn fail_always(&self, operation: &str, status: u16) {
        self.failures_always
            .lock()
            .unwrap()
            .insert(operation.to_string(), status);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures_once.lock().unwrap().clear();
        self.failures_always.lock().unwrap().clear();
    }

    /// Record a call and return any injected failure for it
    pub(crate) fn record(&self, operation: &str, detail: impl std::fmt::Display) -> Result<(), GitLabError> {
        let detail = detail.to_string();
        let entry = if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, detail)
        };
        self.calls.lock().unwrap().push(entry);

        let injected = self
            .failures_once
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.failures_always.lock().unwrap().get(operation).copied());

        match injected {
            Some(404) => Err(GitLabError::NotFound(format!("{} {}: injected", operation, detail))),
            Some(status) => Err(GitLabError::Api {
                status,
                message: format!("{} {}: injected failure", operation, detail),
            }),
            None => Ok(()),
        }
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    fn bump_next_id(&self, used: i64) {
        let mut id = self.next_id.lock().unwrap();
        if *id <= used {
            *id = used + 1;
        }
    }

    pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> GitLabError {
        GitLabError::NotFound(format!("404 {} {} Not Found", what, id))
    }
}

#[async_trait::async_trait]
impl GitLabClientTrait for MockGitLabClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn current_user(&self) -> Result<User, GitLabError> {
        groups::current_user(self).await
    }

    async fn list_users_by_username(&self, username: &str) -> Result<Vec<User>, GitLabError> {
        groups::list_users_by_username(self, username).await
    }

    async fn get_group(&self, id: i64) -> Result<Group, GitLabError> {
        groups::get_group(self, id).await
    }

    async fn create_group(&self, options: &GroupOptions) -> Result<Group, GitLabError> {
        groups::create_group(self, options).await
    }

    async fn update_group(&self, id: i64, options: &GroupOptions) -> Result<Group, GitLabError> {
        groups::update_group(self, id, options).await
    }

    async fn delete_group(&self, id: i64) -> Result<(), GitLabError> {
        groups::delete_group(self, id).await
    }

    async fn share_group(&self, id: i64, options: &ShareGroupOptions) -> Result<Group, GitLabError> {
        groups::share_group(self, id, options).await
    }

    async fn unshare_group(&self, id: i64, group_id: i64) -> Result<(), GitLabError> {
        groups::unshare_group(self, id, group_id).await
    }

    async fn get_group_member(&self, group_id: i64, user_id: i64) -> Result<Member, GitLabError> {
        groups::get_group_member(self, group_id, user_id).await
    }

    async fn add_group_member(&self, group_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        groups::add_group_member(self, group_id, options).await
    }

    async fn edit_group_member(&self, group_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        groups::edit_group_member(self, group_id, user_id, options).await
    }

    async fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<(), GitLabError> {
        groups::remove_group_member(self, group_id, user_id).await
    }

    async fn get_project(&self, id: i64) -> Result<Project, GitLabError> {
        projects::get_project(self, id).await
    }

    async fn create_project(&self, options: &ProjectOptions) -> Result<Project, GitLabError> {
        projects::create_project(self, options).await
    }

    async fn update_project(&self, id: i64, options: &ProjectOptions) -> Result<Project, GitLabError> {
        projects::update_project(self, id, options).await
    }

    async fn delete_project(&self, id: i64, options: &DeleteProjectOptions) -> Result<(), GitLabError> {
        projects::delete_project(self, id, options).await
    }

    async fn get_project_member(&self, project_id: i64, user_id: i64) -> Result<Member, GitLabError> {
        projects::get_project_member(self, project_id, user_id).await
    }

    async fn add_project_member(&self, project_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        projects::add_project_member(self, project_id, options).await
    }

    async fn edit_project_member(&self, project_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        projects::edit_project_member(self, project_id, user_id, options).await
    }

    async fn remove_project_member(&self, project_id: i64, user_id: i64) -> Result<(), GitLabError> {
        projects::remove_project_member(self, project_id, user_id).await
    }

    async fn get_project_access_token(&self, project_id: i64, id: i64) -> Result<ProjectAccessToken, GitLabError> {
        tokens::get_project_access_token(self, project_id, id).await
    }

    async fn create_project_access_token(&self, project_id: i64, options: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError> {
        tokens::create_project_access_token(self, project_id, options).await
    }

    async fn revoke_project_access_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        tokens::revoke_project_access_token(self, project_id, id).await
    }

    async fn get_project_deploy_token(&self, project_id: i64, id: i64) -> Result<DeployToken, GitLabError> {
        tokens::get_project_deploy_token(self, project_id, id).await
    }

    async fn create_project_deploy_token(&self, project_id: i64, options: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError> {
        tokens::create_project_deploy_token(self, project_id, options).await
    }

    async fn delete_project_deploy_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        tokens::delete_project_deploy_token(self, project_id, id).await
    }

    async fn get_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError> {
        settings::get_project_variable(self, project_id, key, environment_scope).await
    }

    async fn create_project_variable(&self, project_id: i64, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
        settings::create_project_variable(self, project_id, options).await
    }

    async fn update_project_variable(&self, project_id: i64, key: &str, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
        settings::update_project_variable(self, project_id, key, options).await
    }

    async fn remove_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError> {
        settings::remove_project_variable(self, project_id, key, environment_scope).await
    }

    async fn get_project_hook(&self, project_id: i64, id: i64) -> Result<ProjectHook, GitLabError> {
        settings::get_project_hook(self, project_id, id).await
    }

    async fn add_project_hook(&self, project_id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
        settings::add_project_hook(self, project_id, options).await
    }

    async fn edit_project_hook(&self, project_id: i64, id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
        settings::edit_project_hook(self, project_id, id, options).await
    }

    async fn delete_project_hook(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        settings::delete_project_hook(self, project_id, id).await
    }

    async fn get_deploy_key(&self, project_id: i64, id: i64) -> Result<DeployKey, GitLabError> {
        settings::get_deploy_key(self, project_id, id).await
    }

    async fn add_deploy_key(&self, project_id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
        settings::add_deploy_key(self, project_id, options).await
    }

    async fn update_deploy_key(&self, project_id: i64, id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
        settings::update_deploy_key(self, project_id, id, options).await
    }

    async fn delete_deploy_key(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        settings::delete_deploy_key(self, project_id, id).await
    }

    async fn get_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<PipelineSchedule, GitLabError> {
        pipelines::get_pipeline_schedule(self, project_id, id).await
    }

    async fn create_pipeline_schedule(&self, project_id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        pipelines::create_pipeline_schedule(self, project_id, options).await
    }

    async fn edit_pipeline_schedule(&self, project_id: i64, id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        pipelines::edit_pipeline_schedule(self, project_id, id, options).await
    }

    async fn delete_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        pipelines::delete_pipeline_schedule(self, project_id, id).await
    }

    async fn create_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        pipelines::create_pipeline_schedule_variable(self, project_id, schedule_id, options).await
    }

    async fn edit_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        pipelines::edit_pipeline_schedule_variable(self, project_id, schedule_id, key, options).await
    }

    async fn delete_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError> {
        pipelines::delete_pipeline_schedule_variable(self, project_id, schedule_id, key).await
    }

    async fn get_file(&self, project_id: i64, file_path: &str, git_ref: &str) -> Result<RepositoryFile, GitLabError> {
        files::get_file(self, project_id, file_path, git_ref).await
    }

    async fn create_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
        files::create_file(self, project_id, file_path, options).await
    }

    async fn update_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
        files::update_file(self, project_id, file_path, options).await
    }

    async fn delete_file(&self, project_id: i64, file_path: &str, options: &DeleteFileOptions) -> Result<(), GitLabError> {
        files::delete_file(self, project_id, file_path, options).await
    }

    async fn get_runner(&self, id: i64) -> Result<Runner, GitLabError> {
        runners::get_runner(self, id).await
    }

    async fn create_user_runner(&self, options: &CreateRunnerOptions) -> Result<RunnerRegistration, GitLabError> {
        runners::create_user_runner(self, options).await
    }

    async fn update_runner(&self, id: i64, options: &RunnerOptions) -> Result<Runner, GitLabError> {
        runners::update_runner(self, id, options).await
    }

    async fn delete_runner(&self, id: i64) -> Result<(), GitLabError> {
        runners::delete_runner(self, id).await
    }
}
