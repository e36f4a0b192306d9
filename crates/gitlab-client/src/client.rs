//! GitLab API client
//!
//! Implements `GitLabClientTrait` against the GitLab REST API v4.

use crate::common::{Auth, HttpClient, encode_segment};
use crate::error::GitLabError;
use crate::gitlab_trait::GitLabClientTrait;
use crate::models::*;
use reqwest::Client;
use std::time::Duration;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter selecting a variable by environment scope
const ENVIRONMENT_SCOPE_FILTER: &str = "filter[environment_scope]";

/// GitLab API client
#[derive(Debug)]
pub struct GitLabClient {
    http: HttpClient,
    insecure_skip_verify: bool,
}

impl GitLabClient {
    /// Create a new GitLab client
    ///
    /// # Arguments
    /// * `base_url` - GitLab instance URL (e.g., "https://gitlab.example.com/")
    /// * `auth` - how requests are authenticated
    /// * `insecure_skip_verify` - accept invalid TLS certificates
    pub fn new(base_url: &str, auth: Auth, insecure_skip_verify: bool) -> Result<Self, GitLabError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url, auth),
            insecure_skip_verify,
        })
    }

    /// Whether invalid TLS certificates are accepted
    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    fn scope_filter(environment_scope: Option<&str>) -> Vec<(&'static str, String)> {
        environment_scope
            .map(|scope| vec![(ENVIRONMENT_SCOPE_FILTER, scope.to_string())])
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl GitLabClientTrait for GitLabClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn current_user(&self) -> Result<User, GitLabError> {
        self.http.get("/user").await
    }

    async fn list_users_by_username(&self, username: &str) -> Result<Vec<User>, GitLabError> {
        self.http
            .get_with_query("/users", &[("username", username.to_string())])
            .await
    }

    async fn get_group(&self, id: i64) -> Result<Group, GitLabError> {
        self.http.get(&format!("/groups/{}", id)).await
    }

    async fn create_group(&self, options: &GroupOptions) -> Result<Group, GitLabError> {
        self.http.post("/groups", options).await
    }

    async fn update_group(&self, id: i64, options: &GroupOptions) -> Result<Group, GitLabError> {
        self.http.put(&format!("/groups/{}", id), options).await
    }

    async fn delete_group(&self, id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/groups/{}", id)).await
    }

    async fn share_group(&self, id: i64, options: &ShareGroupOptions) -> Result<Group, GitLabError> {
        self.http.post(&format!("/groups/{}/share", id), options).await
    }

    async fn unshare_group(&self, id: i64, group_id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/groups/{}/share/{}", id, group_id))
            .await
    }

    async fn get_group_member(&self, group_id: i64, user_id: i64) -> Result<Member, GitLabError> {
        self.http
            .get(&format!("/groups/{}/members/{}", group_id, user_id))
            .await
    }

    async fn add_group_member(&self, group_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        self.http
            .post(&format!("/groups/{}/members", group_id), options)
            .await
    }

    async fn edit_group_member(&self, group_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        self.http
            .put(&format!("/groups/{}/members/{}", group_id, user_id), options)
            .await
    }

    async fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/groups/{}/members/{}", group_id, user_id))
            .await
    }

    async fn get_project(&self, id: i64) -> Result<Project, GitLabError> {
        self.http.get(&format!("/projects/{}", id)).await
    }

    async fn create_project(&self, options: &ProjectOptions) -> Result<Project, GitLabError> {
        self.http.post("/projects", options).await
    }

    async fn update_project(&self, id: i64, options: &ProjectOptions) -> Result<Project, GitLabError> {
        self.http.put(&format!("/projects/{}", id), options).await
    }

    async fn delete_project(&self, id: i64, options: &DeleteProjectOptions) -> Result<(), GitLabError> {
        self.http
            .delete_with_query(&format!("/projects/{}", id), &options.query())
            .await
    }

    async fn get_project_member(&self, project_id: i64, user_id: i64) -> Result<Member, GitLabError> {
        self.http
            .get(&format!("/projects/{}/members/{}", project_id, user_id))
            .await
    }

    async fn add_project_member(&self, project_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        self.http
            .post(&format!("/projects/{}/members", project_id), options)
            .await
    }

    async fn edit_project_member(&self, project_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
        self.http
            .put(&format!("/projects/{}/members/{}", project_id, user_id), options)
            .await
    }

    async fn remove_project_member(&self, project_id: i64, user_id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/members/{}", project_id, user_id))
            .await
    }

    async fn get_project_access_token(&self, project_id: i64, id: i64) -> Result<ProjectAccessToken, GitLabError> {
        self.http
            .get(&format!("/projects/{}/access_tokens/{}", project_id, id))
            .await
    }

    async fn create_project_access_token(&self, project_id: i64, options: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError> {
        self.http
            .post(&format!("/projects/{}/access_tokens", project_id), options)
            .await
    }

    async fn revoke_project_access_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/access_tokens/{}", project_id, id))
            .await
    }

    async fn get_project_deploy_token(&self, project_id: i64, id: i64) -> Result<DeployToken, GitLabError> {
        self.http
            .get(&format!("/projects/{}/deploy_tokens/{}", project_id, id))
            .await
    }

    async fn create_project_deploy_token(&self, project_id: i64, options: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError> {
        self.http
            .post(&format!("/projects/{}/deploy_tokens", project_id), options)
            .await
    }

    async fn delete_project_deploy_token(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/deploy_tokens/{}", project_id, id))
            .await
    }

    async fn get_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError> {
        self.http
            .get_with_query(
                &format!("/projects/{}/variables/{}", project_id, encode_segment(key)),
                &Self::scope_filter(environment_scope),
            )
            .await
    }

    async fn create_project_variable(&self, project_id: i64, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
        self.http
            .post(&format!("/projects/{}/variables", project_id), options)
            .await
    }

    async fn update_project_variable(&self, project_id: i64, key: &str, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
        self.http
            .put_with_query(
                &format!("/projects/{}/variables/{}", project_id, encode_segment(key)),
                &Self::scope_filter(options.environment_scope.as_deref()),
                options,
            )
            .await
    }

    async fn remove_project_variable(&self, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError> {
        self.http
            .delete_with_query(
                &format!("/projects/{}/variables/{}", project_id, encode_segment(key)),
                &Self::scope_filter(environment_scope),
            )
            .await
    }

    async fn get_project_hook(&self, project_id: i64, id: i64) -> Result<ProjectHook, GitLabError> {
        self.http
            .get(&format!("/projects/{}/hooks/{}", project_id, id))
            .await
    }

    async fn add_project_hook(&self, project_id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
        self.http
            .post(&format!("/projects/{}/hooks", project_id), options)
            .await
    }

    async fn edit_project_hook(&self, project_id: i64, id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
        self.http
            .put(&format!("/projects/{}/hooks/{}", project_id, id), options)
            .await
    }

    async fn delete_project_hook(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/hooks/{}", project_id, id))
            .await
    }

    async fn get_deploy_key(&self, project_id: i64, id: i64) -> Result<DeployKey, GitLabError> {
        self.http
            .get(&format!("/projects/{}/deploy_keys/{}", project_id, id))
            .await
    }

    async fn add_deploy_key(&self, project_id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
        self.http
            .post(&format!("/projects/{}/deploy_keys", project_id), options)
            .await
    }

    async fn update_deploy_key(&self, project_id: i64, id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
        self.http
            .put(&format!("/projects/{}/deploy_keys/{}", project_id, id), options)
            .await
    }

    async fn delete_deploy_key(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/deploy_keys/{}", project_id, id))
            .await
    }

    async fn get_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<PipelineSchedule, GitLabError> {
        self.http
            .get(&format!("/projects/{}/pipeline_schedules/{}", project_id, id))
            .await
    }

    async fn create_pipeline_schedule(&self, project_id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.http
            .post(&format!("/projects/{}/pipeline_schedules", project_id), options)
            .await
    }

    async fn edit_pipeline_schedule(&self, project_id: i64, id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.http
            .put(&format!("/projects/{}/pipeline_schedules/{}", project_id, id), options)
            .await
    }

    async fn delete_pipeline_schedule(&self, project_id: i64, id: i64) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{}/pipeline_schedules/{}", project_id, id))
            .await
    }

    async fn create_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.http
            .post(
                &format!("/projects/{}/pipeline_schedules/{}/variables", project_id, schedule_id),
                options,
            )
            .await
    }

    async fn edit_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.http
            .put(
                &format!(
                    "/projects/{}/pipeline_schedules/{}/variables/{}",
                    project_id,
                    schedule_id,
                    encode_segment(key)
                ),
                options,
            )
            .await
    }

    async fn delete_pipeline_schedule_variable(&self, project_id: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError> {
        self.http
            .delete(&format!(
                "/projects/{}/pipeline_schedules/{}/variables/{}",
                project_id,
                schedule_id,
                encode_segment(key)
            ))
            .await
    }

    async fn get_file(&self, project_id: i64, file_path: &str, git_ref: &str) -> Result<RepositoryFile, GitLabError> {
        self.http
            .get_with_query(
                &format!("/projects/{}/repository/files/{}", project_id, encode_segment(file_path)),
                &[("ref", git_ref.to_string())],
            )
            .await
    }

    async fn create_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
        self.http
            .post(
                &format!("/projects/{}/repository/files/{}", project_id, encode_segment(file_path)),
                options,
            )
            .await
    }

    async fn update_file(&self, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
        self.http
            .put(
                &format!("/projects/{}/repository/files/{}", project_id, encode_segment(file_path)),
                options,
            )
            .await
    }

    async fn delete_file(&self, project_id: i64, file_path: &str, options: &DeleteFileOptions) -> Result<(), GitLabError> {
        self.http
            .delete_with_body(
                &format!("/projects/{}/repository/files/{}", project_id, encode_segment(file_path)),
                options,
            )
            .await
    }

    async fn get_runner(&self, id: i64) -> Result<Runner, GitLabError> {
        self.http.get(&format!("/runners/{}", id)).await
    }

    async fn create_user_runner(&self, options: &CreateRunnerOptions) -> Result<RunnerRegistration, GitLabError> {
        self.http.post("/user/runners", options).await
    }

    async fn update_runner(&self, id: i64, options: &RunnerOptions) -> Result<Runner, GitLabError> {
        self.http.put(&format!("/runners/{}", id), options).await
    }

    async fn delete_runner(&self, id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/runners/{}", id)).await
    }
}
