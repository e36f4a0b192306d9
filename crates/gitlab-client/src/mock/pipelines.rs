//! Pipeline schedules and schedule variables for MockGitLabClient

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;
use chrono::Utc;

pub async fn get_pipeline_schedule(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<PipelineSchedule, GitLabError> {
    client.record("get_pipeline_schedule", format!("{}/{}", project_id, id))?;
    client
        .schedules
        .lock()
        .unwrap()
        .get(&(project_id, id))
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Pipeline Schedule", id))
}

pub async fn create_pipeline_schedule(client: &MockGitLabClient, project_id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
    client.record("create_pipeline_schedule", project_id)?;
    let id = client.next_id();
    let now = Utc::now();
    let mut schedule = PipelineSchedule {
        id,
        cron_timezone: Some("UTC".to_string()),
        active: true,
        created_at: Some(now),
        updated_at: Some(now),
        owner: Some(User {
            id: 1,
            username: "root".to_string(),
            name: "Administrator".to_string(),
            state: Some("active".to_string()),
        }),
        ..Default::default()
    };
    apply_schedule_options(&mut schedule, options);
    client
        .schedules
        .lock()
        .unwrap()
        .insert((project_id, id), schedule.clone());
    Ok(schedule)
}

pub async fn edit_pipeline_schedule(client: &MockGitLabClient, project_id: i64, id: i64, options: &PipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
    client.record("edit_pipeline_schedule", format!("{}/{}", project_id, id))?;
    let mut schedules = client.schedules.lock().unwrap();
    let schedule = schedules
        .get_mut(&(project_id, id))
        .ok_or_else(|| MockGitLabClient::not_found("Pipeline Schedule", id))?;
    apply_schedule_options(schedule, options);
    schedule.updated_at = Some(Utc::now());
    Ok(schedule.clone())
}

fn apply_schedule_options(schedule: &mut PipelineSchedule, options: &PipelineScheduleOptions) {
    if let Some(v) = &options.description {
        schedule.description = v.clone();
    }
    if let Some(v) = &options.ref_ {
        schedule.ref_ = v.clone();
    }
    if let Some(v) = &options.cron {
        schedule.cron = v.clone();
    }
    if let Some(v) = &options.cron_timezone {
        schedule.cron_timezone = Some(v.clone());
    }
    if let Some(v) = options.active {
        schedule.active = v;
    }
}

pub async fn delete_pipeline_schedule(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<(), GitLabError> {
    client.record("delete_pipeline_schedule", format!("{}/{}", project_id, id))?;
    client
        .schedules
        .lock()
        .unwrap()
        .remove(&(project_id, id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Pipeline Schedule", id))
}

pub async fn create_pipeline_schedule_variable(client: &MockGitLabClient, project_id: i64, schedule_id: i64, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
    let key = options.key.clone().unwrap_or_default();
    client.record(
        "create_pipeline_schedule_variable",
        format!("{}/{} {}", project_id, schedule_id, key),
    )?;
    let mut schedules = client.schedules.lock().unwrap();
    let schedule = schedules
        .get_mut(&(project_id, schedule_id))
        .ok_or_else(|| MockGitLabClient::not_found("Pipeline Schedule", schedule_id))?;
    if schedule.variables.iter().any(|v| v.key == key) {
        return Err(GitLabError::Api {
            status: 400,
            message: format!("{} has already been taken", key),
        });
    }
    let variable = PipelineVariable {
        key,
        value: options.value.clone(),
        variable_type: Some(
            options
                .variable_type
                .clone()
                .unwrap_or_else(|| "env_var".to_string()),
        ),
    };
    schedule.variables.push(variable.clone());
    Ok(variable)
}

pub async fn edit_pipeline_schedule_variable(client: &MockGitLabClient, project_id: i64, schedule_id: i64, key: &str, options: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
    client.record(
        "edit_pipeline_schedule_variable",
        format!("{}/{} {}", project_id, schedule_id, key),
    )?;
    let mut schedules = client.schedules.lock().unwrap();
    let variable = schedules
        .get_mut(&(project_id, schedule_id))
        .and_then(|s| s.variables.iter_mut().find(|v| v.key == key))
        .ok_or_else(|| MockGitLabClient::not_found("Variable", key))?;
    variable.value = options.value.clone();
    if let Some(t) = &options.variable_type {
        variable.variable_type = Some(t.clone());
    }
    Ok(variable.clone())
}

pub async fn delete_pipeline_schedule_variable(client: &MockGitLabClient, project_id: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError> {
    client.record(
        "delete_pipeline_schedule_variable",
        format!("{}/{} {}", project_id, schedule_id, key),
    )?;
    let mut schedules = client.schedules.lock().unwrap();
    let schedule = schedules
        .get_mut(&(project_id, schedule_id))
        .ok_or_else(|| MockGitLabClient::not_found("Pipeline Schedule", schedule_id))?;
    let before = schedule.variables.len();
    schedule.variables.retain(|v| v.key != key);
    if schedule.variables.len() == before {
        return Err(MockGitLabClient::not_found("Variable", key));
    }
    Ok(())
}
