//! Runner adapter
//!
//! Runners are created through the user-runner endpoint, which returns the
//! authentication token exactly once. It is published as `token`.

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, update_failed,
};
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::late_init::{any, late_init_bool, late_init_list, late_init_string, matches, matches_list, matches_opt, matches_str};
use crate::references::ReferenceResolver;
use crds::{UserRunner, UserRunnerObservation, UserRunnerParameters};
use gitlab_client::{CreateRunnerOptions, GitLabClientTrait, Runner, RunnerOptions};
use tracing::info;

/// Reconciles `UserRunner` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct UserRunnerAdapter;

fn runner_options(params: &UserRunnerParameters) -> RunnerOptions {
    RunnerOptions {
        description: params.description.clone(),
        paused: params.paused,
        locked: params.locked,
        run_untagged: params.run_untagged,
        tag_list: params.tag_list.clone(),
        access_level: params.access_level.clone(),
        maximum_timeout: params.maximum_timeout,
        maintenance_note: params.maintenance_note.clone(),
    }
}

fn observe_runner(runner: &Runner) -> UserRunnerObservation {
    UserRunnerObservation {
        id: runner.id,
        status: runner.status.clone(),
        online: runner.online.unwrap_or(false),
        is_shared: runner.is_shared,
        ip_address: runner.ip_address.clone(),
        token_expires_at: None,
    }
}

#[async_trait::async_trait]
impl Adapter for UserRunnerAdapter {
    type Kind = UserRunner;
    type Remote = Runner;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<UserRunner>,
    ) -> Result<(), ControllerError> {
        resolver
            .group_id(
                "groupId",
                &mut params.group_id,
                params.group_id_ref.as_ref(),
                params.group_id_selector.as_ref(),
            )
            .await?;
        resolver
            .project_id(
                "projectId",
                &mut params.project_id,
                params.project_id_ref.as_ref(),
                params.project_id_selector.as_ref(),
            )
            .await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        _obj: &UserRunner,
    ) -> Result<Observed<Runner>, ControllerError> {
        let id = parse_id(external_name)?;
        Ok(found(client.get_runner(id).await, format!("runner {}", id))?
            .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Runner) -> UserRunnerObservation {
        observe_runner(remote)
    }

    fn late_initialize(&self, params: &mut UserRunnerParameters, remote: &Runner) -> bool {
        any(&[
            late_init_string(&mut params.description, remote.description.as_deref()),
            late_init_bool(&mut params.paused, remote.paused),
            late_init_bool(&mut params.locked, remote.locked),
            late_init_bool(&mut params.run_untagged, remote.run_untagged),
            late_init_list(&mut params.tag_list, &remote.tag_list),
            late_init_string(&mut params.access_level, remote.access_level.as_deref()),
        ])
    }

    fn is_up_to_date(&self, params: &UserRunnerParameters, remote: &Runner) -> bool {
        matches_str(&params.description, remote.description.as_deref())
            && matches(&params.paused, &remote.paused)
            && matches(&params.locked, &remote.locked)
            && matches(&params.run_untagged, &remote.run_untagged)
            && matches_list(&params.tag_list, &remote.tag_list)
            && matches_str(&params.access_level, remote.access_level.as_deref())
            && matches_opt(&params.maximum_timeout, &remote.maximum_timeout)
            && matches_str(&params.maintenance_note, remote.maintenance_note.as_deref())
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &UserRunner,
    ) -> Result<Creation<UserRunnerObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let registration = client
            .create_user_runner(&CreateRunnerOptions {
                runner_type: params.runner_type.clone(),
                group_id: params.group_id,
                project_id: params.project_id,
                settings: runner_options(params),
            })
            .await
            .map_err(create_failed(format!("{} runner", params.runner_type)))?;
        info!("Registered {} runner {}", params.runner_type, registration.id);

        let observation = UserRunnerObservation {
            id: registration.id,
            token_expires_at: registration.token_expires_at,
            ..Default::default()
        };
        Ok(Creation::new(registration.id.to_string())
            .with_details(ConnectionDetails::new().with("token", registration.token.as_str()))
            .with_observation(observation))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &UserRunner,
        _remote: &Runner,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        client
            .update_runner(id, &runner_options(&obj.spec.for_provider))
            .await
            .map_err(update_failed(format!("runner {}", id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        _obj: &UserRunner,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        deleted(client.delete_runner(id).await, format!("runner {}", id))?;
        info!("Deleted runner {}", id);
        Ok(())
    }
}
