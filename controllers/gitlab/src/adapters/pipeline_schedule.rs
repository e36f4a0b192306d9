//! Pipeline schedule adapter
//!
//! Schedule variables are reconciled before the schedule itself: variables
//! only in `forProvider` are created, differing ones edited, and variables only
//! present remotely deleted. The schedule edit is issued last. A new schedule
//! is created without variables; they arrive through that same update.

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id, update_failed,
};
use crate::error::ControllerError;
use crate::late_init::{any, late_init_bool, late_init_string, matches, matches_str};
use crate::references::ReferenceResolver;
use crds::{PipelineSchedule, PipelineScheduleObservation, PipelineScheduleParameters};
use gitlab_client::{GitLabClientTrait, PipelineScheduleOptions, PipelineVariableOptions};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Reconciles `PipelineSchedule` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineScheduleAdapter;

/// Planned variable changes, keyed by variable key
#[derive(Debug, Default)]
struct VariablePlan<'a> {
    create: Vec<&'a crds::PipelineVariable>,
    edit: Vec<&'a crds::PipelineVariable>,
    delete: Vec<&'a str>,
}

impl VariablePlan<'_> {
    fn is_empty(&self) -> bool {
        self.create.is_empty() && self.edit.is_empty() && self.delete.is_empty()
    }
}

fn variable_matches(desired: &crds::PipelineVariable, observed: &gitlab_client::PipelineVariable) -> bool {
    desired.value == observed.value && matches_str(&desired.variable_type, observed.variable_type.as_deref())
}

/// Diff desired against observed variables; unset `variables` means don't care
fn plan_variables<'a>(
    desired: Option<&'a [crds::PipelineVariable]>,
    observed: &'a [gitlab_client::PipelineVariable],
) -> VariablePlan<'a> {
    let Some(desired) = desired else {
        return VariablePlan::default();
    };
    let observed_by_key: BTreeMap<&str, &gitlab_client::PipelineVariable> =
        observed.iter().map(|v| (v.key.as_str(), v)).collect();
    let mut plan = VariablePlan::default();
    for variable in desired {
        match observed_by_key.get(variable.key.as_str()) {
            None => plan.create.push(variable),
            Some(current) if !variable_matches(variable, current) => plan.edit.push(variable),
            Some(_) => {}
        }
    }
    plan.delete = observed
        .iter()
        .map(|v| v.key.as_str())
        .filter(|key| !desired.iter().any(|v| v.key == *key))
        .collect();
    plan
}

fn schedule_options(params: &PipelineScheduleParameters) -> PipelineScheduleOptions {
    PipelineScheduleOptions {
        description: Some(params.description.clone()),
        ref_: Some(params.ref_.clone()),
        cron: Some(params.cron.clone()),
        cron_timezone: params.cron_timezone.clone(),
        active: params.active,
    }
}

fn variable_options(variable: &crds::PipelineVariable, with_key: bool) -> PipelineVariableOptions {
    PipelineVariableOptions {
        key: with_key.then(|| variable.key.clone()),
        value: variable.value.clone(),
        variable_type: variable.variable_type.clone(),
    }
}

fn observe_schedule(schedule: &gitlab_client::PipelineSchedule) -> PipelineScheduleObservation {
    PipelineScheduleObservation {
        id: schedule.id,
        next_run_at: schedule.next_run_at,
        created_at: schedule.created_at,
        updated_at: schedule.updated_at,
        owner: schedule.owner.as_ref().map(|o| o.username.clone()),
    }
}

#[async_trait::async_trait]
impl Adapter for PipelineScheduleAdapter {
    type Kind = PipelineSchedule;
    type Remote = gitlab_client::PipelineSchedule;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<PipelineSchedule>,
    ) -> Result<(), ControllerError> {
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
        obj: &PipelineSchedule,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        Ok(found(
            client.get_pipeline_schedule(project_id, id).await,
            format!("pipeline schedule {} of project {}", id, project_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> PipelineScheduleObservation {
        observe_schedule(remote)
    }

    fn late_initialize(&self, params: &mut PipelineScheduleParameters, remote: &Self::Remote) -> bool {
        any(&[
            late_init_string(&mut params.cron_timezone, remote.cron_timezone.as_deref()),
            late_init_bool(&mut params.active, remote.active),
        ])
    }

    fn is_up_to_date(&self, params: &PipelineScheduleParameters, remote: &Self::Remote) -> bool {
        params.description == remote.description
            && params.ref_ == remote.ref_
            && params.cron == remote.cron
            && matches_str(&params.cron_timezone, remote.cron_timezone.as_deref())
            && matches(&params.active, &remote.active)
            && plan_variables(params.variables.as_deref(), &remote.variables).is_empty()
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &PipelineSchedule,
    ) -> Result<Creation<PipelineScheduleObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let schedule = client
            .create_pipeline_schedule(project_id, &schedule_options(params))
            .await
            .map_err(create_failed(format!(
                "pipeline schedule {} of project {}",
                params.description, project_id
            )))?;
        info!("Created pipeline schedule {} in GitLab project {}", schedule.id, project_id);

        // Variables are added by the update that follows the first observation,
        // once the schedule id is bound.
        Ok(Creation::new(schedule.id.to_string()).with_observation(observe_schedule(&schedule)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &PipelineSchedule,
        remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        let context = |key: &str| format!("variable {} of pipeline schedule {}", key, id);

        let plan = plan_variables(params.variables.as_deref(), &remote.variables);
        debug!(
            "Pipeline schedule {}: {} variables to create, {} to edit, {} to delete",
            id,
            plan.create.len(),
            plan.edit.len(),
            plan.delete.len()
        );
        for variable in plan.create {
            client
                .create_pipeline_schedule_variable(project_id, id, &variable_options(variable, true))
                .await
                .map_err(update_failed(context(&variable.key)))?;
        }
        for variable in plan.edit {
            client
                .edit_pipeline_schedule_variable(project_id, id, &variable.key, &variable_options(variable, false))
                .await
                .map_err(update_failed(context(&variable.key)))?;
        }
        for key in plan.delete {
            client
                .delete_pipeline_schedule_variable(project_id, id, key)
                .await
                .map_err(update_failed(context(key)))?;
        }

        client
            .edit_pipeline_schedule(project_id, id, &schedule_options(params))
            .await
            .map_err(update_failed(format!("pipeline schedule {} of project {}", id, project_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &PipelineSchedule,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        deleted(
            client.delete_pipeline_schedule(project_id, id).await,
            format!("pipeline schedule {} of project {}", id, project_id),
        )?;
        info!("Deleted pipeline schedule {} of GitLab project {}", id, project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_client, pipeline_schedule};

    fn desired(key: &str, value: &str) -> crds::PipelineVariable {
        crds::PipelineVariable {
            key: key.to_string(),
            value: value.to_string(),
            variable_type: None,
        }
    }

    fn observed(key: &str, value: &str) -> gitlab_client::PipelineVariable {
        gitlab_client::PipelineVariable {
            key: key.to_string(),
            value: value.to_string(),
            variable_type: Some("env_var".to_string()),
        }
    }

    fn nightly() -> gitlab_client::PipelineSchedule {
        gitlab_client::PipelineSchedule {
            id: 3,
            description: "nightly".to_string(),
            ref_: "main".to_string(),
            cron: "0 2 * * *".to_string(),
            cron_timezone: Some("UTC".to_string()),
            active: true,
            variables: vec![observed("a", "1"), observed("b", "2")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_variables_reconciled_before_schedule_edit() {
        let client = mock_client();
        client.add_pipeline_schedule(5, nightly());

        let mut obj = pipeline_schedule("nightly", "default");
        obj.spec.for_provider.project_id = Some(5);
        obj.spec.for_provider.variables = Some(vec![desired("a", "1"), desired("c", "3")]);

        let Observed::Exists(remote) = PipelineScheduleAdapter
            .observe(client.as_ref(), "3", &obj)
            .await
            .unwrap()
        else {
            panic!("schedule should exist");
        };
        assert!(!PipelineScheduleAdapter.is_up_to_date(&obj.spec.for_provider, &remote));

        PipelineScheduleAdapter
            .update(client.as_ref(), "3", &obj, &remote)
            .await
            .unwrap();
        assert_eq!(
            client.mutating_calls(),
            vec![
                "create_pipeline_schedule_variable 5/3 c",
                "delete_pipeline_schedule_variable 5/3 b",
                "edit_pipeline_schedule 5/3",
            ]
        );

        let stored = client.pipeline_schedule(5, 3).unwrap();
        let keys: Vec<_> = stored.variables.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_changed_value_is_edited() {
        let desired_vars = [desired("a", "10"), desired("b", "2")];
        let observed_vars = [observed("a", "1"), observed("b", "2")];
        let plan = plan_variables(Some(desired_vars.as_slice()), &observed_vars);
        assert!(plan.create.is_empty());
        assert!(plan.delete.is_empty());
        assert_eq!(plan.edit.len(), 1);
        assert_eq!(plan.edit[0].key, "a");
    }

    #[test]
    fn test_unset_variables_are_ignored() {
        let observed_vars = [observed("a", "1")];
        assert!(plan_variables(None, &observed_vars).is_empty());
        assert_eq!(plan_variables(Some([].as_slice()), &observed_vars).delete, vec!["a"]);
    }

    #[tokio::test]
    async fn test_create_is_a_single_call() {
        let client = mock_client();
        let mut obj = pipeline_schedule("nightly", "default");
        obj.spec.for_provider.project_id = Some(5);
        obj.spec.for_provider.variables = Some(vec![desired("a", "1")]);

        let creation = PipelineScheduleAdapter.create(client.as_ref(), &obj).await.unwrap();
        let id = creation.external_name.parse::<i64>().unwrap();
        assert_eq!(creation.observation.unwrap().owner.as_deref(), Some("root"));
        assert_eq!(client.mutating_calls(), vec!["create_pipeline_schedule 5"]);

        let remote = client.pipeline_schedule(5, id).unwrap();
        assert!(remote.variables.is_empty());
        assert!(!PipelineScheduleAdapter.is_up_to_date(&obj.spec.for_provider, &remote));
    }
}
