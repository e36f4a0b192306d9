//! Project CI/CD variable adapter
//!
//! Variables are keyed by name; the external name is the variable key. When
//! `environmentScope` is set, every call is filtered by it.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, required_id, update_failed};
use crate::error::ControllerError;
use crate::late_init::{any, late_init_bool, late_init_string, matches, matches_str};
use crate::references::ReferenceResolver;
use crds::{ProjectVariable, ProjectVariableObservation, ProjectVariableParameters};
use gitlab_client::{GitLabClientTrait, VariableOptions};
use tracing::info;

/// Reconciles `ProjectVariable` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct VariableAdapter;

fn variable_options(params: &ProjectVariableParameters) -> VariableOptions {
    VariableOptions {
        key: None,
        value: Some(params.value.clone()),
        variable_type: params.variable_type.clone(),
        protected: params.protected,
        masked: params.masked,
        raw: params.raw,
        environment_scope: params.environment_scope.clone(),
        description: params.description.clone(),
    }
}

#[async_trait::async_trait]
impl Adapter for VariableAdapter {
    type Kind = ProjectVariable;
    type Remote = gitlab_client::ProjectVariable;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<ProjectVariable>,
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
        obj: &ProjectVariable,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        Ok(found(
            client
                .get_project_variable(project_id, external_name, params.environment_scope.as_deref())
                .await,
            format!("variable {} of project {}", external_name, project_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> ProjectVariableObservation {
        ProjectVariableObservation {
            key: remote.key.clone(),
            variable_type: remote.variable_type.clone(),
            protected: remote.protected,
            masked: remote.masked,
            raw: remote.raw,
            environment_scope: remote.environment_scope.clone(),
        }
    }

    fn late_initialize(&self, params: &mut ProjectVariableParameters, remote: &Self::Remote) -> bool {
        any(&[
            late_init_string(&mut params.variable_type, remote.variable_type.as_deref()),
            late_init_bool(&mut params.protected, remote.protected),
            late_init_bool(&mut params.masked, remote.masked),
            late_init_bool(&mut params.raw, remote.raw),
            late_init_string(&mut params.environment_scope, remote.environment_scope.as_deref()),
            late_init_string(&mut params.description, remote.description.as_deref()),
        ])
    }

    fn is_up_to_date(&self, params: &ProjectVariableParameters, remote: &Self::Remote) -> bool {
        params.value == remote.value
            && matches_str(&params.variable_type, remote.variable_type.as_deref())
            && matches(&params.protected, &remote.protected)
            && matches(&params.masked, &remote.masked)
            && matches(&params.raw, &remote.raw)
            && matches_str(&params.environment_scope, remote.environment_scope.as_deref())
            && matches_str(&params.description, remote.description.as_deref())
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &ProjectVariable,
    ) -> Result<Creation<ProjectVariableObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let options = VariableOptions {
            key: Some(params.key.clone()),
            ..variable_options(params)
        };
        let variable = client
            .create_project_variable(project_id, &options)
            .await
            .map_err(create_failed(format!("variable {} of project {}", params.key, project_id)))?;
        info!("Created variable {} in GitLab project {}", variable.key, project_id);
        Ok(Creation::new(variable.key.clone()).with_observation(self.observation(&variable)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectVariable,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        client
            .update_project_variable(project_id, external_name, &variable_options(params))
            .await
            .map_err(update_failed(format!("variable {} of project {}", external_name, project_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectVariable,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        deleted(
            client
                .remove_project_variable(project_id, external_name, params.environment_scope.as_deref())
                .await,
            format!("variable {} of project {}", external_name, project_id),
        )?;
        info!("Removed variable {} from GitLab project {}", external_name, project_id);
        Ok(())
    }
}
