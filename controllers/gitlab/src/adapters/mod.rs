//! Per-kind translation between managed objects and the GitLab API.
//!
//! The reconciliation engine is generic over [`Adapter`]; each kind supplies
//! observe/create/update/delete plus its late-initialization and drift rules.
//!
//! - `group.rs` - groups and sub-groups, including group shares
//! - `group_member.rs`, `project_member.rs` - memberships
//! - `project.rs` - projects and the permanent-removal delete
//! - `access_token.rs`, `deploy_token.rs` - non-updatable tokens
//! - `variable.rs`, `hook.rs`, `deploy_key.rs` - project settings
//! - `pipeline_schedule.rs` - schedules and their variables
//! - `file.rs` - repository files
//! - `user_runner.rs` - runners

pub mod access_token;
pub mod deploy_key;
pub mod deploy_token;
pub mod file;
pub mod group;
pub mod group_member;
pub mod hook;
pub mod pipeline_schedule;
pub mod project;
pub mod project_member;
pub mod user_runner;
pub mod variable;

use crate::classify::is_not_found;
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::references::ReferenceResolver;
use crds::ManagedResource;
use gitlab_client::{GitLabClientTrait, GitLabError};

/// Desired parameters of a managed kind
pub type ParamsOf<K> = <K as ManagedResource>::Parameters;

/// Observation type of a managed kind
pub type ObservationOf<K> = <K as ManagedResource>::Observation;

/// Result of looking at the external resource
#[derive(Debug, Clone, PartialEq)]
pub enum Observed<R> {
    /// The external resource exists and is usable
    Exists(R),
    /// The external resource does not exist
    Absent,
    /// The external resource exists but can no longer be used (revoked or expired token)
    Revoked(R),
}

/// Result of a create call
#[derive(Debug, Clone)]
pub struct Creation<O> {
    /// Identifier to bind to the managed object
    pub external_name: String,
    /// Sensitive values to publish
    pub connection_details: ConnectionDetails,
    /// Observation derived from the create response, when it carries one
    pub observation: Option<O>,
}

impl<O> Creation<O> {
    /// Creation binding `external_name`, with no details and no observation
    pub fn new(external_name: impl Into<String>) -> Self {
        Self {
            external_name: external_name.into(),
            connection_details: ConnectionDetails::new(),
            observation: None,
        }
    }

    /// Attach connection details
    #[must_use]
    pub fn with_details(mut self, details: ConnectionDetails) -> Self {
        self.connection_details = details;
        self
    }

    /// Attach an observation
    #[must_use]
    pub fn with_observation(mut self, observation: O) -> Self {
        self.observation = Some(observation);
        self
    }
}

/// Per-kind capability set used by the reconciliation engine
///
/// Every method receiving `obj` gets the effective object: references
/// resolved and [`Adapter::prepare`] applied.
#[async_trait::async_trait]
pub trait Adapter: Send + Sync + 'static {
    type Kind: ManagedResource;
    /// Remote representation returned by observe
    type Remote: Send + Sync;

    /// External name to use when the object carries none (observe-by-name)
    fn default_external_name(&self, _obj: &Self::Kind) -> Option<String> {
        None
    }

    /// Fill reference-bearing fields of `params`
    async fn resolve_references(
        &self,
        _resolver: &mut ReferenceResolver,
        _params: &mut ParamsOf<Self::Kind>,
    ) -> Result<(), ControllerError> {
        Ok(())
    }

    /// Per-tick lookups written into the effective parameters only
    async fn prepare(
        &self,
        _client: &dyn GitLabClientTrait,
        _params: &mut ParamsOf<Self::Kind>,
    ) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Self::Kind,
    ) -> Result<Observed<Self::Remote>, ControllerError>;

    /// Status view of the remote resource
    fn observation(&self, remote: &Self::Remote) -> ObservationOf<Self::Kind>;

    /// Fill unset parameters from the remote resource; `true` when anything changed
    fn late_initialize(&self, _params: &mut ParamsOf<Self::Kind>, _remote: &Self::Remote) -> bool {
        false
    }

    fn is_up_to_date(&self, params: &ParamsOf<Self::Kind>, remote: &Self::Remote) -> bool;

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &Self::Kind,
    ) -> Result<Creation<ObservationOf<Self::Kind>>, ControllerError>;

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Self::Kind,
        remote: &Self::Remote,
    ) -> Result<(), ControllerError>;

    /// Delete the external resource; an absent resource is success
    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Self::Kind,
    ) -> Result<(), ControllerError>;
}

/// Parse an integer external name
pub fn parse_id(external_name: &str) -> Result<i64, ControllerError> {
    external_name
        .trim()
        .parse()
        .map_err(|_| ControllerError::InvalidExternalName(external_name.to_string()))
}

/// A parent ID that must be set (directly or through a reference)
pub fn required_id(value: Option<i64>, field: &'static str) -> Result<i64, ControllerError> {
    value.ok_or(ControllerError::MissingRequiredId(field))
}

/// Map a get result, treating not-found as absence
pub fn found<R>(result: Result<R, GitLabError>, context: String) -> Result<Option<R>, ControllerError> {
    match result {
        Ok(remote) => Ok(Some(remote)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(source) => Err(ControllerError::GetFailed { context, source }),
    }
}

/// Map a delete result, treating not-found as success
pub fn deleted(result: Result<(), GitLabError>, context: String) -> Result<(), ControllerError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if is_not_found(&e) => Ok(()),
        Err(source) => Err(ControllerError::DeleteFailed { context, source }),
    }
}

/// Fill `user_id` from `user_name` when only the name is given.
///
/// The name must match exactly one user.
pub async fn resolve_user(
    client: &dyn GitLabClientTrait,
    user_id: &mut Option<i64>,
    user_name: Option<&str>,
) -> Result<(), ControllerError> {
    if user_id.is_some() {
        return Ok(());
    }
    let Some(username) = user_name.filter(|n| !n.is_empty()) else {
        return Ok(());
    };
    let users = client
        .list_users_by_username(username)
        .await
        .map_err(|source| ControllerError::GetFailed {
            context: format!("users named {}", username),
            source,
        })?;
    match users.as_slice() {
        [user] => {
            *user_id = Some(user.id);
            Ok(())
        }
        _ => Err(ControllerError::AmbiguousUser {
            username: username.to_string(),
            count: users.len(),
        }),
    }
}

/// `map_err` helper wrapping a GitLab error as [`ControllerError::CreateFailed`]
pub fn create_failed(context: impl Into<String>) -> impl FnOnce(GitLabError) -> ControllerError {
    let context = context.into();
    move |source| ControllerError::CreateFailed { context, source }
}

/// `map_err` helper wrapping a GitLab error as [`ControllerError::UpdateFailed`]
pub fn update_failed(context: impl Into<String>) -> impl FnOnce(GitLabError) -> ControllerError {
    let context = context.into();
    move |source| ControllerError::UpdateFailed { context, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(
            parse_id("group/sub"),
            Err(ControllerError::InvalidExternalName(_))
        ));
    }

    #[test]
    fn test_found_maps_not_found_to_none() {
        let missing: Result<i64, GitLabError> = Err(GitLabError::NotFound("404 Group Not Found".to_string()));
        assert_eq!(found(missing, "group 1".to_string()).unwrap(), None);

        let failed: Result<i64, GitLabError> = Err(GitLabError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        let err = found(failed, "group 1".to_string()).unwrap_err();
        assert!(matches!(err, ControllerError::GetFailed { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_deleted_tolerates_absence() {
        assert!(deleted(Err(GitLabError::NotFound("x".to_string())), "group 1".to_string()).is_ok());
        let err = deleted(
            Err(GitLabError::Api {
                status: 403,
                message: "forbidden".to_string(),
            }),
            "group 1".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, ControllerError::DeleteFailed { .. }));
        assert!(!err.is_transient());
    }
}
