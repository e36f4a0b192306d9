//! Group adapter
//!
//! Sub-groups are groups with a parent. Group shares listed in
//! `sharedWithGroups` are converged after the group settings are updated:
//! shares missing remotely or with different access are (re)created, shares
//! no longer listed are removed. A new group is created unshared and picks up
//! its shares from the first update after it is bound.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, update_failed};
use crate::classify::is_not_found;
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::late_init::{any, late_init_bool, late_init_i64, late_init_string, matches, matches_opt, matches_str};
use crate::references::ReferenceResolver;
use crds::{Group, GroupObservation, GroupParameters, GroupShareObservation, SharedWithGroup};
use gitlab_client::{GitLabClientTrait, GroupOptions, GroupShare, ShareGroupOptions};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Reconciles `Group` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupAdapter;

fn group_options(params: &GroupParameters) -> GroupOptions {
    GroupOptions {
        name: Some(params.name.clone()),
        path: Some(params.path.clone()),
        description: params.description.clone(),
        visibility: params.visibility.clone(),
        parent_id: params.parent_id,
        project_creation_level: params.project_creation_level.clone(),
        subgroup_creation_level: params.subgroup_creation_level.clone(),
        request_access_enabled: params.request_access_enabled,
        lfs_enabled: params.lfs_enabled,
        membership_lock: params.membership_lock,
        share_with_group_lock: params.share_with_group_lock,
        require_two_factor_authentication: params.require_two_factor_authentication,
        two_factor_grace_period: params.two_factor_grace_period,
        auto_devops_enabled: params.auto_devops_enabled,
        emails_disabled: params.emails_disabled,
        mentions_disabled: params.mentions_disabled,
        default_branch_protection: params.default_branch_protection,
    }
}

fn observe_group(group: &gitlab_client::Group) -> GroupObservation {
    GroupObservation {
        id: group.id,
        full_name: group.full_name.clone(),
        full_path: group.full_path.clone(),
        web_url: group.web_url.clone(),
        parent_id: group.parent_id,
        created_at: group.created_at,
        shared_with_groups: group
            .shared_with_groups
            .iter()
            .map(|s| GroupShareObservation {
                group_id: s.group_id,
                group_full_path: s.group_full_path.clone(),
                group_access_level: s.group_access_level,
                expires_at: s.expires_at,
            })
            .collect(),
    }
}

fn share_matches(desired: &SharedWithGroup, observed: &GroupShare) -> bool {
    desired.group_access_level == observed.group_access_level
        && matches_opt(&desired.expires_at, &observed.expires_at)
}

/// Desired shares keyed by group ID; entries without a resolved ID are skipped
fn desired_shares(params: &GroupParameters) -> BTreeMap<i64, &SharedWithGroup> {
    params
        .shared_with_groups
        .iter()
        .flatten()
        .filter_map(|s| s.group_id.map(|id| (id, s)))
        .collect()
}

fn shares_up_to_date(params: &GroupParameters, remote: &gitlab_client::Group) -> bool {
    if params.shared_with_groups.is_none() {
        return true;
    }
    let desired = desired_shares(params);
    desired.len() == remote.shared_with_groups.len()
        && remote.shared_with_groups.iter().all(|observed| {
            desired
                .get(&observed.group_id)
                .is_some_and(|d| share_matches(d, observed))
        })
}

#[async_trait::async_trait]
impl Adapter for GroupAdapter {
    type Kind = Group;
    type Remote = gitlab_client::Group;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<Group>,
    ) -> Result<(), ControllerError> {
        resolver
            .group_id(
                "parentId",
                &mut params.parent_id,
                params.parent_id_ref.as_ref(),
                params.parent_id_selector.as_ref(),
            )
            .await?;
        for (i, share) in params.shared_with_groups.iter_mut().flatten().enumerate() {
            resolver
                .group_id(
                    &format!("sharedWithGroups[{}].groupId", i),
                    &mut share.group_id,
                    share.group_id_ref.as_ref(),
                    share.group_id_selector.as_ref(),
                )
                .await?;
        }
        Ok(())
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        _obj: &Group,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let id = parse_id(external_name)?;
        Ok(found(client.get_group(id).await, format!("group {}", id))?
            .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> GroupObservation {
        observe_group(remote)
    }

    fn late_initialize(&self, params: &mut GroupParameters, remote: &Self::Remote) -> bool {
        any(&[
            late_init_string(&mut params.description, remote.description.as_deref()),
            late_init_string(&mut params.visibility, remote.visibility.as_deref()),
            late_init_string(
                &mut params.project_creation_level,
                remote.project_creation_level.as_deref(),
            ),
            late_init_string(
                &mut params.subgroup_creation_level,
                remote.subgroup_creation_level.as_deref(),
            ),
            late_init_bool(&mut params.request_access_enabled, remote.request_access_enabled),
            late_init_bool(&mut params.lfs_enabled, remote.lfs_enabled),
            late_init_bool(&mut params.membership_lock, remote.membership_lock),
            late_init_bool(&mut params.share_with_group_lock, remote.share_with_group_lock),
            late_init_bool(
                &mut params.require_two_factor_authentication,
                remote.require_two_factor_authentication,
            ),
            late_init_i64(&mut params.two_factor_grace_period, remote.two_factor_grace_period),
            late_init_bool(
                &mut params.auto_devops_enabled,
                remote.auto_devops_enabled.unwrap_or(false),
            ),
            late_init_bool(&mut params.emails_disabled, remote.emails_disabled.unwrap_or(false)),
            late_init_bool(
                &mut params.mentions_disabled,
                remote.mentions_disabled.unwrap_or(false),
            ),
            late_init_i64(
                &mut params.default_branch_protection,
                remote.default_branch_protection.unwrap_or(0),
            ),
        ])
    }

    fn is_up_to_date(&self, params: &GroupParameters, remote: &Self::Remote) -> bool {
        params.name == remote.name
            && params.path == remote.path
            && matches_str(&params.description, remote.description.as_deref())
            && matches_str(&params.visibility, remote.visibility.as_deref())
            && matches_opt(&params.parent_id, &remote.parent_id)
            && matches_str(
                &params.project_creation_level,
                remote.project_creation_level.as_deref(),
            )
            && matches_str(
                &params.subgroup_creation_level,
                remote.subgroup_creation_level.as_deref(),
            )
            && matches(&params.request_access_enabled, &remote.request_access_enabled)
            && matches(&params.lfs_enabled, &remote.lfs_enabled)
            && matches(&params.membership_lock, &remote.membership_lock)
            && matches(&params.share_with_group_lock, &remote.share_with_group_lock)
            && matches(
                &params.require_two_factor_authentication,
                &remote.require_two_factor_authentication,
            )
            && matches(&params.two_factor_grace_period, &remote.two_factor_grace_period)
            && matches_opt(&params.auto_devops_enabled, &remote.auto_devops_enabled)
            && matches_opt(&params.emails_disabled, &remote.emails_disabled)
            && matches_opt(&params.mentions_disabled, &remote.mentions_disabled)
            && matches_opt(&params.default_branch_protection, &remote.default_branch_protection)
            && shares_up_to_date(params, remote)
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &Group,
    ) -> Result<Creation<GroupObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let group = client
            .create_group(&group_options(params))
            .await
            .map_err(create_failed(format!("group {}", params.path)))?;
        info!("Created GitLab group {} ({})", group.id, params.path);

        let mut details = ConnectionDetails::new();
        if let Some(token) = group.runners_token.as_deref().filter(|t| !t.is_empty()) {
            details.insert("runnersToken", token);
        }
        Ok(Creation::new(group.id.to_string())
            .with_details(details)
            .with_observation(observe_group(&group)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Group,
        remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        let params = &obj.spec.for_provider;
        client
            .update_group(id, &group_options(params))
            .await
            .map_err(update_failed(format!("group {}", id)))?;

        if params.shared_with_groups.is_none() {
            return Ok(());
        }
        let desired = desired_shares(params);
        for observed in &remote.shared_with_groups {
            let keep = desired
                .get(&observed.group_id)
                .is_some_and(|d| share_matches(d, observed));
            if !keep {
                debug!("Removing share of group {} with {}", id, observed.group_id);
                match client.unshare_group(id, observed.group_id).await {
                    Ok(()) => {}
                    Err(e) if is_not_found(&e) => {}
                    Err(source) => {
                        return Err(ControllerError::UpdateFailed {
                            context: format!("unshare group {} from {}", id, observed.group_id),
                            source,
                        });
                    }
                }
            }
        }
        for (group_id, share) in desired {
            let current = remote
                .shared_with_groups
                .iter()
                .find(|s| s.group_id == group_id);
            if current.is_some_and(|c| share_matches(share, c)) {
                continue;
            }
            client
                .share_group(
                    id,
                    &ShareGroupOptions {
                        group_id,
                        group_access: share.group_access_level,
                        expires_at: share.expires_at,
                    },
                )
                .await
                .map_err(update_failed(format!("share group {} with {}", id, group_id)))?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        _obj: &Group,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        deleted(client.delete_group(id).await, format!("group {}", id))?;
        info!("Deleted GitLab group {}", id);
        Ok(())
    }
}
