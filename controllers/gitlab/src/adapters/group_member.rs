//! Group membership adapter
//!
//! The external name is the member's user ID. A `userName` is resolved in
//! [`Adapter::prepare`], so the resolved ID only lives in the effective
//! parameters of one tick.

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id, resolve_user,
    update_failed,
};
use crate::error::ControllerError;
use crate::references::ReferenceResolver;
use crds::{GroupMember, GroupMemberObservation, GroupMemberParameters};
use gitlab_client::{GitLabClientTrait, Member, MemberOptions};
use tracing::info;

/// Reconciles `GroupMember` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupMemberAdapter;

fn observe_member(member: &Member) -> GroupMemberObservation {
    GroupMemberObservation {
        user_id: member.id,
        username: Some(member.username.clone()).filter(|u| !u.is_empty()),
        name: Some(member.name.clone()).filter(|n| !n.is_empty()),
        state: member.state.clone(),
        web_url: member.web_url.clone(),
        access_level: member.access_level,
        expires_at: member.expires_at,
        created_at: member.created_at,
    }
}

#[async_trait::async_trait]
impl Adapter for GroupMemberAdapter {
    type Kind = GroupMember;
    type Remote = Member;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<GroupMember>,
    ) -> Result<(), ControllerError> {
        resolver
            .group_id(
                "groupId",
                &mut params.group_id,
                params.group_id_ref.as_ref(),
                params.group_id_selector.as_ref(),
            )
            .await
    }

    async fn prepare(
        &self,
        client: &dyn GitLabClientTrait,
        params: &mut GroupMemberParameters,
    ) -> Result<(), ControllerError> {
        resolve_user(client, &mut params.user_id, params.user_name.as_deref()).await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &GroupMember,
    ) -> Result<Observed<Member>, ControllerError> {
        let group_id = required_id(obj.spec.for_provider.group_id, "groupId")?;
        let user_id = parse_id(external_name)?;
        Ok(found(
            client.get_group_member(group_id, user_id).await,
            format!("member {} of group {}", user_id, group_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Member) -> GroupMemberObservation {
        observe_member(remote)
    }

    fn is_up_to_date(&self, params: &GroupMemberParameters, remote: &Member) -> bool {
        params.access_level == remote.access_level
            && params.expires_at == remote.expires_at
            && (params.member_role_id.is_none()
                || params.member_role_id == remote.member_role.as_ref().map(|r| r.id))
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &GroupMember,
    ) -> Result<Creation<GroupMemberObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let group_id = required_id(params.group_id, "groupId")?;
        let user_id = required_id(params.user_id, "userId")?;
        let member = client
            .add_group_member(
                group_id,
                &MemberOptions {
                    user_id: Some(user_id),
                    access_level: Some(params.access_level),
                    expires_at: params.expires_at,
                    member_role_id: params.member_role_id,
                },
            )
            .await
            .map_err(create_failed(format!("member {} of group {}", user_id, group_id)))?;
        info!(
            "Added user {} to GitLab group {} with access level {}",
            member.id, group_id, member.access_level
        );
        Ok(Creation::new(member.id.to_string()).with_observation(observe_member(&member)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &GroupMember,
        _remote: &Member,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let group_id = required_id(params.group_id, "groupId")?;
        let user_id = parse_id(external_name)?;
        client
            .edit_group_member(
                group_id,
                user_id,
                &MemberOptions {
                    access_level: Some(params.access_level),
                    expires_at: params.expires_at,
                    member_role_id: params.member_role_id,
                    ..Default::default()
                },
            )
            .await
            .map_err(update_failed(format!("member {} of group {}", user_id, group_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &GroupMember,
    ) -> Result<(), ControllerError> {
        let group_id = required_id(obj.spec.for_provider.group_id, "groupId")?;
        let user_id = parse_id(external_name)?;
        deleted(
            client.remove_group_member(group_id, user_id).await,
            format!("member {} of group {}", user_id, group_id),
        )?;
        info!("Removed user {} from GitLab group {}", user_id, group_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{group_member, mock_client};
    use gitlab_client::User;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            name: username.to_string(),
            state: Some("active".to_string()),
        }
    }

    #[tokio::test]
    async fn test_user_name_resolves_to_single_user() {
        let client = mock_client();
        client.add_user(user(12, "alice"));

        let mut params = group_member("alice-dev", "default").spec.for_provider;
        params.user_name = Some("alice".to_string());
        GroupMemberAdapter.prepare(client.as_ref(), &mut params).await.unwrap();
        assert_eq!(params.user_id, Some(12));
    }

    #[tokio::test]
    async fn test_user_name_must_match_exactly_one_user() {
        let client = mock_client();
        let mut params = group_member("bob-dev", "default").spec.for_provider;
        params.user_name = Some("bob".to_string());

        let err = GroupMemberAdapter
            .prepare(client.as_ref(), &mut params)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::AmbiguousUser { count: 0, .. }));

        client.add_user(user(20, "bob"));
        client.add_user(user(21, "bob"));
        let err = GroupMemberAdapter
            .prepare(client.as_ref(), &mut params)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::AmbiguousUser { count: 2, .. }));
        assert_eq!(params.user_id, None);
    }

    #[tokio::test]
    async fn test_explicit_user_id_skips_lookup() {
        let client = mock_client();
        let mut params = group_member("carol-dev", "default").spec.for_provider;
        params.user_id = Some(3);
        params.user_name = Some("carol".to_string());
        GroupMemberAdapter.prepare(client.as_ref(), &mut params).await.unwrap();
        assert_eq!(params.user_id, Some(3));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_group_id() {
        let client = mock_client();
        let obj = group_member("alice-dev", "default");
        let err = GroupMemberAdapter
            .observe(client.as_ref(), "12", &obj)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::MissingRequiredId("groupId")));
        assert_eq!(err.reason(), "MissingRequiredID");
    }

    #[tokio::test]
    async fn test_create_then_drift() {
        let client = mock_client();
        client.add_user(user(12, "alice"));
        client.add_group(gitlab_client::Group {
            id: 7,
            name: "team".to_string(),
            path: "team".to_string(),
            ..Default::default()
        });

        let mut obj = group_member("alice-dev", "default");
        obj.spec.for_provider.group_id = Some(7);
        obj.spec.for_provider.user_id = Some(12);

        let creation = GroupMemberAdapter.create(client.as_ref(), &obj).await.unwrap();
        assert_eq!(creation.external_name, "12");

        let Observed::Exists(member) = GroupMemberAdapter
            .observe(client.as_ref(), "12", &obj)
            .await
            .unwrap()
        else {
            panic!("member should exist");
        };
        assert!(GroupMemberAdapter.is_up_to_date(&obj.spec.for_provider, &member));

        obj.spec.for_provider.access_level = 40;
        assert!(!GroupMemberAdapter.is_up_to_date(&obj.spec.for_provider, &member));
        GroupMemberAdapter
            .update(client.as_ref(), "12", &obj, &member)
            .await
            .unwrap();
        assert_eq!(client.calls_to("edit_group_member"), vec!["edit_group_member 7/12"]);
    }
}
