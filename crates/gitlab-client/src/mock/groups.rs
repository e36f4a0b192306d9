//! Users, groups, group shares and group members for MockGitLabClient

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;
use chrono::Utc;

pub async fn current_user(client: &MockGitLabClient) -> Result<User, GitLabError> {
    client.record("current_user", "")?;
    Ok(User {
        id: 1,
        username: "root".to_string(),
        name: "Administrator".to_string(),
        state: Some("active".to_string()),
    })
}

pub async fn list_users_by_username(client: &MockGitLabClient, username: &str) -> Result<Vec<User>, GitLabError> {
    client.record("list_users_by_username", username)?;
    let users = client.users.lock().unwrap();
    let mut matches: Vec<User> = users
        .values()
        .filter(|u| u.username == username)
        .cloned()
        .collect();
    matches.sort_by_key(|u| u.id);
    Ok(matches)
}

pub async fn get_group(client: &MockGitLabClient, id: i64) -> Result<Group, GitLabError> {
    client.record("get_group", id)?;
    client
        .groups
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Group", id))
}

pub async fn create_group(client: &MockGitLabClient, options: &GroupOptions) -> Result<Group, GitLabError> {
    client.record("create_group", options.path.as_deref().unwrap_or_default())?;
    let (Some(name), Some(path)) = (options.name.clone(), options.path.clone()) else {
        return Err(GitLabError::Api {
            status: 400,
            message: "name and path are required".to_string(),
        });
    };

    let id = client.next_id();
    let full_path = match options.parent_id {
        Some(parent) => {
            let parent_path = client
                .groups
                .lock()
                .unwrap()
                .get(&parent)
                .and_then(|g| g.full_path.clone())
                .unwrap_or_else(|| parent.to_string());
            format!("{}/{}", parent_path, path)
        }
        None => path.clone(),
    };

    let mut group = Group {
        id,
        name,
        path,
        full_name: None,
        web_url: Some(format!("{}/groups/{}", client.base_url, full_path)),
        full_path: Some(full_path),
        description: Some(String::new()),
        visibility: Some("private".to_string()),
        runners_token: Some(format!("GR1348941runners-{}", id)),
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    apply_group_options(&mut group, options);

    client.groups.lock().unwrap().insert(id, group.clone());
    Ok(group)
}

pub async fn update_group(client: &MockGitLabClient, id: i64, options: &GroupOptions) -> Result<Group, GitLabError> {
    client.record("update_group", id)?;
    let mut groups = client.groups.lock().unwrap();
    let group = groups
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Group", id))?;
    apply_group_options(group, options);
    Ok(group.clone())
}

fn apply_group_options(group: &mut Group, options: &GroupOptions) {
    if let Some(v) = &options.name {
        group.name = v.clone();
    }
    if let Some(v) = &options.path {
        group.path = v.clone();
    }
    if let Some(v) = &options.description {
        group.description = Some(v.clone());
    }
    if let Some(v) = &options.visibility {
        group.visibility = Some(v.clone());
    }
    if let Some(v) = options.parent_id {
        group.parent_id = Some(v);
    }
    if let Some(v) = &options.project_creation_level {
        group.project_creation_level = Some(v.clone());
    }
    if let Some(v) = &options.subgroup_creation_level {
        group.subgroup_creation_level = Some(v.clone());
    }
    if let Some(v) = options.request_access_enabled {
        group.request_access_enabled = v;
    }
    if let Some(v) = options.lfs_enabled {
        group.lfs_enabled = v;
    }
    if let Some(v) = options.membership_lock {
        group.membership_lock = v;
    }
    if let Some(v) = options.share_with_group_lock {
        group.share_with_group_lock = v;
    }
    if let Some(v) = options.require_two_factor_authentication {
        group.require_two_factor_authentication = v;
    }
    if let Some(v) = options.two_factor_grace_period {
        group.two_factor_grace_period = v;
    }
    if let Some(v) = options.auto_devops_enabled {
        group.auto_devops_enabled = Some(v);
    }
    if let Some(v) = options.emails_disabled {
        group.emails_disabled = Some(v);
    }
    if let Some(v) = options.mentions_disabled {
        group.mentions_disabled = Some(v);
    }
    if let Some(v) = options.default_branch_protection {
        group.default_branch_protection = Some(v);
    }
}

pub async fn delete_group(client: &MockGitLabClient, id: i64) -> Result<(), GitLabError> {
    client.record("delete_group", id)?;
    client
        .groups
        .lock()
        .unwrap()
        .remove(&id)
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Group", id))
}

pub async fn share_group(client: &MockGitLabClient, id: i64, options: &ShareGroupOptions) -> Result<Group, GitLabError> {
    client.record("share_group", format!("{} with {}", id, options.group_id))?;
    let mut groups = client.groups.lock().unwrap();
    let shared_path = groups.get(&options.group_id).and_then(|g| g.full_path.clone());
    let group = groups
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Group", id))?;
    group.shared_with_groups.retain(|s| s.group_id != options.group_id);
    group.shared_with_groups.push(GroupShare {
        group_id: options.group_id,
        group_name: None,
        group_full_path: shared_path,
        group_access_level: options.group_access,
        expires_at: options.expires_at,
    });
    Ok(group.clone())
}

pub async fn unshare_group(client: &MockGitLabClient, id: i64, group_id: i64) -> Result<(), GitLabError> {
    client.record("unshare_group", format!("{} from {}", id, group_id))?;
    let mut groups = client.groups.lock().unwrap();
    let group = groups
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Group", id))?;
    let before = group.shared_with_groups.len();
    group.shared_with_groups.retain(|s| s.group_id != group_id);
    if group.shared_with_groups.len() == before {
        return Err(MockGitLabClient::not_found("Group Link", group_id));
    }
    Ok(())
}

pub async fn get_group_member(client: &MockGitLabClient, group_id: i64, user_id: i64) -> Result<Member, GitLabError> {
    client.record("get_group_member", format!("{}/{}", group_id, user_id))?;
    client
        .group_members
        .lock()
        .unwrap()
        .get(&(group_id, user_id))
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))
}

pub async fn add_group_member(client: &MockGitLabClient, group_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
    let user_id = options.user_id.unwrap_or_default();
    client.record("add_group_member", format!("{}/{}", group_id, user_id))?;
    if !client.groups.lock().unwrap().contains_key(&group_id) {
        return Err(MockGitLabClient::not_found("Group", group_id));
    }
    let member = new_member(client, user_id, options);
    client
        .group_members
        .lock()
        .unwrap()
        .insert((group_id, user_id), member.clone());
    Ok(member)
}

pub async fn edit_group_member(client: &MockGitLabClient, group_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
    client.record("edit_group_member", format!("{}/{}", group_id, user_id))?;
    let mut members = client.group_members.lock().unwrap();
    let member = members
        .get_mut(&(group_id, user_id))
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))?;
    apply_member_options(member, options);
    Ok(member.clone())
}

pub async fn remove_group_member(client: &MockGitLabClient, group_id: i64, user_id: i64) -> Result<(), GitLabError> {
    client.record("remove_group_member", format!("{}/{}", group_id, user_id))?;
    client
        .group_members
        .lock()
        .unwrap()
        .remove(&(group_id, user_id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))
}

pub(crate) fn new_member(client: &MockGitLabClient, user_id: i64, options: &MemberOptions) -> Member {
    let user = client.users.lock().unwrap().get(&user_id).cloned();
    let mut member = Member {
        id: user_id,
        username: user.as_ref().map(|u| u.username.clone()).unwrap_or_default(),
        name: user.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
        state: Some("active".to_string()),
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    apply_member_options(&mut member, options);
    member
}

pub(crate) fn apply_member_options(member: &mut Member, options: &MemberOptions) {
    if let Some(level) = options.access_level {
        member.access_level = level;
    }
    if let Some(expires_at) = options.expires_at {
        member.expires_at = Some(expires_at);
    }
    if let Some(role) = options.member_role_id {
        member.member_role = Some(MemberRole { id: role, name: None });
    }
}
