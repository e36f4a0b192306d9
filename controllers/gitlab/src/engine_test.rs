//! Tick-level tests of the reconciliation engine against in-memory stores and
//! the mock GitLab client.

use crate::adapters::access_token::AccessTokenAdapter;
use crate::adapters::file::FileAdapter;
use crate::adapters::group::GroupAdapter;
use crate::adapters::pipeline_schedule::PipelineScheduleAdapter;
use crate::adapters::project::ProjectAdapter;
use crate::config::Settings;
use crate::engine::{TickAction, object_key};
use crate::error::ControllerError;
use crate::test_utils::{
    MemoryStore, NAMESPACE, TestEnv, access_token, group, pipeline_schedule, project, provider_config,
    repository_file, with_external_name,
};
use crds::{
    AuthMethod, CREATE_FAILED_ANNOTATION, CREATE_PENDING_ANNOTATION, CREATE_SUCCEEDED_ANNOTATION,
    ConditionStatus, ConditionType, EXTERNAL_NAME_ANNOTATION, MANAGED_FINALIZER, ManagedResource,
    ManagementPolicy, PipelineSchedule, PipelineVariable, ProjectAccessToken, REASON_NOT_FOUND,
    REASON_REVOKED, RESOLVED_REFERENCES_ANNOTATION, Reference, SecretReference, get_condition,
};
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use std::time::Duration;

fn condition<K: ManagedResource>(obj: &K, type_: ConditionType) -> (ConditionStatus, String) {
    let c = get_condition(obj.conditions(), type_).unwrap();
    (c.status, c.reason.clone())
}

#[tokio::test]
async fn test_create_group_binds_and_reports_ready() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);
    assert!(outcome.exists);

    let stored = env.groups.stored("platform");
    let id = stored.external_name().unwrap().parse::<i64>().unwrap();
    assert_eq!(env.client.group(id).unwrap().path, "platform");
    assert!(stored.annotation(CREATE_PENDING_ANNOTATION).is_some());
    assert!(stored.annotation(CREATE_SUCCEEDED_ANNOTATION).is_some());
    assert!(stored.annotation(CREATE_FAILED_ANNOTATION).is_none());
    assert!(stored.has_finalizer(MANAGED_FINALIZER));
    assert_eq!(
        condition(&stored, ConditionType::Ready),
        (ConditionStatus::True, "Available".to_string())
    );
    assert_eq!(condition(&stored, ConditionType::Synced).0, ConditionStatus::True);
    assert_eq!(env.cluster.usages().len(), 1);
    assert_eq!(env.clients.sessions()[0].base_url, "https://gitlab.example.com/");
}

#[tokio::test]
async fn test_steady_state_is_idempotent() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    // First observation late-initializes the defaults GitLab filled in.
    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(outcome.up_to_date);

    let mutations = env.client.mutating_calls();
    let status_writes = env.groups.status_writes();
    let spec_writes = env.groups.spec_writes();

    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(!outcome.late_initialized);
    assert_eq!(env.client.mutating_calls(), mutations);
    assert_eq!(env.groups.status_writes(), status_writes);
    assert_eq!(env.groups.spec_writes(), spec_writes);
}

#[tokio::test]
async fn test_drift_triggers_update() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);
    engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    engine.reconcile(&env.groups.stored("platform")).await.unwrap();

    let mut edited = env.groups.stored("platform");
    edited.spec.for_provider.description = Some("Platform team".to_string());
    env.groups.insert(edited);

    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Updated);
    assert!(!outcome.up_to_date);
    assert_eq!(env.client.calls_to("update_group").len(), 1);

    let id = env.groups.stored("platform").external_name().unwrap().parse::<i64>().unwrap();
    assert_eq!(
        env.client.group(id).unwrap().description.as_deref(),
        Some("Platform team")
    );
}

#[tokio::test]
async fn test_late_init_fills_spec_without_update() {
    let env = TestEnv::new();
    env.client.add_group(gitlab_client::Group {
        id: 40,
        name: "legacy".to_string(),
        path: "legacy".to_string(),
        description: Some("from gitlab".to_string()),
        lfs_enabled: true,
        ..Default::default()
    });
    env.groups.insert(with_external_name(group("legacy", "default"), "40"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let outcome = engine.reconcile(&env.groups.stored("legacy")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(outcome.late_initialized);
    assert!(env.client.mutating_calls().is_empty());

    let stored = env.groups.stored("legacy");
    assert_eq!(stored.spec.for_provider.description.as_deref(), Some("from gitlab"));
    assert_eq!(stored.spec.for_provider.lfs_enabled, Some(true));
    assert_eq!(stored.at_provider().map(|o| o.id), Some(40));
}

#[tokio::test]
async fn test_observe_only_never_creates() {
    let env = TestEnv::new();
    let mut obj = with_external_name(group("platform", "default"), "999");
    obj.spec.resource_spec.management_policy = ManagementPolicy::ObserveOnly;
    env.groups.insert(obj);
    let engine = env.engine(GroupAdapter, &env.groups);

    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(!outcome.exists);
    assert!(env.client.mutating_calls().is_empty());
    assert_eq!(
        condition(&env.groups.stored("platform"), ConditionType::Ready),
        (ConditionStatus::False, REASON_NOT_FOUND.to_string())
    );
}

#[tokio::test]
async fn test_failed_create_is_recorded_and_retried() {
    let env = TestEnv::new();
    env.client.fail_once("create_group", 500);
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::CreateFailed { .. }));
    assert!(err.is_transient());

    let stored = env.groups.stored("platform");
    assert!(stored.external_name().is_none());
    assert!(stored.annotation(CREATE_FAILED_ANNOTATION).is_some());
    assert_eq!(
        condition(&stored, ConditionType::Synced),
        (ConditionStatus::False, "CreateFailed".to_string())
    );

    let outcome = engine.reconcile(&stored).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);
    let stored = env.groups.stored("platform");
    assert!(stored.annotation(CREATE_FAILED_ANNOTATION).is_none());
    assert_eq!(condition(&stored, ConditionType::Synced).0, ConditionStatus::True);
}

#[tokio::test]
async fn test_failed_schedule_variable_never_duplicates_schedule() {
    let env = TestEnv::new();
    env.client.fail_once("create_pipeline_schedule_variable", 500);
    let mut obj = pipeline_schedule("nightly", "default");
    obj.spec.for_provider.project_id = Some(5);
    obj.spec.for_provider.variables = Some(vec![PipelineVariable {
        key: "a".to_string(),
        value: "1".to_string(),
        variable_type: None,
    }]);
    let schedules: MemoryStore<PipelineSchedule> = MemoryStore::default();
    schedules.insert(obj);
    let engine = env.engine(PipelineScheduleAdapter, &schedules);

    let outcome = engine.reconcile(&schedules.stored("nightly")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);
    let bound = schedules.stored("nightly").external_name().unwrap().to_string();

    // The variable fails on the first update; the schedule stays bound
    let err = engine.reconcile(&schedules.stored("nightly")).await.unwrap_err();
    assert!(matches!(err, ControllerError::UpdateFailed { .. }));
    assert!(err.is_transient());
    let stored = schedules.stored("nightly");
    assert_eq!(stored.external_name(), Some(bound.as_str()));
    assert_eq!(
        condition(&stored, ConditionType::Synced),
        (ConditionStatus::False, "UpdateFailed".to_string())
    );

    let outcome = engine.reconcile(&stored).await.unwrap();
    assert_eq!(outcome.action, TickAction::Updated);

    assert_eq!(env.client.calls_to("create_pipeline_schedule").len(), 1);
    let id = bound.parse::<i64>().unwrap();
    let remote = env.client.pipeline_schedule(5, id).unwrap();
    assert_eq!(remote.variables.len(), 1);
    assert_eq!(remote.variables[0].key, "a");

    let outcome = engine.reconcile(&schedules.stored("nightly")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
}

#[tokio::test]
async fn test_lost_binding_is_never_recreated() {
    let env = TestEnv::new();
    env.groups.fail_annotation_update(EXTERNAL_NAME_ANNOTATION);
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::BindingLost(_)));
    assert_eq!(env.client.calls_to("create_group").len(), 1);

    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::BindingLost(_)));
    assert!(!err.is_transient());
    assert_eq!(env.client.calls_to("create_group").len(), 1);
    assert_eq!(
        condition(&env.groups.stored("platform"), ConditionType::Synced),
        (ConditionStatus::False, "BindingLost".to_string())
    );
}

#[tokio::test]
async fn test_delete_removes_remote_and_releases_object() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);
    engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    let id = env.groups.stored("platform").external_name().unwrap().parse::<i64>().unwrap();

    env.groups.mark_deleted(NAMESPACE, "platform");
    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Deleted);
    assert!(env.client.group(id).is_none());
    assert!(env.cluster.usages().is_empty());
    assert!(env.groups.get_stored(NAMESPACE, "platform").is_none());
}

#[tokio::test]
async fn test_no_delete_policy_orphans_remote() {
    let env = TestEnv::new();
    let mut obj = group("platform", "default");
    obj.spec.resource_spec.management_policy = ManagementPolicy::NoDelete;
    env.groups.insert(obj);
    let engine = env.engine(GroupAdapter, &env.groups);
    engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    let id = env.groups.stored("platform").external_name().unwrap().parse::<i64>().unwrap();

    env.groups.mark_deleted(NAMESPACE, "platform");
    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Deleted);
    assert!(env.client.calls_to("delete_group").is_empty());
    assert!(env.client.group(id).is_some());
    assert!(env.groups.get_stored(NAMESPACE, "platform").is_none());
}

#[tokio::test]
async fn test_delete_error_keeps_finalizer() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);
    engine.reconcile(&env.groups.stored("platform")).await.unwrap();

    env.client.fail_once("delete_group", 503);
    env.groups.mark_deleted(NAMESPACE, "platform");
    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::DeleteFailed { .. }));

    let stored = env.groups.stored("platform");
    assert!(stored.has_finalizer(MANAGED_FINALIZER));
    assert_eq!(
        condition(&stored, ConditionType::Ready),
        (ConditionStatus::False, "Deleting".to_string())
    );
    assert_eq!(env.cluster.usages().len(), 1);
}

#[tokio::test]
async fn test_missing_provider_config() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "elsewhere"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::ConfigNotFound(_)));
    let stored = env.groups.stored("platform");
    assert!(!stored.has_finalizer(MANAGED_FINALIZER));
    assert_eq!(
        condition(&stored, ConditionType::Synced),
        (ConditionStatus::False, "ConfigNotFound".to_string())
    );
    assert!(env.client.calls().is_empty());
}

#[tokio::test]
async fn test_insecure_provider_config_reaches_session() {
    let env = TestEnv::new();
    let mut config = provider_config("self-signed", AuthMethod::PersonalAccessToken);
    config.spec.insecure_skip_verify = Some(true);
    env.cluster.add_provider_config(config);
    env.groups.insert(group("platform", "self-signed"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let outcome = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);
    let sessions = env.clients.sessions();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].insecure_skip_verify);
}

#[tokio::test]
async fn test_project_resolves_group_reference() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    env.engine(GroupAdapter, &env.groups)
        .reconcile(&env.groups.stored("platform"))
        .await
        .unwrap();
    let group_id = env.groups.stored("platform").external_name().unwrap().parse::<i64>().unwrap();

    let mut obj = project("web", "default");
    obj.spec.for_provider.namespace_id_ref = Some(Reference::new("platform"));
    env.projects.insert(obj);
    let engine = env.engine(ProjectAdapter, &env.projects);

    let outcome = engine.reconcile(&env.projects.stored("web")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);

    let stored = env.projects.stored("web");
    assert_eq!(stored.spec.for_provider.namespace_id, Some(group_id));
    assert_eq!(
        stored.annotation(RESOLVED_REFERENCES_ANNOTATION),
        Some(r#"{"namespaceId":"name:platform"}"#)
    );
    let id = stored.external_name().unwrap().parse::<i64>().unwrap();
    assert_eq!(env.client.project(id).unwrap().namespace.map(|n| n.id), Some(group_id));
}

#[tokio::test]
async fn test_unresolvable_reference_blocks_create() {
    let env = TestEnv::new();
    let mut obj = project("web", "default");
    obj.spec.for_provider.namespace_id_ref = Some(Reference::new("missing"));
    env.projects.insert(obj);
    let engine = env.engine(ProjectAdapter, &env.projects);

    let err = engine.reconcile(&env.projects.stored("web")).await.unwrap_err();
    assert!(matches!(err, ControllerError::ReferenceTargetMissing { .. }));
    assert!(err.is_transient());
    assert!(env.client.mutating_calls().is_empty());
}

fn revoked_token(env: &TestEnv, policy: ManagementPolicy) -> MemoryStore<ProjectAccessToken> {
    env.client.add_project_access_token(
        5,
        gitlab_client::ProjectAccessToken {
            id: 3,
            name: "ci".to_string(),
            revoked: true,
            active: false,
            ..Default::default()
        },
    );
    let mut obj = with_external_name(access_token("ci", "default"), "3");
    obj.spec.for_provider.project_id = Some(5);
    obj.spec.resource_spec.management_policy = policy;
    obj.spec.resource_spec.write_connection_secret_to_ref = Some(SecretReference {
        name: "ci-token".to_string(),
        namespace: None,
    });
    let store = MemoryStore::default();
    store.insert(obj);
    store
}

#[tokio::test]
async fn test_revoked_token_is_replaced() {
    let env = TestEnv::new();
    let tokens = revoked_token(&env, ManagementPolicy::FullControl);
    let engine = env.engine(AccessTokenAdapter, &tokens);

    let outcome = engine.reconcile(&tokens.stored("ci")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);

    let stored = tokens.stored("ci");
    assert_ne!(stored.external_name(), Some("3"));
    let secret = env.cluster.secret(NAMESPACE, "ci-token").unwrap();
    assert!(secret.get("token").unwrap().starts_with(b"glpat-mock-"));
    assert_eq!(condition(&stored, ConditionType::Ready).0, ConditionStatus::True);
}

#[tokio::test]
async fn test_revoked_token_under_observe_only() {
    let env = TestEnv::new();
    let tokens = revoked_token(&env, ManagementPolicy::ObserveOnly);
    let engine = env.engine(AccessTokenAdapter, &tokens);

    let outcome = engine.reconcile(&tokens.stored("ci")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(env.client.calls_to("create_project_access_token").is_empty());
    assert!(env.cluster.secret(NAMESPACE, "ci-token").is_none());

    let stored = tokens.stored("ci");
    assert_eq!(stored.external_name(), Some("3"));
    assert_eq!(
        condition(&stored, ConditionType::Ready),
        (ConditionStatus::False, REASON_REVOKED.to_string())
    );
}

#[tokio::test]
async fn test_token_edits_are_not_applied() {
    let env = TestEnv::new();
    env.client.add_project_access_token(
        5,
        gitlab_client::ProjectAccessToken {
            id: 3,
            name: "ci".to_string(),
            scopes: vec!["read_api".to_string()],
            active: true,
            ..Default::default()
        },
    );
    let mut obj = with_external_name(access_token("ci", "default"), "3");
    obj.spec.for_provider.project_id = Some(5);
    obj.spec.for_provider.name = "ci-renamed".to_string();
    obj.spec.for_provider.scopes = vec!["api".to_string()];
    let tokens = MemoryStore::default();
    tokens.insert(obj);
    let engine = env.engine(AccessTokenAdapter, &tokens);

    let outcome = engine.reconcile(&tokens.stored("ci")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(outcome.up_to_date);
    assert!(env.client.mutating_calls().is_empty());
    assert_eq!(tokens.stored("ci").external_name(), Some("3"));
}

#[tokio::test]
async fn test_publish_failure_is_reported() {
    let env = TestEnv::new();
    env.cluster.fail_secret_writes();
    let tokens = revoked_token(&env, ManagementPolicy::FullControl);
    let engine = env.engine(AccessTokenAdapter, &tokens);

    let err = engine.reconcile(&tokens.stored("ci")).await.unwrap_err();
    assert!(matches!(err, ControllerError::PublishFailed(_)));
    // The new token is bound even though its value could not be published.
    assert_ne!(tokens.stored("ci").external_name(), Some("3"));
}

#[tokio::test]
async fn test_existing_file_is_adopted_by_path() {
    let env = TestEnv::new();
    env.client.add_file(
        5,
        "main",
        gitlab_client::RepositoryFile {
            file_name: "README.md".to_string(),
            file_path: "README.md".to_string(),
            content: "hello".to_string(),
            encoding: "text".to_string(),
            ..Default::default()
        },
    );
    let mut obj = repository_file("readme", "default");
    obj.spec.for_provider.project_id = Some(5);
    obj.spec.for_provider.file_path = "README.md".to_string();
    obj.spec.for_provider.branch = "main".to_string();
    obj.spec.for_provider.content = "hello".to_string();
    obj.spec.for_provider.commit_message = "Add README".to_string();
    let files = MemoryStore::default();
    files.insert(obj);
    let engine = env.engine(FileAdapter, &files);

    let outcome = engine.reconcile(&files.stored("readme")).await.unwrap();
    assert_eq!(outcome.action, TickAction::Unchanged);
    assert!(env.client.mutating_calls().is_empty());
    assert_eq!(files.stored("readme").external_name(), Some("README.md"));
}

#[tokio::test]
async fn test_shutdown_cancels_tick() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    env.shutdown.send(true).unwrap();
    let err = engine.reconcile(&env.groups.stored("platform")).await.unwrap_err();
    assert!(matches!(err, ControllerError::Canceled(_)));
    assert!(err.is_transient());
    assert!(env.client.calls().is_empty());
}

#[tokio::test]
async fn test_dynamic_object_of_other_kind_is_rejected() {
    let env = TestEnv::new();
    let engine = env.engine(GroupAdapter, &env.groups);

    let obj: DynamicObject = serde_json::from_value(serde_json::json!({
        "apiVersion": "gitlab.microscaler.io/v1alpha1",
        "kind": "Project",
        "metadata": {"name": "web", "namespace": "default"},
        "spec": {"forProvider": {"name": "web"}}
    }))
    .unwrap();
    let err = engine.reconcile_dynamic(&obj).await.unwrap_err();
    assert!(matches!(err, ControllerError::NotThisKind { .. }));
    assert!(env.client.calls().is_empty());
}

#[tokio::test]
async fn test_dynamic_object_of_own_kind_is_reconciled() {
    let env = TestEnv::new();
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);

    let obj: DynamicObject = serde_json::from_value(serde_json::json!({
        "apiVersion": "gitlab.microscaler.io/v1alpha1",
        "kind": "Group",
        "metadata": {"name": "platform", "namespace": "default"},
        "spec": {
            "providerConfigRef": {"name": "default"},
            "forProvider": {"name": "platform", "path": "platform"}
        }
    }))
    .unwrap();
    let outcome = engine.reconcile_dynamic(&obj).await.unwrap();
    assert_eq!(outcome.action, TickAction::Created);
    assert!(env.groups.stored("platform").external_name().is_some());
}

#[tokio::test]
async fn test_requeue_policy() {
    let env = TestEnv::with_settings(Settings {
        poll_interval: Duration::from_secs(300),
        backoff_min: Duration::from_secs(5),
        backoff_max: Duration::from_secs(60),
        ..Settings::default()
    });
    env.groups.insert(group("platform", "default"));
    let engine = env.engine(GroupAdapter, &env.groups);
    let obj = env.groups.stored("platform");
    let key = object_key(&obj);

    let created = engine.reconcile(&obj).await.unwrap();
    assert_eq!(engine.success_action(&obj, &created), Action::requeue(Duration::ZERO));
    let steady = engine.reconcile(&env.groups.stored("platform")).await.unwrap();
    assert_eq!(
        engine.success_action(&obj, &steady),
        Action::requeue(Duration::from_secs(300))
    );

    let transient = ControllerError::Canceled("tick timed out".to_string());
    assert_eq!(engine.error_action(&key, &transient), Action::requeue(Duration::from_secs(5)));
    assert_eq!(engine.error_action(&key, &transient), Action::requeue(Duration::from_secs(5)));
    assert_eq!(engine.error_action(&key, &transient), Action::requeue(Duration::from_secs(10)));

    let fatal = ControllerError::MissingRequiredId("projectId");
    assert_eq!(engine.error_action(&key, &fatal), Action::requeue(Duration::from_secs(60)));
}
