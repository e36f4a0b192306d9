//! Test utilities for the GitLab controller
//!
//! In-memory stores standing in for the Kubernetes API, a client factory
//! handing out a shared `MockGitLabClient`, and builders for every managed kind.

use crate::config::Settings;
use crate::credentials::{ClientFactory, Session};
use crate::engine::{Context, Engine};
use crate::error::ControllerError;
use crate::adapters::Adapter;
use crate::store::{ClusterStore, ManagedStore};
use crds::*;
use gitlab_client::{GitLabClientTrait, MockGitLabClient};
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const NAMESPACE: &str = "default";
pub const BASE_URL: &str = "https://gitlab.example.com/";

/// Error returned by injected store failures
pub fn injected_error() -> kube::Error {
    let cause = serde_json::from_str::<serde_json::Value>("injected failure").unwrap_err();
    kube::Error::SerdeError(cause)
}

pub fn mock_client() -> Arc<MockGitLabClient> {
    Arc::new(MockGitLabClient::new(BASE_URL))
}

struct StoreState<K> {
    objects: BTreeMap<(String, String), K>,
    reads: usize,
    spec_writes: usize,
    status_writes: usize,
    failing_annotations: Vec<String>,
}

/// In-memory `ManagedStore`; clones share state
pub struct MemoryStore<K> {
    state: Arc<Mutex<StoreState<K>>>,
}

impl<K> Clone for MemoryStore<K> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                objects: BTreeMap::new(),
                reads: 0,
                spec_writes: 0,
                status_writes: 0,
                failing_annotations: Vec::new(),
            })),
        }
    }
}

fn key_of<K: Resource>(obj: &K) -> (String, String) {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

impl<K: ManagedResource> MemoryStore<K> {
    pub fn insert(&self, obj: K) {
        self.state.lock().unwrap().objects.insert(key_of(&obj), obj);
    }

    /// Stored copy of an object (for assertions and the next tick)
    pub fn get_stored(&self, namespace: &str, name: &str) -> Option<K> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Stored copy of an object in the default namespace
    pub fn stored(&self, name: &str) -> K {
        self.get_stored(NAMESPACE, name).unwrap()
    }

    /// Mark an object as being deleted
    pub fn mark_deleted(&self, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(obj) = state
            .objects
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            obj.meta_mut().deletion_timestamp =
                serde_json::from_value(serde_json::json!("2026-01-01T00:00:00Z")).ok();
        }
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn spec_writes(&self) -> usize {
        self.state.lock().unwrap().spec_writes
    }

    pub fn status_writes(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }

    /// Fail the next annotation update that sets `annotation`
    pub fn fail_annotation_update(&self, annotation: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_annotations
            .push(annotation.to_string());
    }
}

#[async_trait::async_trait]
impl<K: ManagedResource> ManagedStore<K> for MemoryStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<K>, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state
            .objects
            .iter()
            .filter(|((ns, _), obj)| ns == namespace && selector.matches(obj.meta().labels.as_ref()))
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn update_annotations(
        &self,
        obj: &K,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), kube::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state
            .failing_annotations
            .iter()
            .position(|a| annotations.contains_key(a))
        {
            state.failing_annotations.remove(pos);
            return Err(injected_error());
        }
        if let Some(stored) = state.objects.get_mut(&key_of(obj)) {
            stored
                .annotations_mut()
                .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(())
    }

    async fn set_finalizers(&self, obj: &K, finalizers: Vec<String>) -> Result<(), kube::Error> {
        let mut state = self.state.lock().unwrap();
        let key = key_of(obj);
        let released = finalizers.is_empty();
        if let Some(stored) = state.objects.get_mut(&key) {
            stored.meta_mut().finalizers = Some(finalizers);
            if released && stored.is_being_deleted() {
                state.objects.remove(&key);
            }
        }
        Ok(())
    }

    async fn update_spec(&self, obj: &K) -> Result<(), kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.spec_writes += 1;
        if let Some(stored) = state.objects.get_mut(&key_of(obj)) {
            *stored.parameters_mut() = obj.parameters().clone();
        }
        Ok(())
    }

    async fn update_status(&self, obj: &K) -> Result<(), kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.status_writes += 1;
        if let Some(stored) = state.objects.get_mut(&key_of(obj)) {
            *stored.managed_status_mut() = obj.managed_status().cloned().unwrap_or_default();
        }
        Ok(())
    }
}

#[derive(Default)]
struct ClusterState {
    provider_configs: BTreeMap<String, ProviderConfig>,
    secrets: BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>,
    usages: BTreeMap<String, ProviderConfigUsage>,
    secret_writes: usize,
    fail_secret_writes: bool,
}

/// In-memory `ClusterStore`
#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<ClusterState>,
}

impl MemoryCluster {
    pub fn add_provider_config(&self, config: ProviderConfig) {
        self.state
            .lock()
            .unwrap()
            .provider_configs
            .insert(config.name_any(), config);
    }

    pub fn add_secret(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let data = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), data);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, Vec<u8>>> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn secret_writes(&self) -> usize {
        self.state.lock().unwrap().secret_writes
    }

    pub fn fail_secret_writes(&self) {
        self.state.lock().unwrap().fail_secret_writes = true;
    }

    pub fn usages(&self) -> Vec<ProviderConfigUsage> {
        self.state.lock().unwrap().usages.values().cloned().collect()
    }

    pub fn add_usage(&self, usage: ProviderConfigUsage) {
        self.state
            .lock()
            .unwrap()
            .usages
            .insert(usage.name_any(), usage);
    }

    /// Stored ProviderConfig (for assertions)
    pub fn stored_provider_config(&self, name: &str) -> Option<ProviderConfig> {
        self.state.lock().unwrap().provider_configs.get(name).cloned()
    }
}

#[async_trait::async_trait]
impl ClusterStore for MemoryCluster {
    async fn provider_config(&self, name: &str) -> Result<Option<ProviderConfig>, kube::Error> {
        Ok(self.stored_provider_config(name))
    }

    async fn secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, kube::Error> {
        Ok(self.secret(namespace, name))
    }

    async fn apply_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, Vec<u8>>,
    ) -> Result<(), kube::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_secret_writes {
            return Err(injected_error());
        }
        state.secret_writes += 1;
        state
            .secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn apply_usage(&self, usage: &ProviderConfigUsage) -> Result<(), kube::Error> {
        self.add_usage(usage.clone());
        Ok(())
    }

    async fn delete_usage(&self, name: &str) -> Result<(), kube::Error> {
        self.state.lock().unwrap().usages.remove(name);
        Ok(())
    }

    async fn list_usages(&self, provider_config: &str) -> Result<Vec<ProviderConfigUsage>, kube::Error> {
        Ok(self
            .usages()
            .into_iter()
            .filter(|u| u.labels().get(PROVIDER_CONFIG_LABEL).map(String::as_str) == Some(provider_config))
            .collect())
    }

    async fn update_provider_config_status(
        &self,
        name: &str,
        status: &ProviderConfigStatus,
    ) -> Result<(), kube::Error> {
        if let Some(config) = self.state.lock().unwrap().provider_configs.get_mut(name) {
            config.status = Some(status.clone());
        }
        Ok(())
    }

    async fn set_provider_config_finalizers(
        &self,
        name: &str,
        finalizers: Vec<String>,
    ) -> Result<(), kube::Error> {
        if let Some(config) = self.state.lock().unwrap().provider_configs.get_mut(name) {
            config.metadata.finalizers = Some(finalizers);
        }
        Ok(())
    }
}

/// `ClientFactory` handing out one shared mock client
pub struct MockClients {
    client: Arc<MockGitLabClient>,
    sessions: Mutex<Vec<Session>>,
}

impl MockClients {
    pub fn new(client: Arc<MockGitLabClient>) -> Self {
        Self {
            client,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Sessions clients were requested for
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }
}

impl ClientFactory for MockClients {
    fn client(&self, session: &Session) -> Result<Arc<dyn GitLabClientTrait>, ControllerError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(self.client.clone() as Arc<dyn GitLabClientTrait>)
    }
}

/// A ProviderConfig reading its token from `crossplane/gitlab`, key `token`
pub fn provider_config(name: &str, auth_method: AuthMethod) -> ProviderConfig {
    ProviderConfig::new(
        name,
        ProviderConfigSpec {
            base_url: BASE_URL.to_string(),
            insecure_skip_verify: None,
            auth_method,
            credentials: ProviderCredentials {
                source: CredentialsSource::Secret,
                secret_ref: Some(SecretKeySelector {
                    name: "gitlab".to_string(),
                    namespace: "crossplane".to_string(),
                    key: "token".to_string(),
                }),
            },
        },
    )
}

/// Everything an engine needs, wired to in-memory fakes
pub struct TestEnv {
    pub client: Arc<MockGitLabClient>,
    pub clients: Arc<MockClients>,
    pub cluster: Arc<MemoryCluster>,
    pub groups: MemoryStore<Group>,
    pub projects: MemoryStore<Project>,
    pub shutdown: watch::Sender<bool>,
    pub ctx: Arc<Context>,
}

impl TestEnv {
    /// ProviderConfig `default` with a personal access token
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let client = mock_client();
        let clients = Arc::new(MockClients::new(client.clone()));
        let cluster = Arc::new(MemoryCluster::default());
        cluster.add_provider_config(provider_config("default", AuthMethod::PersonalAccessToken));
        cluster.add_secret("crossplane", "gitlab", &[("token", "glpat-test")]);

        let groups = MemoryStore::default();
        let projects = MemoryStore::default();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let ctx = Arc::new(Context::new(
            cluster.clone(),
            Arc::new(groups.clone()),
            Arc::new(projects.clone()),
            clients.clone(),
            settings,
            shutdown_rx,
        ));
        Self {
            client,
            clients,
            cluster,
            groups,
            projects,
            shutdown,
            ctx,
        }
    }

    pub fn engine<A: Adapter>(&self, adapter: A, store: &MemoryStore<A::Kind>) -> Engine<A> {
        Engine::new(adapter, Arc::new(store.clone()), Arc::clone(&self.ctx))
    }
}

fn meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(NAMESPACE.to_string()),
        ..Default::default()
    }
}

fn resource_spec(provider_config: &str) -> ResourceSpec {
    ResourceSpec {
        provider_config_ref: Some(ProviderConfigReference {
            name: provider_config.to_string(),
        }),
        ..Default::default()
    }
}

pub fn with_external_name<K: ManagedResource>(mut obj: K, external_name: &str) -> K {
    obj.annotations_mut()
        .insert(EXTERNAL_NAME_ANNOTATION.to_string(), external_name.to_string());
    obj
}

pub fn with_labels<K: ManagedResource>(mut obj: K, labels: &[(&str, &str)]) -> K {
    obj.labels_mut()
        .extend(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    obj
}

pub fn group(name: &str, provider_config: &str) -> Group {
    Group {
        metadata: meta(name),
        spec: GroupSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: GroupParameters {
                name: name.to_string(),
                path: name.to_string(),
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn project(name: &str, provider_config: &str) -> Project {
    Project {
        metadata: meta(name),
        spec: ProjectSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: ProjectParameters {
                name: name.to_string(),
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn group_member(name: &str, provider_config: &str) -> GroupMember {
    GroupMember {
        metadata: meta(name),
        spec: GroupMemberSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: GroupMemberParameters {
                access_level: 30,
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn project_member(name: &str, provider_config: &str) -> ProjectMember {
    ProjectMember {
        metadata: meta(name),
        spec: ProjectMemberSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: ProjectMemberParameters {
                access_level: 30,
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn access_token(name: &str, provider_config: &str) -> ProjectAccessToken {
    ProjectAccessToken {
        metadata: meta(name),
        spec: ProjectAccessTokenSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: ProjectAccessTokenParameters {
                name: name.to_string(),
                scopes: vec!["read_api".to_string()],
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn deploy_token(name: &str, provider_config: &str) -> DeployToken {
    DeployToken {
        metadata: meta(name),
        spec: DeployTokenSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: DeployTokenParameters {
                name: name.to_string(),
                scopes: vec!["read_registry".to_string()],
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn project_variable(name: &str, provider_config: &str) -> ProjectVariable {
    ProjectVariable {
        metadata: meta(name),
        spec: ProjectVariableSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: ProjectVariableParameters::default(),
        },
        status: None,
    }
}

pub fn project_hook(name: &str, provider_config: &str) -> ProjectHook {
    ProjectHook {
        metadata: meta(name),
        spec: ProjectHookSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: ProjectHookParameters::default(),
        },
        status: None,
    }
}

pub fn deploy_key(name: &str, provider_config: &str) -> DeployKey {
    DeployKey {
        metadata: meta(name),
        spec: DeployKeySpec {
            resource_spec: resource_spec(provider_config),
            for_provider: DeployKeyParameters {
                title: name.to_string(),
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn pipeline_schedule(name: &str, provider_config: &str) -> PipelineSchedule {
    PipelineSchedule {
        metadata: meta(name),
        spec: PipelineScheduleSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: PipelineScheduleParameters {
                description: name.to_string(),
                ref_: "main".to_string(),
                cron: "0 2 * * *".to_string(),
                ..Default::default()
            },
        },
        status: None,
    }
}

pub fn repository_file(name: &str, provider_config: &str) -> RepositoryFile {
    RepositoryFile {
        metadata: meta(name),
        spec: RepositoryFileSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: RepositoryFileParameters::default(),
        },
        status: None,
    }
}

pub fn user_runner(name: &str, provider_config: &str) -> UserRunner {
    UserRunner {
        metadata: meta(name),
        spec: UserRunnerSpec {
            resource_spec: resource_spec(provider_config),
            for_provider: UserRunnerParameters {
                runner_type: "project_type".to_string(),
                description: Some(name.to_string()),
                ..Default::default()
            },
        },
        status: None,
    }
}
