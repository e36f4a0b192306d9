//! Kubernetes-facing reads and writes used by the reconciliation engine.
//!
//! The engine never talks to `kube::Api` directly: managed objects go through
//! [`ManagedStore`], cluster-scoped provider configuration, usages and
//! connection secrets through [`ClusterStore`]. Tests swap in an in-memory
//! implementation of both.

use crds::{
    ManagedResource, PROVIDER_CONFIG_LABEL, ProviderConfig, ProviderConfigStatus,
    ProviderConfigUsage, Selector,
};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ListParams, ObjectMeta, Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "gitlab-controller";

/// Reads and writes of one managed kind
#[async_trait::async_trait]
pub trait ManagedStore<K: ManagedResource>: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error>;

    /// Objects in `namespace` whose labels match `selector`
    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<K>, kube::Error>;

    /// Merge `annotations` into the stored object's annotations
    async fn update_annotations(
        &self,
        obj: &K,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), kube::Error>;

    /// Replace the finalizer list
    async fn set_finalizers(&self, obj: &K, finalizers: Vec<String>) -> Result<(), kube::Error>;

    /// Persist `obj.spec`
    async fn update_spec(&self, obj: &K) -> Result<(), kube::Error>;

    /// Persist `obj.status`
    async fn update_status(&self, obj: &K) -> Result<(), kube::Error>;
}

/// Cluster-scoped objects and secrets shared by every managed kind
#[async_trait::async_trait]
pub trait ClusterStore: Send + Sync {
    async fn provider_config(&self, name: &str) -> Result<Option<ProviderConfig>, kube::Error>;

    /// Decoded `data` of a Secret, `None` when the Secret does not exist
    async fn secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, kube::Error>;

    /// Create the Secret or set `data` keys on it; other keys are kept
    async fn apply_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, Vec<u8>>,
    ) -> Result<(), kube::Error>;

    /// Create or update a usage record
    async fn apply_usage(&self, usage: &ProviderConfigUsage) -> Result<(), kube::Error>;

    /// Delete a usage record; absent records are not an error
    async fn delete_usage(&self, name: &str) -> Result<(), kube::Error>;

    /// Usage records labelled with `provider_config`
    async fn list_usages(&self, provider_config: &str) -> Result<Vec<ProviderConfigUsage>, kube::Error>;

    async fn update_provider_config_status(
        &self,
        name: &str,
        status: &ProviderConfigStatus,
    ) -> Result<(), kube::Error>;

    async fn set_provider_config_finalizers(
        &self,
        name: &str,
        finalizers: Vec<String>,
    ) -> Result<(), kube::Error>;
}

/// `ManagedStore` backed by the Kubernetes API
pub struct KubeManagedStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeManagedStore<K> {
    /// Store using `client`
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K: ManagedResource> KubeManagedStore<K> {
    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn api_for(&self, obj: &K) -> Api<K> {
        self.api(&obj.namespace().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl<K: ManagedResource> ManagedStore<K> for KubeManagedStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error> {
        self.api(namespace).get_opt(name).await
    }

    async fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<K>, kube::Error> {
        let params = ListParams::default().labels(&selector.label_selector());
        Ok(self.api(namespace).list(&params).await?.items)
    }

    async fn update_annotations(
        &self,
        obj: &K,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), kube::Error> {
        let patch = json!({ "metadata": { "annotations": annotations } });
        self.api_for(obj)
            .patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn set_finalizers(&self, obj: &K, finalizers: Vec<String>) -> Result<(), kube::Error> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        self.api_for(obj)
            .patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn update_spec(&self, obj: &K) -> Result<(), kube::Error> {
        let value = serde_json::to_value(obj).map_err(kube::Error::SerdeError)?;
        let patch = json!({ "spec": value.get("spec") });
        self.api_for(obj)
            .patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn update_status(&self, obj: &K) -> Result<(), kube::Error> {
        let patch = json!({ "status": obj.managed_status() });
        self.api_for(obj)
            .patch_status(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// `ClusterStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterStore {
    client: Client,
}

impl KubeClusterStore {
    /// Cluster store using `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn provider_configs(&self) -> Api<ProviderConfig> {
        Api::all(self.client.clone())
    }

    fn usages(&self) -> Api<ProviderConfigUsage> {
        Api::all(self.client.clone())
    }
}

#[async_trait::async_trait]
impl ClusterStore for KubeClusterStore {
    async fn provider_config(&self, name: &str) -> Result<Option<ProviderConfig>, kube::Error> {
        self.provider_configs().get_opt(name).await
    }

    async fn secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, kube::Error> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_opt(name).await?.map(|secret| {
            secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect()
        }))
    }

    async fn apply_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, Vec<u8>>,
    ) -> Result<(), kube::Error> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                    .collect(),
            ),
            ..Default::default()
        };
        secrets
            .patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&secret),
            )
            .await?;
        Ok(())
    }

    async fn apply_usage(&self, usage: &ProviderConfigUsage) -> Result<(), kube::Error> {
        self.usages()
            .patch(
                &usage.name_any(),
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(usage),
            )
            .await?;
        Ok(())
    }

    async fn delete_usage(&self, name: &str) -> Result<(), kube::Error> {
        match self.usages().delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn list_usages(&self, provider_config: &str) -> Result<Vec<ProviderConfigUsage>, kube::Error> {
        let params =
            ListParams::default().labels(&format!("{}={}", PROVIDER_CONFIG_LABEL, provider_config));
        Ok(self.usages().list(&params).await?.items)
    }

    async fn update_provider_config_status(
        &self,
        name: &str,
        status: &ProviderConfigStatus,
    ) -> Result<(), kube::Error> {
        let patch = json!({ "status": status });
        self.provider_configs()
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn set_provider_config_finalizers(
        &self,
        name: &str,
        finalizers: Vec<String>,
    ) -> Result<(), kube::Error> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        self.provider_configs()
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
