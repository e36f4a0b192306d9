//! Connection detail publishing.
//!
//! Secrets returned by a create call (tokens) are written to the Secret named
//! by `spec.writeConnectionSecretToRef`. They never appear in status or logs.

use crate::error::ControllerError;
use crate::store::ClusterStore;
use crds::ManagedResource;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Sensitive values produced by a create call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionDetails(BTreeMap<String, Vec<u8>>);

impl ConnectionDetails {
    /// No details
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, replacing any previous value
    pub fn insert(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Raw bytes stored under `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// No details to publish
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys and values as written to the Secret's `data`
    pub fn as_map(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.0
    }
}

impl fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Write `details` to the object's connection secret.
///
/// Returns whether a write happened: nothing is written when no secret is
/// configured, when there is nothing to publish, or when every key already
/// holds the same value.
pub async fn publish<K: ManagedResource>(
    cluster: &dyn ClusterStore,
    obj: &K,
    details: &ConnectionDetails,
) -> Result<bool, ControllerError> {
    let Some(target) = obj.resource_spec().write_connection_secret_to_ref.as_ref() else {
        return Ok(false);
    };
    if details.is_empty() {
        return Ok(false);
    }
    let namespace = target
        .namespace
        .clone()
        .or_else(|| obj.namespace())
        .unwrap_or_else(|| "default".to_string());

    let existing = cluster
        .secret_data(&namespace, &target.name)
        .await
        .map_err(ControllerError::PublishFailed)?
        .unwrap_or_default();
    let unchanged = details
        .as_map()
        .iter()
        .all(|(k, v)| existing.get(k) == Some(v));
    if unchanged {
        debug!("Connection secret {}/{} already up to date", namespace, target.name);
        return Ok(false);
    }

    cluster
        .apply_secret(&namespace, &target.name, details.as_map())
        .await
        .map_err(ControllerError::PublishFailed)?;
    info!(
        "Published connection details {:?} to {}/{}",
        details, namespace, target.name
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryCluster, group};
    use crds::SecretReference;

    fn with_secret(name: &str, namespace: Option<&str>) -> crds::Group {
        let mut obj = group("team", "default");
        obj.spec.resource_spec.write_connection_secret_to_ref = Some(SecretReference {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });
        obj
    }

    #[test]
    fn test_debug_shows_keys_only() {
        let details = ConnectionDetails::new().with("token", "glpat-secret");
        let rendered = format!("{:?}", details);
        assert!(rendered.contains("token"));
        assert!(!rendered.contains("glpat-secret"));
    }

    #[tokio::test]
    async fn test_publish_defaults_to_object_namespace() {
        let cluster = MemoryCluster::default();
        let details = ConnectionDetails::new().with("runnersToken", "abc");

        assert!(publish(&cluster, &with_secret("conn", None), &details).await.unwrap());
        let data = cluster.secret("default", "conn").unwrap();
        assert_eq!(data.get("runnersToken").map(Vec::as_slice), Some(b"abc".as_slice()));
    }

    #[tokio::test]
    async fn test_publish_skips_unchanged_values() {
        let cluster = MemoryCluster::default();
        let obj = with_secret("conn", Some("secrets"));
        let details = ConnectionDetails::new().with("token", "t1");

        assert!(publish(&cluster, &obj, &details).await.unwrap());
        assert!(!publish(&cluster, &obj, &details).await.unwrap());
        assert_eq!(cluster.secret_writes(), 1);

        let rotated = ConnectionDetails::new().with("token", "t2");
        assert!(publish(&cluster, &obj, &rotated).await.unwrap());
        assert_eq!(cluster.secret_writes(), 2);
    }

    #[tokio::test]
    async fn test_nothing_to_publish() {
        let cluster = MemoryCluster::default();
        let details = ConnectionDetails::new().with("token", "t1");

        assert!(!publish(&cluster, &group("team", "default"), &details).await.unwrap());
        assert!(!publish(&cluster, &with_secret("conn", None), &ConnectionDetails::new())
            .await
            .unwrap());
        assert_eq!(cluster.secret_writes(), 0);
    }
}
