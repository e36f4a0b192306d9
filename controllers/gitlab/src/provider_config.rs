//! ProviderConfig usage tracking.
//!
//! Managed resources record a ProviderConfigUsage while they use a
//! ProviderConfig. This reconciler counts those usages into `status.users` and
//! holds the in-use finalizer while the count is non-zero, so a ProviderConfig
//! cannot disappear from under the resources that need it.

use crate::error::ControllerError;
use crate::store::ClusterStore;
use crds::{IN_USE_FINALIZER, ProviderConfig, ProviderConfigStatus};
use kube::ResourceExt;
use tracing::{debug, info};

/// Bring `status.users` and the in-use finalizer in line with recorded usages.
///
/// Returns the number of users.
pub async fn reconcile_provider_config(
    cluster: &dyn ClusterStore,
    config: &ProviderConfig,
) -> Result<i64, ControllerError> {
    let name = config.name_any();
    let users = i64::try_from(cluster.list_usages(&name).await?.len()).unwrap_or(i64::MAX);

    let current = config.status.clone().unwrap_or_default();
    if current.users != users {
        let status = ProviderConfigStatus {
            users,
            ..current
        };
        cluster
            .update_provider_config_status(&name, &status)
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;
        debug!("ProviderConfig {} has {} users", name, users);
    }

    let held = config.finalizers().iter().any(|f| f == IN_USE_FINALIZER);
    if users > 0 && !held {
        let mut finalizers = config.finalizers().to_vec();
        finalizers.push(IN_USE_FINALIZER.to_string());
        cluster
            .set_provider_config_finalizers(&name, finalizers)
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;
    } else if users == 0 && held {
        let finalizers = config
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != IN_USE_FINALIZER)
            .cloned()
            .collect();
        cluster
            .set_provider_config_finalizers(&name, finalizers)
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;
        if config.metadata.deletion_timestamp.is_some() {
            info!("ProviderConfig {} is no longer in use and can be deleted", name);
        }
    } else if users > 0 && config.metadata.deletion_timestamp.is_some() {
        info!(
            "ProviderConfig {} is being deleted but still has {} users",
            name, users
        );
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::usage_for;
    use crate::test_utils::{MemoryCluster, group, provider_config};
    use crds::AuthMethod;

    #[tokio::test]
    async fn test_users_hold_finalizer() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::PersonalAccessToken));
        cluster.add_usage(usage_for(&group("a", "default"), "default"));
        cluster.add_usage(usage_for(&group("b", "default"), "default"));
        cluster.add_usage(usage_for(&group("c", "other"), "other"));

        let config = cluster.stored_provider_config("default").unwrap();
        assert_eq!(reconcile_provider_config(&cluster, &config).await.unwrap(), 2);

        let stored = cluster.stored_provider_config("default").unwrap();
        assert_eq!(stored.status.as_ref().map(|s| s.users), Some(2));
        assert_eq!(stored.finalizers(), [IN_USE_FINALIZER.to_string()]);
    }

    #[tokio::test]
    async fn test_finalizer_released_without_users() {
        let cluster = MemoryCluster::default();
        let mut config = provider_config("default", AuthMethod::PersonalAccessToken);
        config.metadata.finalizers = Some(vec![IN_USE_FINALIZER.to_string()]);
        config.status = Some(ProviderConfigStatus {
            users: 1,
            conditions: Vec::new(),
        });
        cluster.add_provider_config(config.clone());

        assert_eq!(reconcile_provider_config(&cluster, &config).await.unwrap(), 0);
        let stored = cluster.stored_provider_config("default").unwrap();
        assert!(stored.finalizers().is_empty());
        assert_eq!(stored.status.as_ref().map(|s| s.users), Some(0));
    }
}
