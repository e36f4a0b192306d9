//! Kubernetes resource watchers.
//!
//! Every managed kind gets its own `kube_runtime::Controller` driving an
//! [`Engine`]. ProviderConfigs are watched together with their usages, so a
//! usage change recounts the ProviderConfig it names.

use crate::adapters::Adapter;
use crate::engine::{Context, Engine, object_key};
use crate::error::ControllerError;
use crate::provider_config::reconcile_provider_config;
use crds::{ProviderConfig, ProviderConfigUsage};
use futures::StreamExt;
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Watched objects of one kind: one namespace or the whole cluster
pub fn managed_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

fn controller_config(ctx: &Context) -> ControllerConfig {
    ControllerConfig::default()
        .debounce(ctx.settings.debounce)
        .concurrency(ctx.settings.max_concurrent_reconciles)
}

/// Watch one managed kind until the stream ends
pub async fn watch_managed<A: Adapter>(
    api: Api<A::Kind>,
    engine: Arc<Engine<A>>,
) -> Result<(), ControllerError> {
    let kind = A::Kind::kind(&()).to_string();
    info!("Starting {} watcher", kind);

    let reconcile = |obj: Arc<A::Kind>, engine: Arc<Engine<A>>| async move {
        debug!("Reconciling {}", object_key(obj.as_ref()));
        let outcome = engine.reconcile(&obj).await?;
        debug!("{}: {:?}", object_key(obj.as_ref()), outcome);
        Ok::<_, ControllerError>(engine.success_action(&obj, &outcome))
    };

    let error_policy = |obj: Arc<A::Kind>, error: &ControllerError, engine: Arc<Engine<A>>| {
        let key = object_key(obj.as_ref());
        error!("Reconciliation of {} failed: {}", key, error);
        engine.error_action(&key, error)
    };

    let config = controller_config(engine.context());
    Controller::new(api, watcher::Config::default())
        .with_config(config)
        .run(reconcile, error_policy, engine)
        .for_each(|res| {
            let kind = kind.clone();
            async move {
                if let Err(e) = res {
                    debug!("{} controller: {}", kind, e);
                }
            }
        })
        .await;

    info!("{} watcher stopped", kind);
    Ok(())
}

/// Watch ProviderConfigs and the usages referring to them
pub async fn watch_provider_configs(client: Client, ctx: Arc<Context>) -> Result<(), ControllerError> {
    info!("Starting ProviderConfig watcher");
    let configs: Api<ProviderConfig> = Api::all(client.clone());
    let usages: Api<ProviderConfigUsage> = Api::all(client);

    let reconcile = |config: Arc<ProviderConfig>, ctx: Arc<Context>| async move {
        let users = reconcile_provider_config(ctx.cluster.as_ref(), &config).await?;
        debug!("ProviderConfig {} has {} users", config.name_any(), users);
        Ok::<_, ControllerError>(Action::requeue(ctx.settings.poll_interval))
    };

    let error_policy = |config: Arc<ProviderConfig>, error: &ControllerError, ctx: Arc<Context>| {
        let key = format!("ProviderConfig {}", config.name_any());
        error!("Reconciliation of {} failed: {}", key, error);
        Action::requeue(ctx.backoff.on_error(&key))
    };

    let config = controller_config(&ctx);
    Controller::new(configs, watcher::Config::default())
        .watches(usages, watcher::Config::default(), |usage: ProviderConfigUsage| {
            Some(ObjectRef::new(&usage.spec.provider_config_ref.name))
        })
        .with_config(config)
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            if let Err(e) = res {
                debug!("ProviderConfig controller: {}", e);
            }
        })
        .await;

    info!("ProviderConfig watcher stopped");
    Ok(())
}
