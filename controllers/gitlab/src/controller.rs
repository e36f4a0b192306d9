//! Main controller implementation.
//!
//! Builds the shared [`Context`], spawns one watcher per managed kind plus the
//! ProviderConfig watcher, and runs until a watcher exits or shutdown is
//! requested.

use crate::adapters::Adapter;
use crate::adapters::access_token::AccessTokenAdapter;
use crate::adapters::deploy_key::DeployKeyAdapter;
use crate::adapters::deploy_token::DeployTokenAdapter;
use crate::adapters::file::FileAdapter;
use crate::adapters::group::GroupAdapter;
use crate::adapters::group_member::GroupMemberAdapter;
use crate::adapters::hook::HookAdapter;
use crate::adapters::pipeline_schedule::PipelineScheduleAdapter;
use crate::adapters::project::ProjectAdapter;
use crate::adapters::project_member::ProjectMemberAdapter;
use crate::adapters::user_runner::UserRunnerAdapter;
use crate::adapters::variable::VariableAdapter;
use crate::config::Settings;
use crate::credentials::HttpClientFactory;
use crate::engine::{Context, Engine};
use crate::error::ControllerError;
use crate::store::{KubeClusterStore, KubeManagedStore};
use crate::watcher::{managed_api, watch_managed, watch_provider_configs};
use crds::{Group, Project};
use futures::future::select_all;
use kube::{Client, Resource};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type WatcherHandle = JoinHandle<Result<(), ControllerError>>;

/// Main controller for GitLab resource management.
pub struct Controller {
    watchers: Vec<(String, WatcherHandle)>,
    shutdown: watch::Sender<bool>,
}

impl Controller {
    /// Creates a new controller instance and starts its watchers.
    pub async fn new(settings: Settings) -> Result<Self, ControllerError> {
        info!("Initializing GitLab Controller");

        let client = Client::try_default().await?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let ctx = Arc::new(Context::new(
            Arc::new(KubeClusterStore::new(client.clone())),
            Arc::new(KubeManagedStore::<Group>::new(client.clone())),
            Arc::new(KubeManagedStore::<Project>::new(client.clone())),
            Arc::new(HttpClientFactory),
            settings,
            shutdown_rx,
        ));

        let watchers = vec![
            spawn_managed(&client, &ctx, GroupAdapter),
            spawn_managed(&client, &ctx, GroupMemberAdapter),
            spawn_managed(&client, &ctx, ProjectAdapter),
            spawn_managed(&client, &ctx, ProjectMemberAdapter),
            spawn_managed(&client, &ctx, AccessTokenAdapter),
            spawn_managed(&client, &ctx, DeployTokenAdapter),
            spawn_managed(&client, &ctx, VariableAdapter),
            spawn_managed(&client, &ctx, HookAdapter),
            spawn_managed(&client, &ctx, DeployKeyAdapter),
            spawn_managed(&client, &ctx, PipelineScheduleAdapter),
            spawn_managed(&client, &ctx, FileAdapter),
            spawn_managed(&client, &ctx, UserRunnerAdapter),
            (
                "ProviderConfig".to_string(),
                tokio::spawn(watch_provider_configs(client.clone(), Arc::clone(&ctx))),
            ),
        ];
        info!("Started {} watchers", watchers.len());

        Ok(Self { watchers, shutdown })
    }

    /// Runs until a watcher exits or SIGINT is received.
    pub async fn run(self) -> Result<(), ControllerError> {
        let (names, handles): (Vec<String>, Vec<WatcherHandle>) = self.watchers.into_iter().unzip();

        tokio::select! {
            (result, index, _remaining) = select_all(handles) => {
                let name = names.get(index).map_or("unknown", String::as_str);
                // Stop in-flight ticks of the remaining watchers.
                let _ = self.shutdown.send(true);
                match result {
                    Ok(Ok(())) => {
                        warn!("{} watcher exited", name);
                        Ok(())
                    }
                    Ok(Err(e)) => {
                        error!("{} watcher failed: {}", name, e);
                        Err(e)
                    }
                    Err(e) => {
                        error!("{} watcher panicked: {}", name, e);
                        Err(ControllerError::Watch(format!("{} watcher panicked: {}", name, e)))
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Cannot listen for shutdown signal: {}", e);
                }
                info!("Shutdown requested, canceling in-flight reconciliations");
                let _ = self.shutdown.send(true);
                Ok(())
            }
        }
    }
}

fn spawn_managed<A: Adapter>(client: &Client, ctx: &Arc<Context>, adapter: A) -> (String, WatcherHandle) {
    let kind = A::Kind::kind(&()).to_string();
    let api = managed_api::<A::Kind>(client.clone(), ctx.settings.watch_namespace.as_deref());
    let store = Arc::new(KubeManagedStore::<A::Kind>::new(client.clone()));
    let engine = Arc::new(Engine::new(adapter, store, Arc::clone(ctx)));
    (kind, tokio::spawn(watch_managed(api, engine)))
}
