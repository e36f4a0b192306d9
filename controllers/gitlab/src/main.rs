//! GitLab Controller
//!
//! Reconciles GitLab groups, projects, memberships, tokens, CI variables,
//! hooks, deploy keys, pipeline schedules, repository files and runners from
//! namespaced custom resources.
//!
//! Credentials come from cluster-scoped ProviderConfigs; every managed
//! resource picks one through `spec.providerConfigRef`.

mod adapters;
mod backoff;
mod classify;
mod config;
mod connection;
mod controller;
mod credentials;
mod engine;
mod error;
mod late_init;
mod provider_config;
mod references;
mod store;
mod watcher;

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod test_utils;

use crate::config::Settings;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "gitlab_controller=info,kube_runtime=warn";

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| ControllerError::InvalidConfig("cannot install the rustls crypto provider".to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting GitLab Controller");

    let settings = Settings::from_env()?;
    info!("Configuration:");
    info!(
        "  Namespace: {}",
        settings.watch_namespace.as_deref().unwrap_or("all namespaces")
    );
    info!("  Poll interval: {}s", settings.poll_interval.as_secs());
    info!("  Tick timeout: {}s", settings.tick_timeout.as_secs());
    info!("  Concurrent reconciles per kind: {}", settings.max_concurrent_reconciles);
    info!(
        "  Error backoff: {}s to {}s",
        settings.backoff_min.as_secs(),
        settings.backoff_max.as_secs()
    );

    let controller = Controller::new(settings).await?;
    controller.run().await?;

    Ok(())
}
