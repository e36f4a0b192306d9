//! Generic reconciliation loop for managed resources.
//!
//! One [`Engine`] per kind drives a managed object towards its desired state
//! through the kind's [`Adapter`]. A tick runs, in order:
//!
//! 1. deletion handling when the object is being deleted
//! 2. provider config resolution (recording usage) and finalizer
//! 3. reference resolution, persisting resolved parameters
//! 4. the create-pending guard
//! 5. observe, then late-initialize and update, or create
//! 6. `Synced` condition and a single status write when anything changed
//!
//! Ticks are bounded by the tick timeout and abandoned on shutdown.

use crate::adapters::{Adapter, Creation, ObservationOf, Observed};
use crate::backoff::BackoffTracker;
use crate::config::Settings;
use crate::connection::publish;
use crate::credentials::{ClientFactory, resolve_session, usage_name};
use crate::error::ControllerError;
use crate::references::{ReferenceResolver, fingerprints};
use crate::store::{ClusterStore, ManagedStore};
use chrono::Utc;
use crds::{
    CREATE_FAILED_ANNOTATION, CREATE_PENDING_ANNOTATION, CREATE_SUCCEEDED_ANNOTATION, Condition,
    EXTERNAL_NAME_ANNOTATION, Group, MANAGED_FINALIZER, ManagedResource, Project,
    REASON_NOT_FOUND, REASON_REVOKED, RESOLVED_REFERENCES_ANNOTATION, set_condition,
};
use gitlab_client::GitLabClientTrait;
use kube::{Resource, ResourceExt};
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Shared dependencies of every engine
pub struct Context {
    /// Secrets, ProviderConfigs and usages
    pub cluster: Arc<dyn ClusterStore>,
    /// Group objects, for reference resolution
    pub groups: Arc<dyn ManagedStore<Group>>,
    /// Project objects, for reference resolution
    pub projects: Arc<dyn ManagedStore<Project>>,
    /// Builds a GitLab client per session
    pub clients: Arc<dyn ClientFactory>,
    /// Controller settings from the environment
    pub settings: Settings,
    /// Retry delays keyed by [`object_key`]
    pub backoff: BackoffTracker,
    /// Flips to `true` when the controller is shutting down
    pub shutdown: watch::Receiver<bool>,
}

impl Context {
    /// Context with a fresh backoff tracker sized from `settings`
    pub fn new(
        cluster: Arc<dyn ClusterStore>,
        groups: Arc<dyn ManagedStore<Group>>,
        projects: Arc<dyn ManagedStore<Project>>,
        clients: Arc<dyn ClientFactory>,
        settings: Settings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let backoff = BackoffTracker::new(settings.backoff_min, settings.backoff_max);
        Self {
            cluster,
            groups,
            projects,
            clients,
            settings,
            backoff,
            shutdown,
        }
    }
}

/// What a tick did to the external resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Created,
    Updated,
    Unchanged,
    /// Finalization finished; the object is released
    Deleted,
}

/// Summary of one successful tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// What the tick did
    pub action: TickAction,
    /// The external resource exists after the tick
    pub exists: bool,
    /// The external resource matched the desired state when observed
    pub up_to_date: bool,
    /// Unset parameters were filled from the external resource
    pub late_initialized: bool,
}

impl TickOutcome {
    fn new(action: TickAction) -> Self {
        Self {
            action,
            exists: matches!(action, TickAction::Created | TickAction::Updated | TickAction::Unchanged),
            up_to_date: true,
            late_initialized: false,
        }
    }
}

/// `Kind namespace/name`, used in logs and as the backoff key
pub fn object_key<K: ManagedResource>(obj: &K) -> String {
    format!(
        "{} {}/{}",
        K::kind(&()),
        obj.namespace().unwrap_or_default(),
        obj.name_any()
    )
}

/// Reconciles objects of one managed kind
pub struct Engine<A: Adapter> {
    adapter: A,
    store: Arc<dyn ManagedStore<A::Kind>>,
    ctx: Arc<Context>,
}

impl<A: Adapter> Engine<A> {
    /// Engine driving `adapter` over objects read from and written to `store`
    pub fn new(adapter: A, store: Arc<dyn ManagedStore<A::Kind>>, ctx: Arc<Context>) -> Self {
        Self { adapter, store, ctx }
    }

    /// Shared dependencies
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run one tick for `obj`, bounded by the tick timeout and shutdown
    pub async fn reconcile(&self, obj: &A::Kind) -> Result<TickOutcome, ControllerError> {
        let mut shutdown = self.ctx.shutdown.clone();
        if *shutdown.borrow() {
            return Err(ControllerError::Canceled("controller is shutting down".to_string()));
        }
        let shutdown_requested = async move {
            // A dropped sender means nobody can request shutdown any more.
            if shutdown.wait_for(|stop| *stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let timeout = self.ctx.settings.tick_timeout;

        tokio::select! {
            result = self.tick(obj) => result,
            _ = tokio::time::sleep(timeout) => Err(ControllerError::Canceled(format!(
                "{} did not finish within {}s",
                object_key(obj),
                timeout.as_secs()
            ))),
            _ = shutdown_requested => Err(ControllerError::Canceled(
                "controller is shutting down".to_string(),
            )),
        }
    }

    /// Run one tick for an untyped object of this engine's kind
    pub async fn reconcile_dynamic(&self, obj: &DynamicObject) -> Result<TickOutcome, ControllerError> {
        let expected_kind = <A::Kind as kube::Resource>::kind(&());
        let expected_version = <A::Kind as kube::Resource>::api_version(&());
        match obj.types.as_ref() {
            Some(types) if types.kind == expected_kind && types.api_version == expected_version => {}
            other => {
                return Err(ControllerError::NotThisKind {
                    expected: format!("{}/{}", expected_version, expected_kind),
                    actual: other.map_or_else(
                        || "object without type information".to_string(),
                        |t| format!("{}/{}", t.api_version, t.kind),
                    ),
                });
            }
        }
        let typed: A::Kind = serde_json::from_value(serde_json::to_value(obj)?)?;
        self.reconcile(&typed).await
    }

    /// Requeue after a successful tick; resets the error backoff
    pub fn success_action(&self, obj: &A::Kind, outcome: &TickOutcome) -> Action {
        self.ctx.backoff.on_success(&object_key(obj));
        match outcome.action {
            TickAction::Created | TickAction::Updated => Action::requeue(Duration::ZERO),
            TickAction::Unchanged => Action::requeue(self.ctx.settings.poll_interval),
            TickAction::Deleted => Action::await_change(),
        }
    }

    /// Backoff for a failed tick: growing for transient errors, the cap otherwise
    pub fn error_action(&self, key: &str, e: &ControllerError) -> Action {
        if e.is_transient() {
            Action::requeue(self.ctx.backoff.on_error(key))
        } else {
            Action::requeue(self.ctx.backoff.max())
        }
    }

    async fn tick(&self, obj: &A::Kind) -> Result<TickOutcome, ControllerError> {
        let key = object_key(obj);
        let original_status = obj.managed_status().cloned();
        let mut current = obj.clone();

        let result = if current.is_being_deleted() {
            self.finalize(&mut current, &key).await
        } else {
            self.sync(&mut current, &key).await
        };

        if let Ok(TickOutcome {
            action: TickAction::Deleted,
            ..
        }) = result
        {
            return result;
        }

        let synced = match &result {
            Ok(_) => Condition::reconcile_success(),
            Err(e) => {
                warn!("Reconciliation of {} failed: {}", key, e);
                Condition::reconcile_error(e.reason(), e.to_string())
            }
        };
        set_condition(&mut current.managed_status_mut().conditions, synced);

        if current.managed_status() != original_status.as_ref() {
            if let Err(e) = self.store.update_status(&current).await {
                if result.is_ok() {
                    return Err(ControllerError::KubeUpdateFailed(e));
                }
                warn!("Could not record status of {}: {}", key, e);
            }
        } else {
            debug!("Status of {} unchanged", key);
        }
        result
    }

    async fn finalize(&self, obj: &mut A::Kind, key: &str) -> Result<TickOutcome, ControllerError> {
        if !obj.has_finalizer(MANAGED_FINALIZER) {
            return Ok(TickOutcome::new(TickAction::Deleted));
        }
        set_condition(&mut obj.managed_status_mut().conditions, Condition::deleting());

        let policy = obj.management_policy();
        match obj.external_name().map(str::to_string) {
            Some(external_name) if policy.can_delete() => {
                let session = resolve_session(self.ctx.cluster.as_ref(), obj, false).await?;
                let client = self.ctx.clients.client(&session)?;
                self.adapter
                    .delete(client.as_ref(), &external_name, obj)
                    .await?;
                info!("Deleted external resource {} of {}", external_name, key);
            }
            Some(external_name) => {
                info!(
                    "Management policy {:?} orphans external resource {} of {}",
                    policy, external_name, key
                );
            }
            None => debug!("{} was never bound to an external resource", key),
        }

        self.ctx
            .cluster
            .delete_usage(&usage_name(obj))
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;

        let finalizers: Vec<String> = obj
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != MANAGED_FINALIZER)
            .cloned()
            .collect();
        self.store
            .set_finalizers(obj, finalizers.clone())
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;
        obj.meta_mut().finalizers = Some(finalizers);
        info!("Released finalizer of {}", key);
        Ok(TickOutcome::new(TickAction::Deleted))
    }

    async fn sync(&self, obj: &mut A::Kind, key: &str) -> Result<TickOutcome, ControllerError> {
        let session = resolve_session(self.ctx.cluster.as_ref(), obj, true).await?;

        if !obj.has_finalizer(MANAGED_FINALIZER) {
            let mut finalizers = obj.finalizers().to_vec();
            finalizers.push(MANAGED_FINALIZER.to_string());
            self.store
                .set_finalizers(obj, finalizers.clone())
                .await
                .map_err(ControllerError::KubeUpdateFailed)?;
            obj.meta_mut().finalizers = Some(finalizers);
        }

        self.resolve_references(obj).await?;

        let default_name = self.adapter.default_external_name(obj);
        let bound_name = obj.external_name().map(str::to_string);
        if bound_name.is_none()
            && default_name.is_none()
            && obj.annotation(CREATE_PENDING_ANNOTATION).is_some()
            && obj.annotation(CREATE_SUCCEEDED_ANNOTATION).is_none()
            && obj.annotation(CREATE_FAILED_ANNOTATION).is_none()
        {
            return Err(ControllerError::BindingLost(format!(
                "a create of {} started at {} has no recorded outcome",
                key,
                obj.annotation(CREATE_PENDING_ANNOTATION).unwrap_or_default()
            )));
        }

        let client = self.ctx.clients.client(&session)?;
        let mut effective = obj.clone();
        self.adapter
            .prepare(client.as_ref(), effective.parameters_mut())
            .await?;

        let external_name = bound_name.clone().or(default_name);
        let observed = match external_name.as_deref() {
            Some(name) => self.adapter.observe(client.as_ref(), name, &effective).await?,
            None => Observed::Absent,
        };

        match (observed, external_name) {
            (Observed::Exists(remote), Some(name)) => {
                self.sync_existing(obj, effective, client.as_ref(), key, &name, bound_name.is_none(), remote)
                    .await
            }
            (Observed::Revoked(remote), _) => {
                let observation = self.adapter.observation(&remote);
                obj.managed_status_mut().at_provider = Some(observation);
                self.create(obj, &effective, client.as_ref(), key, REASON_REVOKED).await
            }
            _ => self.create(obj, &effective, client.as_ref(), key, REASON_NOT_FOUND).await,
        }
    }

    /// Fill reference fields and persist what changed
    async fn resolve_references(&self, obj: &mut A::Kind) -> Result<(), ControllerError> {
        let previous = fingerprints(obj);
        let mut resolver = ReferenceResolver::new(
            Arc::clone(&self.ctx.groups),
            Arc::clone(&self.ctx.projects),
            obj.namespace().unwrap_or_default(),
            previous.clone(),
        );
        let mut params = obj.parameters().clone();
        self.adapter
            .resolve_references(&mut resolver, &mut params)
            .await?;

        if &params != obj.parameters() {
            *obj.parameters_mut() = params;
            self.store
                .update_spec(obj)
                .await
                .map_err(ControllerError::KubeUpdateFailed)?;
        }
        let resolved = resolver.into_fingerprints();
        if resolved != previous {
            let raw = serde_json::to_string(&resolved)?;
            self.annotate(obj, &[(RESOLVED_REFERENCES_ANNOTATION, raw)])
                .await
                .map_err(ControllerError::KubeUpdateFailed)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn sync_existing(
        &self,
        obj: &mut A::Kind,
        mut effective: A::Kind,
        client: &dyn GitLabClientTrait,
        key: &str,
        external_name: &str,
        bind_default: bool,
        remote: A::Remote,
    ) -> Result<TickOutcome, ControllerError> {
        {
            let status = obj.managed_status_mut();
            status.at_provider = Some(self.adapter.observation(&remote));
            set_condition(&mut status.conditions, Condition::available());
        }

        let late_initialized = self.adapter.late_initialize(obj.parameters_mut(), &remote);
        if late_initialized {
            self.adapter
                .late_initialize(effective.parameters_mut(), &remote);
            self.store
                .update_spec(obj)
                .await
                .map_err(ControllerError::KubeUpdateFailed)?;
            info!("Late-initialized unset parameters of {}", key);
        }

        if bind_default {
            self.annotate(obj, &[(EXTERNAL_NAME_ANNOTATION, external_name.to_string())])
                .await
                .map_err(ControllerError::KubeUpdateFailed)?;
            info!("Bound {} to existing external resource {}", key, external_name);
        }

        let up_to_date = self.adapter.is_up_to_date(effective.parameters(), &remote);
        let action = if up_to_date {
            TickAction::Unchanged
        } else if !obj.management_policy().can_update() {
            debug!(
                "{} differs from its external resource; management policy {:?} forbids updates",
                key,
                obj.management_policy()
            );
            TickAction::Unchanged
        } else {
            self.adapter
                .update(client, external_name, &effective, &remote)
                .await?;
            info!("Updated external resource {} of {}", external_name, key);
            TickAction::Updated
        };

        Ok(TickOutcome {
            action,
            exists: true,
            up_to_date,
            late_initialized,
        })
    }

    async fn create(
        &self,
        obj: &mut A::Kind,
        effective: &A::Kind,
        client: &dyn GitLabClientTrait,
        key: &str,
        reason: &str,
    ) -> Result<TickOutcome, ControllerError> {
        let policy = obj.management_policy();
        if !policy.can_create() {
            let message = if reason == REASON_REVOKED {
                "external resource was revoked"
            } else {
                "external resource does not exist"
            };
            debug!("{}: {}; management policy {:?} forbids creating it", key, message, policy);
            set_condition(
                &mut obj.managed_status_mut().conditions,
                Condition::unavailable(reason, message),
            );
            return Ok(TickOutcome {
                action: TickAction::Unchanged,
                exists: false,
                up_to_date: false,
                late_initialized: false,
            });
        }

        set_condition(&mut obj.managed_status_mut().conditions, Condition::creating());
        self.annotate(
            obj,
            &[
                (CREATE_PENDING_ANNOTATION, Utc::now().to_rfc3339()),
                (CREATE_FAILED_ANNOTATION, String::new()),
            ],
        )
        .await
        .map_err(ControllerError::KubeUpdateFailed)?;

        let Creation {
            external_name,
            connection_details,
            observation,
        } = match self.adapter.create(client, effective).await {
            Ok(creation) => creation,
            Err(e) => {
                if let Err(annotate_err) = self
                    .annotate(obj, &[(CREATE_FAILED_ANNOTATION, Utc::now().to_rfc3339())])
                    .await
                {
                    warn!("Could not record failed create of {}: {}", key, annotate_err);
                }
                return Err(e);
            }
        };

        let binding = [
            (EXTERNAL_NAME_ANNOTATION, external_name.clone()),
            (CREATE_SUCCEEDED_ANNOTATION, Utc::now().to_rfc3339()),
        ];
        if let Err(e) = self.annotate(obj, &binding).await {
            error!(
                "Created external resource {} for {} but could not record it: {}",
                external_name, key, e
            );
            return Err(ControllerError::BindingLost(format!(
                "{} was created as {} but the binding write failed: {}",
                key, external_name, e
            )));
        }
        info!("Created external resource {} for {}", external_name, key);

        self.record_creation(obj, observation);
        publish(self.ctx.cluster.as_ref(), obj, &connection_details).await?;

        Ok(TickOutcome {
            action: TickAction::Created,
            exists: true,
            up_to_date: true,
            late_initialized: false,
        })
    }

    fn record_creation(&self, obj: &mut A::Kind, observation: Option<ObservationOf<A::Kind>>) {
        let status = obj.managed_status_mut();
        if observation.is_some() {
            status.at_provider = observation;
        }
        set_condition(&mut status.conditions, Condition::available());
    }

    /// Merge annotations on the stored object and mirror them locally
    async fn annotate(&self, obj: &mut A::Kind, values: &[(&str, String)]) -> Result<(), kube::Error> {
        let annotations: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        self.store.update_annotations(obj, &annotations).await?;
        obj.annotations_mut().extend(annotations);
        Ok(())
    }
}
