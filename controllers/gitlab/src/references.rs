//! Cross-resource reference resolution.
//!
//! A field such as `groupId` may be filled from another managed object's
//! external name, picked by `groupIdRef` (name in the same namespace) or
//! `groupIdSelector` (labels, exactly one match). Each resolved field records a
//! fingerprint of the reference it came from in the resolved-references
//! annotation; a field whose value is set and whose fingerprint is unchanged is
//! not resolved again.

use crate::error::ControllerError;
use crate::store::ManagedStore;
use crds::{Group, ManagedResource, Project, RESOLVED_REFERENCES_ANNOTATION, Reference, Selector};
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Fingerprints of resolved references, keyed by field path
pub type Fingerprints = BTreeMap<String, String>;

/// Read the resolved-references annotation; malformed content counts as empty
pub fn fingerprints<K: ManagedResource>(obj: &K) -> Fingerprints {
    obj.annotation(RESOLVED_REFERENCES_ANNOTATION)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}

fn fingerprint(reference: Option<&Reference>, selector: Option<&Selector>) -> Option<String> {
    match (reference, selector) {
        (Some(r), _) => Some(format!("name:{}", r.name)),
        (None, Some(s)) => Some(format!("selector:{}", s.label_selector())),
        (None, None) => None,
    }
}

/// Resolves reference fields of one managed object
pub struct ReferenceResolver {
    groups: Arc<dyn ManagedStore<Group>>,
    projects: Arc<dyn ManagedStore<Project>>,
    namespace: String,
    fingerprints: Fingerprints,
}

impl ReferenceResolver {
    /// Resolver for objects in `namespace`
    pub fn new(
        groups: Arc<dyn ManagedStore<Group>>,
        projects: Arc<dyn ManagedStore<Project>>,
        namespace: impl Into<String>,
        fingerprints: Fingerprints,
    ) -> Self {
        Self {
            groups,
            projects,
            namespace: namespace.into(),
            fingerprints,
        }
    }

    /// Fingerprints after resolution, to be stored back on the object
    pub fn into_fingerprints(self) -> Fingerprints {
        self.fingerprints
    }

    /// Resolve a field referring to a Group
    pub async fn group_id(
        &mut self,
        field: &str,
        value: &mut Option<i64>,
        reference: Option<&Reference>,
        selector: Option<&Selector>,
    ) -> Result<(), ControllerError> {
        let store = Arc::clone(&self.groups);
        self.resolve(store.as_ref(), field, value, reference, selector)
            .await
    }

    /// Resolve a field referring to a Project
    pub async fn project_id(
        &mut self,
        field: &str,
        value: &mut Option<i64>,
        reference: Option<&Reference>,
        selector: Option<&Selector>,
    ) -> Result<(), ControllerError> {
        let store = Arc::clone(&self.projects);
        self.resolve(store.as_ref(), field, value, reference, selector)
            .await
    }

    async fn resolve<K: ManagedResource>(
        &mut self,
        store: &dyn ManagedStore<K>,
        field: &str,
        value: &mut Option<i64>,
        reference: Option<&Reference>,
        selector: Option<&Selector>,
    ) -> Result<(), ControllerError> {
        let Some(current) = fingerprint(reference, selector) else {
            return Ok(());
        };
        if value.is_some() && self.fingerprints.get(field) == Some(&current) {
            return Ok(());
        }

        let target = match reference {
            Some(reference) => store
                .get(&self.namespace, &reference.name)
                .await?
                .ok_or_else(|| ControllerError::ReferenceTargetMissing {
                    field: field.to_string(),
                    message: format!(
                        "{} {}/{} not found",
                        K::kind(&()),
                        self.namespace,
                        reference.name
                    ),
                })?,
            None => {
                let selector = selector.cloned().unwrap_or_default();
                let mut matches = store.list(&self.namespace, &selector).await?;
                matches.retain(|m| selector.matches(m.meta().labels.as_ref()));
                match matches.len() {
                    1 => matches.remove(0),
                    0 => {
                        return Err(ControllerError::ReferenceNotFound {
                            field: field.to_string(),
                            selector: selector.label_selector(),
                        });
                    }
                    count => {
                        return Err(ControllerError::ReferenceAmbiguous {
                            field: field.to_string(),
                            selector: selector.label_selector(),
                            count,
                        });
                    }
                }
            }
        };

        let name = target.meta().name.clone().unwrap_or_default();
        let external_name = target.external_name().ok_or_else(|| {
            ControllerError::ReferenceTargetMissing {
                field: field.to_string(),
                message: format!("{} {} has no external name yet", K::kind(&()), name),
            }
        })?;
        let id = external_name
            .parse::<i64>()
            .map_err(|_| ControllerError::ReferenceTargetMissing {
                field: field.to_string(),
                message: format!(
                    "{} {} external name {:?} is not an integer",
                    K::kind(&()),
                    name,
                    external_name
                ),
            })?;

        debug!("Resolved {} to {} from {} {}", field, id, K::kind(&()), name);
        *value = Some(id);
        self.fingerprints.insert(field.to_string(), current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, group, with_external_name, with_labels};

    fn resolver(groups: &MemoryStore<Group>) -> ReferenceResolver {
        ReferenceResolver::new(
            Arc::new(groups.clone()),
            Arc::new(MemoryStore::<Project>::default()),
            "default",
            Fingerprints::new(),
        )
    }

    #[tokio::test]
    async fn test_resolves_by_name() {
        let groups = MemoryStore::default();
        groups.insert(with_external_name(group("g1", "default"), "77"));

        let mut resolver = resolver(&groups);
        let mut value = None;
        resolver
            .group_id("groupId", &mut value, Some(&Reference::new("g1")), None)
            .await
            .unwrap();

        assert_eq!(value, Some(77));
        assert_eq!(
            resolver.into_fingerprints().get("groupId").map(String::as_str),
            Some("name:g1")
        );
    }

    #[tokio::test]
    async fn test_name_target_without_external_name() {
        let groups = MemoryStore::default();
        groups.insert(group("g1", "default"));

        let mut value = None;
        let err = resolver(&groups)
            .group_id("groupId", &mut value, Some(&Reference::new("g1")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ReferenceTargetMissing { .. }));

        let err = resolver(&groups)
            .group_id("groupId", &mut value, Some(&Reference::new("missing")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ReferenceTargetMissing { .. }));
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_selector_requires_exactly_one_match() {
        let groups = MemoryStore::default();
        groups.insert(with_labels(
            with_external_name(group("a", "default"), "1"),
            &[("team", "platform")],
        ));
        groups.insert(with_labels(
            with_external_name(group("b", "default"), "2"),
            &[("team", "web")],
        ));
        groups.insert(with_labels(
            with_external_name(group("c", "default"), "3"),
            &[("team", "web")],
        ));

        let mut value = None;
        resolver(&groups)
            .group_id(
                "groupId",
                &mut value,
                None,
                Some(&Selector::with_labels([("team", "platform")])),
            )
            .await
            .unwrap();
        assert_eq!(value, Some(1));

        let mut value = None;
        let err = resolver(&groups)
            .group_id(
                "groupId",
                &mut value,
                None,
                Some(&Selector::with_labels([("team", "web")])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ReferenceAmbiguous { count: 2, .. }));

        let err = resolver(&groups)
            .group_id(
                "groupId",
                &mut value,
                None,
                Some(&Selector::with_labels([("team", "none")])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ReferenceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_unchanged_reference_is_not_resolved_again() {
        let groups = MemoryStore::default();
        groups.insert(with_external_name(group("g1", "default"), "77"));

        let mut fingerprints = Fingerprints::new();
        fingerprints.insert("groupId".to_string(), "name:g1".to_string());
        let mut resolver = ReferenceResolver::new(
            Arc::new(groups.clone()),
            Arc::new(MemoryStore::<Project>::default()),
            "default",
            fingerprints,
        );

        let mut value = Some(12);
        resolver
            .group_id("groupId", &mut value, Some(&Reference::new("g1")), None)
            .await
            .unwrap();
        assert_eq!(value, Some(12));
        assert_eq!(groups.reads(), 0);

        // A changed reference is resolved again
        resolver
            .group_id("groupId", &mut value, Some(&Reference::new("g2")), None)
            .await
            .unwrap_err();
    }

    #[tokio::test]
    async fn test_no_reference_leaves_value() {
        let groups = MemoryStore::default();
        let mut value = Some(5);
        resolver(&groups)
            .group_id("groupId", &mut value, None, None)
            .await
            .unwrap();
        assert_eq!(value, Some(5));
    }
}
