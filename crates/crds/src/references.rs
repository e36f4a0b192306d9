//! Cross-resource references for GitLab CRDs
//!
//! A reference-bearing field comes as a triple in `forProvider`:
//! - `groupId`: the resolved scalar value sent to GitLab
//! - `groupIdRef`: points at another managed resource by name (same namespace)
//! - `groupIdSelector`: selects another managed resource by labels
//!
//! At most one of `*Ref` and `*Selector` should be set. When both are present the
//! name reference wins.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to another managed resource by name, in the same namespace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Name of the referenced resource
    pub name: String,
}

impl Reference {
    /// Create a reference to the named resource
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Selects exactly one managed resource by its labels.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    /// Labels the referenced resource must carry
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl Selector {
    /// Selector matching the given label pairs
    pub fn with_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Render as a Kubernetes label selector string (`k1=v1,k2=v2`)
    pub fn label_selector(&self) -> String {
        self.match_labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether a label set satisfies this selector
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.match_labels.iter().all(|(k, v)| {
            labels
                .and_then(|l| l.get(k))
                .is_some_and(|actual| actual == v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_selector_is_sorted() {
        let selector = Selector::with_labels([("team", "platform"), ("env", "prod")]);
        assert_eq!(selector.label_selector(), "env=prod,team=platform");
    }

    #[test]
    fn test_selector_matches() {
        let selector = Selector::with_labels([("team", "platform")]);
        let mut labels = BTreeMap::new();
        assert!(!selector.matches(None));
        assert!(!selector.matches(Some(&labels)));
        labels.insert("team".to_string(), "platform".to_string());
        labels.insert("other".to_string(), "x".to_string());
        assert!(selector.matches(Some(&labels)));
        labels.insert("team".to_string(), "web".to_string());
        assert!(!selector.matches(Some(&labels)));
    }
}
