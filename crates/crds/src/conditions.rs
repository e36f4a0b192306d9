//! Status conditions shared by all managed resources
//!
//! Two condition types are maintained:
//! - `Ready`: whether the external resource exists and is usable
//! - `Synced`: whether the most recent reconciliation completed without error

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reason used when the external resource was observed and is available
pub const REASON_AVAILABLE: &str = "Available";
/// Reason used while the external resource is being created
pub const REASON_CREATING: &str = "Creating";
/// Reason used while the external resource is being deleted
pub const REASON_DELETING: &str = "Deleting";
/// Reason used when a token was revoked and may not be re-created
pub const REASON_REVOKED: &str = "Revoked";
/// Reason used when the external resource is missing and may not be created
pub const REASON_NOT_FOUND: &str = "NotFound";
/// Reason used when the last reconciliation succeeded
pub const REASON_RECONCILE_SUCCESS: &str = "ReconcileSuccess";

/// Condition type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionType {
    Ready,
    Synced,
}

/// Condition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A single status condition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (Ready or Synced)
    #[serde(rename = "type")]
    pub type_: ConditionType,

    /// True, False or Unknown
    pub status: ConditionStatus,

    /// Machine-readable reason for the current status
    pub reason: String,

    /// Human-readable diagnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition changed status, reason or message
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(type_: ConditionType, status: ConditionStatus, reason: &str, message: Option<String>) -> Self {
        Self {
            type_,
            status,
            reason: reason.to_string(),
            message,
            last_transition_time: Utc::now(),
        }
    }

    /// Ready=True: the external resource was observed
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, REASON_AVAILABLE, None)
    }

    /// Ready=False while creating
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, REASON_CREATING, None)
    }

    /// Ready=False while deleting
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, REASON_DELETING, None)
    }

    /// Ready=False with an arbitrary reason
    pub fn unavailable(reason: &str, message: impl Into<String>) -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, reason, Some(message.into()))
    }

    /// Synced=True
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::True, REASON_RECONCILE_SUCCESS, None)
    }

    /// Synced=False with the error kind as reason
    pub fn reconcile_error(reason: &str, message: impl Into<String>) -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::False, reason, Some(message.into()))
    }

    /// Equal ignoring the transition time
    pub fn same_state(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Set a condition, replacing any existing condition of the same type.
///
/// The existing transition time is kept when nothing but the time changed, so
/// that repeated reconciliations produce identical status.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) if existing.same_state(&condition) => {}
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}

/// Find a condition by type
pub fn get_condition(conditions: &[Condition], type_: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}
