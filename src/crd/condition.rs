//! # Conditions
//!
//! Typed status conditions shared by `Package` and `PackageRevision`.
//!
//! On the wire conditions are a list (the Kubernetes convention). In memory they
//! are held in [`Conditions`], a map keyed by condition type, so setting a
//! condition always replaces the previous one of the same type.
//!
//! Change detection ([`Condition::equivalent`]) ignores `lastTransitionTime`.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Condition type reporting whether the package revision is installed
pub const TYPE_INSTALLED: &str = "Installed";
/// Condition type reporting the health of the current revision
pub const TYPE_HEALTHY: &str = "Healthy";
/// Condition type reporting whether reconciliation is running
pub const TYPE_SYNCED: &str = "Synced";

pub const REASON_ACTIVE: &str = "ActivePackageRevision";
pub const REASON_INACTIVE: &str = "InactivePackageRevision";
pub const REASON_UNPACKING: &str = "UnpackingPackage";
pub const REASON_HEALTHY: &str = "HealthyPackageRevision";
pub const REASON_UNHEALTHY: &str = "UnhealthyPackageRevision";
pub const REASON_RECONCILE_PAUSED: &str = "ReconcilePaused";

/// Status of a condition (True, False, Unknown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Condition represents one observation about a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition
    pub status: ConditionStatus,
    /// Machine-readable reason for the condition's last transition
    #[serde(default)]
    pub reason: String,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Last transition time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    fn new(r#type: &str, status: ConditionStatus, reason: &str) -> Self {
        Self {
            r#type: r#type.to_string(),
            status,
            reason: reason.to_string(),
            message: None,
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Attach a message to the condition
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The package's current revision is active.
    #[must_use]
    pub fn active() -> Self {
        Self::new(TYPE_INSTALLED, ConditionStatus::True, REASON_ACTIVE)
    }

    /// The package's current revision is inactive.
    #[must_use]
    pub fn inactive() -> Self {
        Self::new(TYPE_INSTALLED, ConditionStatus::False, REASON_INACTIVE)
            .with_message("Package is inactive")
    }

    /// The package could not be unpacked; the message carries the cause.
    #[must_use]
    pub fn unpacking(cause: &impl fmt::Display) -> Self {
        Self::new(TYPE_INSTALLED, ConditionStatus::False, REASON_UNPACKING)
            .with_message(cause.to_string())
    }

    #[must_use]
    pub fn healthy() -> Self {
        Self::new(TYPE_HEALTHY, ConditionStatus::True, REASON_HEALTHY)
    }

    #[must_use]
    pub fn unhealthy() -> Self {
        Self::new(TYPE_HEALTHY, ConditionStatus::False, REASON_UNHEALTHY)
    }

    #[must_use]
    pub fn reconcile_paused() -> Self {
        Self::new(TYPE_SYNCED, ConditionStatus::False, REASON_RECONCILE_PAUSED)
    }

    /// Compare two conditions ignoring `lastTransitionTime`
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Condition set keyed by condition type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(BTreeMap<String, Condition>);

impl Conditions {
    /// Set a condition, replacing any prior condition of the same type.
    ///
    /// If the existing condition is equivalent the existing one (and its
    /// transition time) is kept.
    pub fn set(&mut self, condition: Condition) {
        if let Some(existing) = self.0.get(&condition.r#type) {
            if existing.equivalent(&condition) {
                return;
            }
        }
        self.0.insert(condition.r#type.clone(), condition);
    }

    #[must_use]
    pub fn get(&self, r#type: &str) -> Option<&Condition> {
        self.0.get(r#type)
    }

    /// Remove a condition by type, returning it if present
    pub fn remove(&mut self, r#type: &str) -> Option<Condition> {
        self.0.remove(r#type)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.values()
    }

    /// Compare two condition sets ignoring transition times
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|(t, c)| other.0.get(t).is_some_and(|o| o.equivalent(c)))
    }
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut conditions = Self::default();
        for condition in iter {
            conditions.0.insert(condition.r#type.clone(), condition);
        }
        conditions
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Option::<Vec<Condition>>::deserialize(deserializer)?;
        Ok(list.unwrap_or_default().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_by_type() {
        let mut conditions = Conditions::default();
        conditions.set(Condition::unpacking(&"boom"));
        conditions.set(Condition::active());
        conditions.set(Condition::healthy());

        assert_eq!(conditions.len(), 2);
        let installed = conditions.get(TYPE_INSTALLED).unwrap();
        assert_eq!(installed.reason, REASON_ACTIVE);
        assert_eq!(installed.status, ConditionStatus::True);
    }

    #[test]
    fn test_set_keeps_transition_time_when_equivalent() {
        let mut original = Condition::active();
        original.last_transition_time = Some("2020-01-01T00:00:00+00:00".to_string());
        let mut conditions = Conditions::default();
        conditions.set(original);

        conditions.set(Condition::active());

        assert_eq!(
            conditions
                .get(TYPE_INSTALLED)
                .unwrap()
                .last_transition_time
                .as_deref(),
            Some("2020-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_equivalent_ignores_time() {
        let mut a = Condition::unhealthy().with_message("x");
        let mut b = Condition::unhealthy().with_message("x");
        a.last_transition_time = Some("a".to_string());
        b.last_transition_time = Some("b".to_string());
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&Condition::unhealthy().with_message("y")));
    }

    #[test]
    fn test_serializes_as_list() {
        let mut conditions = Conditions::default();
        conditions.set(Condition::reconcile_paused());
        let value = serde_json::to_value(&conditions).unwrap();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["type"], "Synced");
        assert_eq!(list[0]["status"], "False");
        assert_eq!(list[0]["reason"], "ReconcilePaused");
    }

    #[test]
    fn test_deserializes_null_as_empty() {
        let conditions: Conditions = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_inactive_carries_message() {
        let condition = Condition::inactive();
        assert_eq!(condition.message.as_deref(), Some("Package is inactive"));
        assert_eq!(condition.status, ConditionStatus::False);
    }
}
