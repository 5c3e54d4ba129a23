//! # PackageRevision
//!
//! Immutable, ordinally numbered materialization of one resolved content
//! identity of a `Package`. The controller only ever changes `desiredState`
//! after creation; health is reported by the revision controller.

use crate::crd::condition::{Condition, ConditionStatus, Conditions, TYPE_HEALTHY};
use crate::crd::package::PullPolicy;
use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "PackageRevision",
    group = "pkg.octopilot.io",
    version = "v1",
    status = "PackageRevisionStatus",
    shortname = "pkgrev",
    printcolumn = r#"{"name":"Healthy", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Healthy\")].status"}, {"name":"Revision", "type":"integer", "jsonPath":".spec.revision"}, {"name":"State", "type":"string", "jsonPath":".spec.desiredState"}, {"name":"Image", "type":"string", "jsonPath":".spec.packageImage"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevisionSpec {
    /// Whether this revision should be the installed one
    pub desired_state: RevisionDesiredState,
    /// Ordinal assigned at creation, strictly increasing per package
    pub revision: i64,
    /// Resolved source reference this revision was produced from
    pub package_image: String,
    #[serde(default)]
    pub package_pull_policy: PullPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_pull_secrets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum RevisionDesiredState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevisionStatus {
    #[serde(default)]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: Conditions,
}

impl PackageRevision {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.spec.desired_state == RevisionDesiredState::Active
    }

    /// The revision's Healthy condition, if the revision controller reported one
    #[must_use]
    pub fn health(&self) -> Option<&Condition> {
        self.status.as_ref()?.conditions.get(TYPE_HEALTHY)
    }

    /// Health status, `Unknown` when not yet reported
    #[must_use]
    pub fn health_status(&self) -> ConditionStatus {
        self.health().map_or(ConditionStatus::Unknown, |c| c.status)
    }
}
