//! # Package
//!
//! Desired-state root object. A `Package` names a source artifact (an OCI image
//! reference) and the policies used to turn it into `PackageRevision`s.

use crate::crd::condition::{Condition, Conditions};
use serde::{Deserialize, Serialize};

/// Package Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: pkg.octopilot.io/v1
/// kind: Package
/// metadata:
///   name: platform-ref
///   annotations:
///     pkg.octopilot.io/paused: "false"
/// spec:
///   package: ghcr.io/octopilot/platform-ref:v1.4.0
///   packagePullPolicy: IfNotPresent
///   revisionActivationPolicy: Automatic
///   revisionHistoryLimit: 1
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Package",
    group = "pkg.octopilot.io",
    version = "v1",
    status = "PackageStatus",
    shortname = "pkg",
    printcolumn = r#"{"name":"Installed", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Installed\")].status"}, {"name":"Healthy", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Healthy\")].status"}, {"name":"Package", "type":"string", "jsonPath":".spec.package"}, {"name":"Revision", "type":"string", "jsonPath":".status.currentRevision"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    /// Source artifact reference, e.g. `registry.example.com/org/pkg:v1.0.0`
    pub package: String,
    /// When to re-resolve the source reference
    /// `IfNotPresent` resolves once per reference, `Always` polls the registry
    #[serde(default)]
    pub package_pull_policy: PullPolicy,
    /// Names of `kubernetes.io/dockerconfigjson` secrets used to pull the package
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_pull_secrets: Vec<String>,
    /// Whether a newly resolved revision becomes active automatically
    #[serde(default)]
    pub revision_activation_policy: ActivationPolicy,
    /// Number of non-current revisions to retain
    /// Unset keeps every revision; `0` keeps only the current revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<u32>,
}

/// Package pull policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub enum PullPolicy {
    #[default]
    IfNotPresent,
    Always,
}

/// Revision activation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ActivationPolicy {
    #[default]
    Automatic,
    Manual,
}

/// Status of the Package resource
///
/// Written only by the controller, as a single merge patch per pass.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: Conditions,
    /// Name of the PackageRevision currently treated as the package's revision
    #[serde(default)]
    pub current_revision: Option<String>,
    /// Source reference the current revision was resolved from
    #[serde(default)]
    pub current_identifier: Option<String>,
    /// Rewritten source reference, set only when an ImageConfig rewrote it
    #[serde(default)]
    pub resolved_package: Option<String>,
    /// ImageConfigs that affected the last resolution
    #[serde(default)]
    pub applied_image_config_refs: Vec<ImageConfigRef>,
}

impl PackageStatus {
    /// Compare two statuses ignoring condition transition times
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.conditions.equivalent(&other.conditions)
            && self.current_revision == other.current_revision
            && self.current_identifier == other.current_identifier
            && self.resolved_package == other.resolved_package
            && self.applied_image_config_refs == other.applied_image_config_refs
    }
}

/// Reference to an ImageConfig that was applied while resolving the package source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfigRef {
    /// ImageConfig name
    pub name: String,
    /// What the ImageConfig was used for
    pub reason: ImageConfigReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ImageConfigReason {
    /// The source reference was rewritten
    Rewrite,
    /// A pull secret was contributed
    PullSecret,
}

impl Package {
    /// Whether the pause annotation is set to `"true"`
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(crate::constants::PAUSE_ANNOTATION))
            .is_some_and(|v| v == "true")
    }

    /// Current status, or an empty one
    #[must_use]
    pub fn status_or_default(&self) -> PackageStatus {
        self.status.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn package_with_annotation(value: Option<&str>) -> Package {
        let mut pkg = Package::new(
            "test",
            PackageSpec {
                package: "xpkg.example.com/org/pkg:v1".to_string(),
                package_pull_policy: PullPolicy::default(),
                package_pull_secrets: Vec::new(),
                revision_activation_policy: ActivationPolicy::default(),
                revision_history_limit: None,
            },
        );
        if let Some(value) = value {
            pkg.metadata.annotations = Some(BTreeMap::from([(
                crate::constants::PAUSE_ANNOTATION.to_string(),
                value.to_string(),
            )]));
        }
        pkg
    }

    #[test]
    fn test_pause_annotation() {
        assert!(package_with_annotation(Some("true")).is_paused());
        assert!(!package_with_annotation(Some("false")).is_paused());
        assert!(!package_with_annotation(None).is_paused());
    }

    #[test]
    fn test_spec_defaults() {
        let spec: PackageSpec =
            serde_json::from_value(serde_json::json!({"package": "org/pkg:v1"})).unwrap();
        assert_eq!(spec.package_pull_policy, PullPolicy::IfNotPresent);
        assert_eq!(spec.revision_activation_policy, ActivationPolicy::Automatic);
        assert_eq!(spec.revision_history_limit, None);
        assert!(spec.package_pull_secrets.is_empty());
    }

    #[test]
    fn test_status_none_fields_serialize_as_null() {
        // A merge patch must be able to clear previously set fields
        let value = serde_json::to_value(PackageStatus::default()).unwrap();
        assert!(value["currentRevision"].is_null());
        assert!(value.as_object().unwrap().contains_key("resolvedPackage"));
    }
}
