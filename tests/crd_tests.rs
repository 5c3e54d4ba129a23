//! # CRD Tests
//!
//! Sample resources deserialize with the expected defaults and the generated
//! CRDs carry the expected names and scope.

use kube::core::CustomResourceExt;
use package_manager_controller::crd::condition::{TYPE_HEALTHY, TYPE_INSTALLED};
use package_manager_controller::crd::{
    ActivationPolicy, ConditionStatus, ImageConfig, ImageConfigReason, Package, PackageRevision,
    PullPolicy, RevisionDesiredState,
};

#[test]
fn test_package_defaults() {
    let yaml = r#"
apiVersion: pkg.octopilot.io/v1
kind: Package
metadata:
  name: platform-ref
spec:
  package: ghcr.io/octopilot/platform-ref:v1.4.0
"#;
    let package: Package = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(package.spec.package_pull_policy, PullPolicy::IfNotPresent);
    assert_eq!(
        package.spec.revision_activation_policy,
        ActivationPolicy::Automatic
    );
    assert_eq!(package.spec.revision_history_limit, None);
    assert!(package.spec.package_pull_secrets.is_empty());
    assert!(!package.is_paused());
}

#[test]
fn test_package_with_status() {
    let yaml = r#"
apiVersion: pkg.octopilot.io/v1
kind: Package
metadata:
  name: platform-ref
  annotations:
    pkg.octopilot.io/paused: "true"
spec:
  package: ghcr.io/octopilot/platform-ref:v1.4.0
  packagePullPolicy: Always
  packagePullSecrets: [ghcr-credentials]
  revisionActivationPolicy: Manual
  revisionHistoryLimit: 0
status:
  currentRevision: platform-ref-e3b0c44298fc
  currentIdentifier: mirror.internal/octopilot/platform-ref:v1.4.0
  resolvedPackage: mirror.internal/octopilot/platform-ref:v1.4.0
  appliedImageConfigRefs:
    - name: mirror
      reason: Rewrite
  conditions:
    - type: Installed
      status: "True"
      reason: ActivePackageRevision
      lastTransitionTime: "2026-01-01T00:00:00Z"
    - type: Healthy
      status: "False"
      reason: UnhealthyPackageRevision
      message: Package revision health is "False"
"#;
    let package: Package = serde_yaml::from_str(yaml).unwrap();
    assert!(package.is_paused());
    assert_eq!(package.spec.revision_history_limit, Some(0));

    let status = package.status_or_default();
    assert_eq!(status.conditions.len(), 2);
    assert_eq!(
        status.conditions.get(TYPE_INSTALLED).unwrap().status,
        ConditionStatus::True
    );
    assert_eq!(
        status.conditions.get(TYPE_HEALTHY).unwrap().status,
        ConditionStatus::False
    );
    assert_eq!(
        status.applied_image_config_refs[0].reason,
        ImageConfigReason::Rewrite
    );
}

#[test]
fn test_status_conditions_serialize_as_list() {
    let yaml = r#"
apiVersion: pkg.octopilot.io/v1
kind: Package
metadata:
  name: p
spec:
  package: ghcr.io/org/p:v1
status:
  conditions:
    - type: Installed
      status: "False"
      reason: InactivePackageRevision
      message: Package is inactive
"#;
    let package: Package = serde_yaml::from_str(yaml).unwrap();
    let json = serde_json::to_value(package.status.unwrap()).unwrap();
    assert!(json["conditions"].is_array());
    assert_eq!(json["conditions"][0]["type"], "Installed");
    assert_eq!(json["conditions"][0]["reason"], "InactivePackageRevision");
}

#[test]
fn test_revision_from_yaml() {
    let yaml = r#"
apiVersion: pkg.octopilot.io/v1
kind: PackageRevision
metadata:
  name: platform-ref-e3b0c44298fc
  labels:
    pkg.octopilot.io/owner: platform-ref
spec:
  desiredState: Active
  revision: 3
  packageImage: ghcr.io/octopilot/platform-ref:v1.4.0
"#;
    let revision: PackageRevision = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(revision.spec.desired_state, RevisionDesiredState::Active);
    assert_eq!(revision.spec.revision, 3);
    assert!(revision.is_active());
    assert_eq!(revision.health_status(), ConditionStatus::Unknown);
}

#[test]
fn test_generated_crds_are_cluster_scoped() {
    for crd in [Package::crd(), PackageRevision::crd(), ImageConfig::crd()] {
        assert_eq!(crd.spec.group, "pkg.octopilot.io");
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(crd.spec.versions[0].name, "v1");
    }
    assert_eq!(Package::crd().spec.names.plural, "packages");
    assert_eq!(PackageRevision::crd().spec.names.plural, "packagerevisions");
}
