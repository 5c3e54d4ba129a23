//! # Image Reference Tests
//!
//! Parsing of package sources and identities that need no registry round trip.

mod support;

use package_manager_controller::crd::{PackageStatus, PullPolicy};
use package_manager_controller::provider::registry::local_identity;
use package_manager_controller::provider::registry::reference::ImageReference;

const SOURCE: &str = "ghcr.io/octopilot/platform-ref:v1.4.0";

#[test]
fn test_parse_fully_qualified() {
    let reference = ImageReference::parse(SOURCE).unwrap();
    assert_eq!(reference.registry, "ghcr.io");
    assert_eq!(reference.repository, "octopilot/platform-ref");
    assert_eq!(reference.tag.as_deref(), Some("v1.4.0"));
    assert_eq!(
        reference.manifest_url(),
        "https://ghcr.io/v2/octopilot/platform-ref/manifests/v1.4.0"
    );
    assert_eq!(reference.to_string(), SOURCE);
}

#[test]
fn test_tag_and_digest() {
    let reference = ImageReference::parse("ghcr.io/org/pkg:v1@sha256:0123abcd").unwrap();
    assert_eq!(reference.tag.as_deref(), Some("v1"));
    assert_eq!(reference.manifest_reference(), "sha256:0123abcd");
}

#[test]
fn test_pinned_reference_is_its_own_identity() {
    let source = "ghcr.io/org/pkg@sha256:0123abcd";
    let package = support::package("pkg", source);
    let reference = ImageReference::parse(source).unwrap();
    assert_eq!(
        local_identity(&package, &reference, source).as_deref(),
        Some("sha256:0123abcd")
    );
}

#[test]
fn test_if_not_present_reuses_current_revision() {
    let mut package = support::package("platform-ref", SOURCE);
    package.status = Some(PackageStatus {
        current_revision: Some("platform-ref-e3b0c44298fc".to_string()),
        current_identifier: Some(SOURCE.to_string()),
        ..PackageStatus::default()
    });
    let reference = ImageReference::parse(SOURCE).unwrap();

    assert_eq!(
        local_identity(&package, &reference, SOURCE).as_deref(),
        Some("e3b0c44298fc")
    );

    // A new source must be resolved against the registry
    let moved = "ghcr.io/octopilot/platform-ref:v1.5.0";
    let reference = ImageReference::parse(moved).unwrap();
    assert_eq!(local_identity(&package, &reference, moved), None);
}

#[test]
fn test_always_never_reuses() {
    let mut package = support::package("platform-ref", SOURCE);
    package.spec.package_pull_policy = PullPolicy::Always;
    package.status = Some(PackageStatus {
        current_revision: Some("platform-ref-e3b0c44298fc".to_string()),
        current_identifier: Some(SOURCE.to_string()),
        ..PackageStatus::default()
    });
    let reference = ImageReference::parse(SOURCE).unwrap();
    assert_eq!(local_identity(&package, &reference, SOURCE), None);
}
