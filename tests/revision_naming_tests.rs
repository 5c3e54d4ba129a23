//! # Revision Naming Tests
//!
//! Revision names are derived from the package name and the content identity
//! and must always be valid object names.

use package_manager_controller::controller::reconciler::naming::{
    dns_label, identity_from_revision_name, revision_name,
};

#[test]
fn test_digest_identity_uses_first_twelve_hex_chars() {
    let name = revision_name(
        "platform-ref",
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    )
    .unwrap();
    assert_eq!(name, "platform-ref-e3b0c44298fc");
}

#[test]
fn test_short_identity_is_used_whole() {
    assert_eq!(revision_name("test", "1234567").unwrap(), "test-1234567");
}

#[test]
fn test_same_inputs_same_name() {
    let a = revision_name("pkg", "sha256:abcdef0123456789").unwrap();
    let b = revision_name("pkg", "sha256:abcdef0123456789").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_long_package_name_is_truncated_to_63() {
    let package = "a-very-long-package-name-that-keeps-going-well-past-the-label-limit";
    let name = revision_name(package, "sha256:0123456789abcdef").unwrap();
    assert!(name.len() <= 63, "{name} is {} chars", name.len());
    assert!(name.ends_with("-0123456789ab"));
    assert!(!name.contains("--"));
}

#[test]
fn test_empty_identity_is_rejected() {
    assert!(revision_name("pkg", "").is_err());
    assert!(revision_name("pkg", "sha256:").is_err());
}

#[test]
fn test_package_name_is_sanitized() {
    assert_eq!(dns_label("Org.Platform_Ref"), "org-platform-ref");
    assert_eq!(
        revision_name("Org.Platform_Ref", "sha256:ABCDEF012345").unwrap(),
        "org-platform-ref-abcdef012345"
    );
}

#[test]
fn test_identity_recovered_from_name() {
    let name = revision_name("platform-ref", "sha256:e3b0c44298fc1c14").unwrap();
    let identity = identity_from_revision_name(&name).unwrap();
    assert_eq!(identity, "e3b0c44298fc");
    assert_eq!(revision_name("platform-ref", identity).unwrap(), name);
}
