//! # Revision Naming
//!
//! Deterministic PackageRevision names: `<package>-<identity prefix>`.
//! The identity's algorithm prefix (`sha256:`) is dropped and the package part
//! is truncated so the result is a valid DNS-1123 label.

use crate::constants::{MAX_NAME_LENGTH, REVISION_SUFFIX_LENGTH};
use anyhow::{bail, Result};

/// Revision name for `package` and content `identity`
pub fn revision_name(package: &str, identity: &str) -> Result<String> {
    let hex = identity
        .rsplit_once(':')
        .map_or(identity, |(_, digest)| digest);
    let suffix: String = hex
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(REVISION_SUFFIX_LENGTH)
        .collect();
    if suffix.is_empty() {
        bail!("package revision identity {identity:?} is empty");
    }

    let max_base = MAX_NAME_LENGTH - suffix.len() - 1;
    let mut base = dns_label(package);
    if base.len() > max_base {
        base.truncate(max_base);
        base = base.trim_end_matches('-').to_string();
    }
    if base.is_empty() {
        return Ok(suffix);
    }
    Ok(format!("{base}-{suffix}"))
}

/// Lowercase `name`, replacing anything outside `[a-z0-9-]` with `-`
#[must_use]
pub fn dns_label(name: &str) -> String {
    let label: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    label.trim_matches('-').to_string()
}

/// Value of the owner label for `package`
///
/// Label values are capped at 63 characters while package names may be longer,
/// so long names are truncated. Two packages sharing a truncated prefix list each
/// other's revisions; the controller owner reference tells them apart.
#[must_use]
pub fn owner_label_value(package: &str) -> String {
    if package.len() <= MAX_NAME_LENGTH {
        return package.to_string();
    }
    let truncated: String = package.chars().take(MAX_NAME_LENGTH).collect();
    truncated
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Identity part of a revision name produced by [`revision_name`]
#[must_use]
pub fn identity_from_revision_name(name: &str) -> Option<&str> {
    name.rsplit_once('-')
        .map(|(_, suffix)| suffix)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_identity() {
        assert_eq!(revision_name("test", "1234567").unwrap(), "test-1234567");
    }

    #[test]
    fn test_digest_identity() {
        let name = revision_name(
            "platform-ref",
            "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
        )
        .unwrap();
        assert_eq!(name, "platform-ref-0123456789ab");
    }

    #[test]
    fn test_long_package_name_is_truncated() {
        let package = "a".repeat(80);
        let name = revision_name(&package, "sha256:ffffffffffffffff").unwrap();
        assert_eq!(name.len(), 63);
        assert!(name.ends_with("-ffffffffffff"));
    }

    #[test]
    fn test_empty_identity_is_error() {
        assert!(revision_name("test", "").is_err());
        assert!(revision_name("test", "sha256:").is_err());
    }

    #[test]
    fn test_owner_label_value_fits_label_limit() {
        assert_eq!(owner_label_value("test"), "test");

        let exact = "b".repeat(63);
        assert_eq!(owner_label_value(&exact), exact);

        let long = format!("{}.{}", "a".repeat(62), "c".repeat(100));
        assert_eq!(owner_label_value(&long), "a".repeat(62));
    }

    #[test]
    fn test_identity_round_trip_through_name() {
        let name = revision_name("my-pkg", "sha256:abcdef0123456789").unwrap();
        assert_eq!(identity_from_revision_name(&name), Some("abcdef012345"));
    }
}
