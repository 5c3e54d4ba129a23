//! # Image References
//!
//! Parsing of OCI image references (`[registry/]repository[:tag][@digest]`)
//! with Docker Hub defaults.

use crate::constants::{DEFAULT_REGISTRY, DEFAULT_TAG};
use anyhow::{bail, Result};
use std::fmt;

/// A parsed image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse a reference, filling in the default registry, `library/` namespace
    /// and `latest` tag the way `docker pull` does.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            bail!("empty image reference");
        }

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                if !digest.contains(':') {
                    bail!("invalid digest in image reference '{reference}'");
                }
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A ':' after the last '/' separates the tag; earlier ones are ports
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (name, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((host, rest)) if is_registry_host(host) => (host.to_string(), rest.to_string()),
            _ => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        };

        if repository.is_empty() || tag.as_deref() == Some("") {
            bail!("invalid image reference '{reference}'");
        }

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            format!("library/{repository}")
        } else {
            repository
        };

        let tag = if tag.is_none() && digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            tag
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// The digest or tag used to address the manifest
    #[must_use]
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }

    /// Whether the reference pins content by digest
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.digest.is_some()
    }

    /// Manifest URL on the registry's distribution API
    #[must_use]
    pub fn manifest_url(&self) -> String {
        let scheme = if self.registry.starts_with("localhost") {
            "http"
        } else {
            "https"
        };
        format!(
            "{scheme}://{}/v2/{}/manifests/{}",
            self.registry,
            self.repository,
            self.manifest_reference()
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_hub_defaults() {
        let r = ImageReference::parse("nginx").unwrap();
        assert_eq!(r.registry, "index.docker.io");
        assert_eq!(r.repository, "library/nginx");
        assert_eq!(r.tag.as_deref(), Some("latest"));
        assert!(!r.is_pinned());
    }

    #[test]
    fn test_registry_with_port_and_tag() {
        let r = ImageReference::parse("localhost:5000/org/pkg:v1.2.3").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.repository, "org/pkg");
        assert_eq!(r.tag.as_deref(), Some("v1.2.3"));
        assert_eq!(
            r.manifest_url(),
            "http://localhost:5000/v2/org/pkg/manifests/v1.2.3"
        );
    }

    #[test]
    fn test_digest_reference() {
        let r = ImageReference::parse("ghcr.io/octopilot/pkg@sha256:abcdef").unwrap();
        assert!(r.is_pinned());
        assert_eq!(r.tag, None);
        assert_eq!(r.manifest_reference(), "sha256:abcdef");
    }

    #[test]
    fn test_user_repository_on_docker_hub() {
        let r = ImageReference::parse("octopilot/pkg:v1").unwrap();
        assert_eq!(r.registry, "index.docker.io");
        assert_eq!(r.repository, "octopilot/pkg");
    }

    #[test]
    fn test_invalid_references() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("ghcr.io/pkg@nodigest").is_err());
        assert!(ImageReference::parse("ghcr.io/pkg:").is_err());
    }
}
