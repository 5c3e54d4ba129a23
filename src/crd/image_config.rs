//! # ImageConfig
//!
//! Cluster-wide policy matched against package source references by prefix.
//! An ImageConfig can rewrite the matching prefix to a mirror and can contribute
//! a pull secret for the matched registry.
//!
//! ```yaml
//! apiVersion: pkg.octopilot.io/v1
//! kind: ImageConfig
//! metadata:
//!   name: mirror
//! spec:
//!   matchImages:
//!     - type: Prefix
//!       prefix: ghcr.io/octopilot
//!   rewriteImage:
//!     prefix: mirror.internal/octopilot
//!   registry:
//!     authentication:
//!       pullSecretRef:
//!         name: mirror-credentials
//! ```

use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ImageConfig",
    group = "pkg.octopilot.io",
    version = "v1",
    shortname = "imgcfg"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfigSpec {
    /// Image reference patterns this config applies to
    pub match_images: Vec<ImageMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_image: Option<RewriteImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMatch {
    #[serde(default)]
    pub r#type: MatchType,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub enum MatchType {
    #[default]
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewriteImage {
    /// Replacement for the matched prefix
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<RegistryAuthentication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistryAuthentication {
    pub pull_secret_ref: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
}

impl ImageConfigSpec {
    /// Longest prefix of this config matching `reference`, if any
    #[must_use]
    pub fn matched_prefix(&self, reference: &str) -> Option<&str> {
        self.match_images
            .iter()
            .filter(|m| reference.starts_with(&m.prefix))
            .max_by_key(|m| m.prefix.len())
            .map(|m| m.prefix.as_str())
    }

    #[must_use]
    pub fn pull_secret(&self) -> Option<&str> {
        self.registry
            .as_ref()?
            .authentication
            .as_ref()
            .map(|a| a.pull_secret_ref.name.as_str())
    }
}
