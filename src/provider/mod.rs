//! # Providers
//!
//! Collaborators the reconciler talks to, each behind a small trait so the
//! reconcile pass can be driven against mocks in tests:
//!
//! - [`PackageStore`]: the Kubernetes object store (Packages and PackageRevisions)
//! - [`Revisioner`]: content identity of a package source
//! - [`ConfigStore`]: ImageConfig rewrite and pull secret lookup
//!
//! Production implementations live in the submodules.

use crate::crd::{Package, PackageRevision, PackageStatus};
use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

pub mod image_config;
pub mod kube_store;
pub mod registry;

pub use image_config::ImageConfigStore;
pub use kube_store::KubePackageStore;
pub use registry::RegistryRevisioner;

/// Object store client for Packages and their revisions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Get a Package by name, `None` if it does not exist
    async fn get_package(&self, name: &str) -> Result<Option<Package>>;

    /// List PackageRevisions carrying the owner label of `package`
    async fn list_revisions(&self, package: &str) -> Result<Vec<PackageRevision>>;

    /// Create or update a PackageRevision (idempotent upsert)
    async fn apply_revision(&self, revision: &PackageRevision) -> Result<()>;

    /// Delete a PackageRevision; a revision that is already gone is not an error
    async fn delete_revision(&self, name: &str) -> Result<()>;

    /// Replace the Package status
    async fn patch_package_status(&self, name: &str, status: &PackageStatus) -> Result<()>;
}

/// Resolves the content identity of a package source
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Revisioner: Send + Sync {
    /// Content identity of `source` (the possibly rewritten package reference)
    async fn revision(
        &self,
        package: &Package,
        source: &str,
        pull_secrets: &[String],
    ) -> Result<String>;
}

/// A matching ImageConfig and the value it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfigMatch {
    /// Name of the ImageConfig that matched
    pub config_name: String,
    /// Rewritten reference or pull secret name
    pub value: String,
}

/// Matches image references against ImageConfig policies
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Rewritten reference for `reference`, `None` if no config rewrites it
    async fn rewrite_path(&self, reference: &str) -> Result<Option<ImageConfigMatch>>;

    /// Pull secret for `reference`, `None` if no config provides one
    async fn pull_secret_for(&self, reference: &str) -> Result<Option<ImageConfigMatch>>;
}
