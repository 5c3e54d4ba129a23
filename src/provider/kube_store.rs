//! # Kubernetes Package Store
//!
//! [`PackageStore`] over the Kubernetes API. Packages and PackageRevisions are
//! cluster-scoped. Revisions are written with server-side apply so repeated
//! passes are no-ops on the API server.

use crate::constants::{FIELD_MANAGER, OWNER_LABEL};
use crate::controller::reconciler::naming::owner_label_value;
use crate::crd::{Package, PackageRevision, PackageStatus};
use crate::provider::PackageStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

pub struct KubePackageStore {
    packages: Api<Package>,
    revisions: Api<PackageRevision>,
}

impl std::fmt::Debug for KubePackageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePackageStore").finish_non_exhaustive()
    }
}

impl KubePackageStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            packages: Api::all(client.clone()),
            revisions: Api::all(client),
        }
    }
}

#[async_trait]
impl PackageStore for KubePackageStore {
    async fn get_package(&self, name: &str) -> Result<Option<Package>> {
        match self.packages.get(name).await {
            Ok(package) => Ok(Some(package)),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to get Package '{name}'")),
        }
    }

    async fn list_revisions(&self, package: &str) -> Result<Vec<PackageRevision>> {
        let selector = format!("{OWNER_LABEL}={}", owner_label_value(package));
        let params = ListParams::default().labels(&selector);
        match self.revisions.list(&params).await {
            Ok(list) => Ok(list.items),
            // CRD not yet established reads as "no revisions"
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(Vec::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to list PackageRevisions for '{package}'")),
        }
    }

    async fn apply_revision(&self, revision: &PackageRevision) -> Result<()> {
        let name = revision
            .metadata
            .name
            .as_deref()
            .context("PackageRevision has no name")?;
        let params = PatchParams::apply(FIELD_MANAGER).force();
        self.revisions
            .patch(name, &params, &Patch::Apply(revision))
            .await
            .with_context(|| format!("Failed to apply PackageRevision '{name}'"))?;
        debug!("Applied PackageRevision {}", name);
        Ok(())
    }

    async fn delete_revision(&self, name: &str) -> Result<()> {
        match self.revisions.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("PackageRevision {} already deleted", name);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete PackageRevision '{name}'")),
        }
    }

    async fn patch_package_status(&self, name: &str, status: &PackageStatus) -> Result<()> {
        let patch = json!({ "status": status });
        self.packages
            .patch_status(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .with_context(|| format!("Failed to patch status of Package '{name}'"))?;
        Ok(())
    }
}
