//! # Reconciler
//!
//! Converges a `Package` into its `PackageRevision`s.
//!
//! One pass: fetch the package, honour the pause annotation, list owned
//! revisions, resolve the image reference, resolve the revision identity,
//! materialize and activate the target revision, write the package status once,
//! then garbage collect old revisions.
//!
//! The reconciler holds no cached objects between passes; every fetch and list
//! is authoritative for the pass that made it.

pub mod activation;
pub mod gc;
pub mod health;
pub mod image;
pub mod naming;
mod reconcile;
mod types;

pub use reconcile::reconcile;
pub use types::{BackoffState, ReconcilerError, ReconcilerSettings};

use crate::config::ControllerConfig;
use crate::crd::PackageStatus;
use crate::provider::{
    ConfigStore, ImageConfigStore, KubePackageStore, PackageStore, RegistryRevisioner, Revisioner,
};
use anyhow::{Context, Result};
use kube::Client;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Reconciler context shared by all passes
pub struct Reconciler {
    pub(crate) store: Arc<dyn PackageStore>,
    pub(crate) revisioner: Arc<dyn Revisioner>,
    pub(crate) config_store: Arc<dyn ConfigStore>,
    pub settings: ReconcilerSettings,
    /// Per-package backoff for failed passes, keyed by package name
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn PackageStore>,
        revisioner: Arc<dyn Revisioner>,
        config_store: Arc<dyn ConfigStore>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            store,
            revisioner,
            config_store,
            settings,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reconciler backed by the Kubernetes API and OCI registries
    pub fn from_client(client: Client, config: &ControllerConfig) -> Result<Self> {
        let revisioner = RegistryRevisioner::new(
            client.clone(),
            &config.controller_namespace,
            Duration::from_secs(config.registry_request_timeout_secs),
        )
        .context("Failed to create registry revisioner")?;
        Ok(Self::new(
            Arc::new(KubePackageStore::new(client.clone())),
            Arc::new(revisioner),
            Arc::new(ImageConfigStore::new(client)),
            config.reconciler_settings(),
        ))
    }

    /// Run a collaborator call under the configured deadline
    pub(crate) async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .with_context(|| format!("{operation} timed out after {}s", timeout.as_secs()))?
    }

    /// Write `next` unless it is equivalent to `previous`
    pub(crate) async fn persist_status(
        &self,
        name: &str,
        previous: &PackageStatus,
        next: &PackageStatus,
    ) -> Result<(), ReconcilerError> {
        if previous.equivalent(next) {
            debug!("Status of Package {} unchanged, skipping update", name);
            return Ok(());
        }
        self.bounded(
            "update package status",
            self.store.patch_package_status(name, next),
        )
        .await
        .map_err(ReconcilerError::UpdateStatus)
    }

    /// Forget the failure history of a package after a successful pass
    pub fn reset_backoff(&self, name: &str) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(name);
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }
}
