//! # Package Manager Controller
//!
//! Kubernetes controller that turns `Package` resources into `PackageRevision`s.
//!
//! For every Package it resolves the package image, applying `ImageConfig`
//! rewrites and pull secrets, derives the revision name from the image's
//! content digest, creates or activates that revision, mirrors its health onto
//! the Package and deletes revisions beyond `revisionHistoryLimit`.
//!
//! Setting the annotation `pkg.octopilot.io/paused: "true"` (or `pkgctl pause`)
//! stops reconciliation of a Package until the annotation is removed.

use anyhow::Result;
use package_manager_controller::runtime::{initialization, watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialization::initialize().await?;

    watch_loop::run_watch_loop(init.client, init.reconciler, init.server_state, &init.config)
        .await
}
