//! # Image Reference Resolution
//!
//! Applies ImageConfig policy to the package source before identity
//! resolution: first a rewrite of the reference, then a pull secret lookup for
//! the (possibly rewritten) reference.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::{ImageConfigRef, ImageConfigReason, Package};
use tracing::debug;

/// Outcome of image reference resolution for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolution {
    /// Reference used for identity resolution and recorded on the revision
    pub source: String,
    /// Rewritten reference, only when an ImageConfig rewrote the source
    pub resolved: Option<String>,
    /// Package pull secrets plus any contributed by an ImageConfig
    pub pull_secrets: Vec<String>,
    /// ImageConfigs that matched, rewrite first
    pub applied: Vec<ImageConfigRef>,
}

pub async fn resolve_image(
    ctx: &Reconciler,
    package: &Package,
) -> Result<ImageResolution, ReconcilerError> {
    let mut source = package.spec.package.clone();
    let mut resolved = None;
    let mut applied = Vec::new();

    let rewrite = ctx
        .bounded("rewrite image path", ctx.config_store.rewrite_path(&source))
        .await
        .map_err(ReconcilerError::RewriteImage)?;
    if let Some(rewrite) = rewrite {
        debug!(
            "ImageConfig {} rewrote {} to {}",
            rewrite.config_name, source, rewrite.value
        );
        applied.push(ImageConfigRef {
            name: rewrite.config_name,
            reason: ImageConfigReason::Rewrite,
        });
        source.clone_from(&rewrite.value);
        resolved = Some(rewrite.value);
    }

    let mut pull_secrets = package.spec.package_pull_secrets.clone();
    let pull_secret = ctx
        .bounded("get image pull secret", ctx.config_store.pull_secret_for(&source))
        .await
        .map_err(ReconcilerError::GetPullConfig)?;
    if let Some(pull_secret) = pull_secret {
        debug!(
            "ImageConfig {} provides pull secret {} for {}",
            pull_secret.config_name, pull_secret.value, source
        );
        applied.push(ImageConfigRef {
            name: pull_secret.config_name,
            reason: ImageConfigReason::PullSecret,
        });
        if !pull_secrets.contains(&pull_secret.value) {
            pull_secrets.push(pull_secret.value);
        }
    }

    Ok(ImageResolution {
        source,
        resolved,
        pull_secrets,
        applied,
    })
}
