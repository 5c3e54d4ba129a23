//! # ImageConfig Store
//!
//! [`ConfigStore`] backed by `ImageConfig` resources. Rewrites and pull secrets
//! are selected independently: for each, the config with the longest matching
//! prefix wins, ties broken by config name.

use crate::crd::ImageConfig;
use crate::provider::{ConfigStore, ImageConfigMatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};

pub struct ImageConfigStore {
    api: Api<ImageConfig>,
}

impl std::fmt::Debug for ImageConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageConfigStore").finish_non_exhaustive()
    }
}

impl ImageConfigStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    async fn configs(&self) -> Result<Vec<ImageConfig>> {
        match self.api.list(&ListParams::default()).await {
            Ok(list) => Ok(list.items),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(Vec::new()),
            Err(e) => Err(e).context("Failed to list ImageConfigs"),
        }
    }
}

#[async_trait]
impl ConfigStore for ImageConfigStore {
    async fn rewrite_path(&self, reference: &str) -> Result<Option<ImageConfigMatch>> {
        Ok(select_rewrite(&self.configs().await?, reference))
    }

    async fn pull_secret_for(&self, reference: &str) -> Result<Option<ImageConfigMatch>> {
        Ok(select_pull_secret(&self.configs().await?, reference))
    }
}

/// Best matching config among those accepted by `eligible`
fn best_match<'a>(
    configs: &'a [ImageConfig],
    reference: &str,
    eligible: impl Fn(&ImageConfig) -> bool,
) -> Option<(&'a ImageConfig, &'a str)> {
    configs
        .iter()
        .filter(|c| eligible(c))
        .filter_map(|c| c.spec.matched_prefix(reference).map(|p| (c, p)))
        // longest prefix first, then smallest name
        .min_by(|(a, pa), (b, pb)| {
            pb.len()
                .cmp(&pa.len())
                .then_with(|| a.name_any().cmp(&b.name_any()))
        })
}

/// Rewrite `reference` using the best matching config with a `rewriteImage`
#[must_use]
pub fn select_rewrite(configs: &[ImageConfig], reference: &str) -> Option<ImageConfigMatch> {
    let (config, prefix) = best_match(configs, reference, |c| c.spec.rewrite_image.is_some())?;
    let rewrite = config.spec.rewrite_image.as_ref()?;
    Some(ImageConfigMatch {
        config_name: config.name_any(),
        value: format!("{}{}", rewrite.prefix, &reference[prefix.len()..]),
    })
}

/// Pull secret of the best matching config with registry authentication
#[must_use]
pub fn select_pull_secret(configs: &[ImageConfig], reference: &str) -> Option<ImageConfigMatch> {
    let (config, _) = best_match(configs, reference, |c| c.spec.pull_secret().is_some())?;
    Some(ImageConfigMatch {
        config_name: config.name_any(),
        value: config.spec.pull_secret()?.to_string(),
    })
}
