//! # Registry Revisioner
//!
//! [`Revisioner`] that identifies a package by its OCI manifest digest.
//!
//! Resolution order:
//! 1. a reference pinned by digest is its own identity
//! 2. with pull policy `IfNotPresent`, an unchanged source reuses the identity
//!    of the current revision without contacting the registry
//! 3. otherwise the manifest is requested from the registry: `HEAD` for the
//!    `Docker-Content-Digest` header, falling back to `GET` and a SHA-256 of
//!    the manifest body

pub mod auth;
pub mod reference;

use crate::controller::reconciler::naming::identity_from_revision_name;
use crate::crd::{Package, PullPolicy};
use crate::provider::Revisioner;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use auth::{credentials_from_docker_config, parse_challenge, Challenge, Credentials, TokenResponse};
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::Client;
use reference::ImageReference;
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.oci.image.index.v1+json, \
application/vnd.oci.image.manifest.v1+json, \
application/vnd.docker.distribution.manifest.list.v2+json, \
application/vnd.docker.distribution.manifest.v2+json";

pub struct RegistryRevisioner {
    http: reqwest::Client,
    secrets: Api<Secret>,
}

impl std::fmt::Debug for RegistryRevisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryRevisioner").finish_non_exhaustive()
    }
}

impl RegistryRevisioner {
    /// Create a revisioner reading pull secrets from `namespace`
    pub fn new(client: Client, namespace: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("package-manager-controller/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build registry HTTP client")?;
        Ok(Self {
            http,
            secrets: Api::namespaced(client, namespace),
        })
    }

    /// First credentials for `registry` found in the named pull secrets
    async fn credentials(&self, registry: &str, pull_secrets: &[String]) -> Result<Option<Credentials>> {
        for name in pull_secrets {
            let secret = match self.secrets.get(name).await {
                Ok(secret) => secret,
                Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                    warn!("Pull secret '{}' not found, skipping", name);
                    continue;
                }
                Err(e) => return Err(e).with_context(|| format!("Failed to get pull secret '{name}'")),
            };
            let Some(config) = secret
                .data
                .as_ref()
                .and_then(|d| d.get(auth::DOCKER_CONFIG_JSON_KEY))
            else {
                continue;
            };
            if let Some(credentials) = credentials_from_docker_config(&config.0, registry)
                .with_context(|| format!("Invalid pull secret '{name}'"))?
            {
                debug!("Using pull secret '{}' for registry {}", name, registry);
                return Ok(Some(credentials));
            }
        }
        Ok(None)
    }

    async fn send(&self, method: Method, url: &str, authorization: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.http.request(method, url).header(ACCEPT, MANIFEST_MEDIA_TYPES);
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))
    }

    /// Exchange a bearer challenge for a token
    async fn bearer_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        let mut query = Vec::new();
        if let Some(service) = service {
            query.push(("service", service));
        }
        if let Some(scope) = scope {
            query.push(("scope", scope));
        }
        let mut request = self.http.get(realm).query(&query);
        if let Some(credentials) = credentials {
            request = request.header(AUTHORIZATION, credentials.basic_header());
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Token request to {realm} failed"))?
            .error_for_status()
            .with_context(|| format!("Token request to {realm} was rejected"))?;
        response
            .json::<TokenResponse>()
            .await
            .context("Failed to decode registry token response")?
            .into_token()
            .context("Registry token response did not contain a token")
    }

    async fn manifest_digest(&self, reference: &ImageReference, credentials: Option<&Credentials>) -> Result<String> {
        let url = reference.manifest_url();
        let mut authorization = credentials.map(Credentials::basic_header);

        let mut response = self.send(Method::HEAD, &url, authorization.as_deref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|h| h.to_str().ok())
                .and_then(parse_challenge);
            match challenge {
                Some(Challenge::Bearer { realm, service, scope }) => {
                    let token = self
                        .bearer_token(&realm, service.as_deref(), scope.as_deref(), credentials)
                        .await?;
                    authorization = Some(format!("Bearer {token}"));
                }
                Some(Challenge::Basic) if credentials.is_some() => {
                    bail!("registry {} rejected the configured credentials", reference.registry)
                }
                _ => bail!("registry {} requires authentication", reference.registry),
            }
            response = self.send(Method::HEAD, &url, authorization.as_deref()).await?;
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("Failed to fetch manifest for {reference}"))?;
        if let Some(digest) = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|h| h.to_str().ok())
        {
            return Ok(digest.to_string());
        }

        debug!("No {} header for {}, hashing manifest", DOCKER_CONTENT_DIGEST, reference);
        let body = self
            .send(Method::GET, &url, authorization.as_deref())
            .await?
            .error_for_status()
            .with_context(|| format!("Failed to fetch manifest for {reference}"))?
            .bytes()
            .await
            .context("Failed to read manifest body")?;
        Ok(sha256_digest(&body))
    }
}

/// `sha256:<hex>` digest of `bytes`
#[must_use]
pub fn sha256_digest(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Identity that can be determined without contacting the registry
#[must_use]
pub fn local_identity(package: &Package, reference: &ImageReference, source: &str) -> Option<String> {
    if let Some(digest) = &reference.digest {
        return Some(digest.clone());
    }
    if package.spec.package_pull_policy != PullPolicy::IfNotPresent {
        return None;
    }
    let status = package.status.as_ref()?;
    if status.current_identifier.as_deref() != Some(source) {
        return None;
    }
    status
        .current_revision
        .as_deref()
        .and_then(identity_from_revision_name)
        .map(str::to_string)
}

#[async_trait]
impl Revisioner for RegistryRevisioner {
    async fn revision(&self, package: &Package, source: &str, pull_secrets: &[String]) -> Result<String> {
        let reference = ImageReference::parse(source)?;
        if let Some(identity) = local_identity(package, &reference, source) {
            debug!("Reusing identity {} for {}", identity, source);
            return Ok(identity);
        }
        let credentials = self.credentials(&reference.registry, pull_secrets).await?;
        self.manifest_digest(&reference, credentials.as_ref()).await
    }
}
