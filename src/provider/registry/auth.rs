//! # Registry Authentication
//!
//! Credentials from `kubernetes.io/dockerconfigjson` pull secrets and parsing
//! of `WWW-Authenticate` challenges from the distribution API.

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;

/// Key of the docker config in a `kubernetes.io/dockerconfigjson` secret
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Username/password pair for a registry
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Value for a `Basic` Authorization header
    #[must_use]
    pub fn basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

#[derive(Debug, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Debug, Deserialize)]
struct DockerAuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Credentials for `registry` from a docker config JSON document
///
/// Keys may be bare hosts or URLs (`https://index.docker.io/v1/`).
pub fn credentials_from_docker_config(config: &[u8], registry: &str) -> Result<Option<Credentials>> {
    let config: DockerConfig =
        serde_json::from_slice(config).context("Failed to parse docker config JSON")?;

    let Some(entry) = config
        .auths
        .iter()
        .find(|(key, _)| registry_key_matches(key, registry))
        .map(|(_, entry)| entry)
    else {
        return Ok(None);
    };

    if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
        return Ok(Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }));
    }

    let Some(auth) = &entry.auth else {
        return Ok(None);
    };
    let decoded = general_purpose::STANDARD
        .decode(auth)
        .context("Failed to decode docker config auth field")?;
    let decoded = String::from_utf8(decoded).context("Docker config auth field is not UTF-8")?;
    let (username, password) = decoded
        .split_once(':')
        .context("Docker config auth field is not 'username:password'")?;
    Ok(Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

fn registry_key_matches(key: &str, registry: &str) -> bool {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default();
    host == registry
        || (registry == crate::constants::DEFAULT_REGISTRY
            && matches!(host, "docker.io" | "registry-1.docker.io"))
}

/// A parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

/// Parse a `WWW-Authenticate` header value
#[must_use]
pub fn parse_challenge(header: &str) -> Option<Challenge> {
    let (scheme, params) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for (key, value) in split_params(params) {
        match key.as_str() {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }
    Some(Challenge::Bearer {
        realm: realm?,
        service,
        scope,
    })
}

/// Split `k="v",k2="v,2"` respecting quotes
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in params.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                out.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    out.push(current);

    out.into_iter()
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((
                k.trim().to_ascii_lowercase(),
                v.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// Token endpoint response; registries use either field name
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl TokenResponse {
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        self.token.or(self.access_token)
    }
}
