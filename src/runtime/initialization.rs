//! # Initialization
//!
//! Controller start-up: rustls provider, tracing, metrics, the probe server,
//! the Kubernetes client and the reconciler context.

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::Package;
use crate::observability;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field(
                "server_ready",
                &self.server_state.is_ready.load(Ordering::Relaxed),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "package_manager_controller=info".into()),
        )
        .init();

    info!("Starting Package Manager Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env();
    info!("Configuration: {:?}", config);

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_handle = {
        let state = Arc::clone(&server_state);
        let port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        })
    };
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let reconciler = Arc::new(Reconciler::from_client(client.clone(), &config)?);

    log_existing_packages(&client).await;

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        config,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout_duration();
    let poll_interval = config.server_poll_interval_duration();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            anyhow::bail!("HTTP server failed to start");
        }
        if server_state.is_ready.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            anyhow::bail!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            );
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Check the Package CRD is served and summarize what the first watch will pick up
async fn log_existing_packages(client: &Client) {
    let packages: Api<Package> = Api::all(client.clone());
    match packages.list(&ListParams::default()).await {
        Ok(list) => {
            let mut names: Vec<String> = list.items.iter().map(ResourceExt::name_any).collect();
            names.sort();
            info!("CRD is queryable, found {} existing Packages", names.len());
            if !names.is_empty() {
                let shown = if names.len() <= 3 {
                    names.join(", ")
                } else {
                    format!("{}, ... ({} total)", names[..3].join(", "), names.len())
                };
                info!("Packages: {}", shown);
            }
        }
        Err(e) => {
            error!("Package CRD is not queryable: {:?}. Is the CRD installed?", e);
            error!("Installation: crdgen | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - controller will retry");
        }
    }
}
