//! # Watch Loop
//!
//! Runs the Package controller: watches Packages, and PackageRevisions through
//! their owner reference, and drives a reconcile pass per changed Package.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::{Package, PackageRevision};
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube::Client;
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// Initial and maximum backoff for a throttled watch stream
const WATCH_BACKOFF_START_MS: u64 = 500;
const WATCH_BACKOFF_MAX_MS: u64 = 30_000;

/// Run the controller until a shutdown signal is received
///
/// The watch is restarted whenever its stream ends for any reason other than
/// shutdown.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_state.is_ready.store(false, Ordering::Relaxed);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    let backoff_ms = Arc::new(AtomicU64::new(WATCH_BACKOFF_START_MS));
    let restart_delay = config.watch_restart_delay_duration();
    let controller_config =
        controller::Config::default().concurrency(config.max_concurrent_reconciliations);

    loop {
        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        info!("Starting controller watch loop...");
        let packages: Api<Package> = Api::all(client.clone());
        let revisions: Api<PackageRevision> = Api::all(client.clone());
        let backoff = Arc::clone(&backoff_ms);

        Controller::new(packages, watcher::Config::default().any_semantic())
            .owns(revisions, watcher::Config::default())
            .with_config(controller_config.clone())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |event| {
                let backoff = Arc::clone(&backoff);
                async move {
                    match &event {
                        Ok((object, action)) => {
                            backoff.store(WATCH_BACKOFF_START_MS, Ordering::Relaxed);
                            debug!(package.name = %object.name, action = ?action, "watch.event.reconciled");
                            Some(event)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                WATCH_BACKOFF_MAX_MS,
                                restart_delay,
                            )
                            .await
                            .map(|()| event)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .instrument(watch_span)
            .await;

        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay.max(Duration::from_secs(1))).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
