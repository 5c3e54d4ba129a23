//! # Pause/Resume Commands
//!
//! Toggle the pause annotation on a Package.

use anyhow::{Context, Result};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use package_manager_controller::constants::PAUSE_ANNOTATION;
use package_manager_controller::crd::Package;
use serde_json::json;

/// Set the pause annotation on a Package
pub async fn pause_command(client: Client, name: &str) -> Result<()> {
    println!("⏸️  Pausing reconciliation for Package '{name}'...");

    let api: Api<Package> = Api::all(client);
    let package = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get Package '{name}'"))?;

    if package.is_paused() {
        println!("   ℹ️  Package is already paused");
        return Ok(());
    }

    let patch = json!({
        "metadata": {
            "annotations": { PAUSE_ANNOTATION: "true" }
        }
    });
    api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to pause Package '{name}'"))?;

    println!("✅ Reconciliation paused");
    println!("\nTo resume reconciliation, run:");
    println!("   pkgctl resume {name}");

    Ok(())
}

/// Remove the pause annotation from a Package
pub async fn resume_command(client: Client, name: &str) -> Result<()> {
    println!("▶️  Resuming reconciliation for Package '{name}'...");

    let api: Api<Package> = Api::all(client);
    let package = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get Package '{name}'"))?;

    if !package.is_paused() {
        println!("   ℹ️  Package is not paused");
        return Ok(());
    }

    // A null value removes the key in a JSON merge patch
    let patch = json!({
        "metadata": {
            "annotations": { PAUSE_ANNOTATION: null }
        }
    });
    api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to resume Package '{name}'"))?;

    println!("✅ Reconciliation resumed");
    println!("\nThe controller will reconcile this Package shortly.");

    Ok(())
}
