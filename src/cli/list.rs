//! # List Command

use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use package_manager_controller::crd::condition::{TYPE_HEALTHY, TYPE_INSTALLED};
use package_manager_controller::crd::Package;

/// List all Packages with their current revision and conditions
pub async fn list_command(client: Client) -> Result<()> {
    let api: Api<Package> = Api::all(client);
    let packages = api
        .list(&ListParams::default())
        .await
        .context("Failed to list Packages")?;

    if packages.items.is_empty() {
        println!("No Packages found.");
        return Ok(());
    }

    println!(
        "\n{:<30} {:<8} {:<45} {:<10} {:<10}",
        "NAME", "PAUSED", "CURRENT REVISION", "INSTALLED", "HEALTHY"
    );
    println!("{}", "-".repeat(107));

    for package in &packages.items {
        let status = package.status_or_default();
        let paused = if package.is_paused() { "Yes" } else { "No" };
        let revision = status.current_revision.as_deref().unwrap_or("-");
        let condition = |kind: &str| {
            status
                .conditions
                .get(kind)
                .map_or_else(|| "Unknown".to_string(), |c| c.status.to_string())
        };

        println!(
            "{:<30} {:<8} {:<45} {:<10} {:<10}",
            package.name_any(),
            paused,
            revision,
            condition(TYPE_INSTALLED),
            condition(TYPE_HEALTHY)
        );
    }

    Ok(())
}
