//! # Status Command

use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use package_manager_controller::constants::OWNER_LABEL;
use package_manager_controller::controller::reconciler::naming::owner_label_value;
use package_manager_controller::crd::{Package, PackageRevision};

/// Show a Package's status and its revisions ordered by ordinal
pub async fn status_command(client: Client, name: &str) -> Result<()> {
    let packages: Api<Package> = Api::all(client.clone());
    let package = packages
        .get(name)
        .await
        .with_context(|| format!("Failed to get Package '{name}'"))?;
    let status = package.status_or_default();

    println!("Package: {name}");
    println!("  Source:            {}", package.spec.package);
    println!("  Pull policy:       {:?}", package.spec.package_pull_policy);
    println!(
        "  Activation policy: {:?}",
        package.spec.revision_activation_policy
    );
    println!(
        "  History limit:     {}",
        package
            .spec
            .revision_history_limit
            .map_or_else(|| "unlimited".to_string(), |l| l.to_string())
    );
    if package.is_paused() {
        println!("  ⏸️  Reconciliation is paused");
    }
    println!(
        "  Current revision:  {}",
        status.current_revision.as_deref().unwrap_or("-")
    );
    if let Some(resolved) = &status.resolved_package {
        println!("  Resolved package:  {resolved}");
    }
    for applied in &status.applied_image_config_refs {
        println!(
            "  Image config:      {} ({:?})",
            applied.name, applied.reason
        );
    }

    println!("\nConditions:");
    if status.conditions.is_empty() {
        println!("  (none)");
    }
    for condition in status.conditions.iter() {
        println!(
            "  {:<10} {:<8} {:<28} {}",
            condition.r#type,
            condition.status,
            condition.reason,
            condition.message.as_deref().unwrap_or("")
        );
    }

    let revisions: Api<PackageRevision> = Api::all(client);
    let mut items = revisions
        .list(&ListParams::default().labels(&format!("{OWNER_LABEL}={}", owner_label_value(name))))
        .await
        .with_context(|| format!("Failed to list revisions of Package '{name}'"))?
        .items;
    items.sort_by_key(|r| r.spec.revision);

    println!("\nRevisions:");
    if items.is_empty() {
        println!("  (none)");
    }
    for revision in &items {
        println!(
            "  {:>4}  {:<45} {:<9} {}",
            revision.spec.revision,
            revision.name_any(),
            format!("{:?}", revision.spec.desired_state),
            revision.health_status()
        );
    }

    Ok(())
}
