//! # Reconcile Pass
//!
//! Entry point called by the controller runtime for each Package key.

use crate::constants::OWNER_LABEL;
use crate::controller::reconciler::activation::plan_activation;
use crate::controller::reconciler::gc::collect_garbage;
use crate::controller::reconciler::health::aggregate_status;
use crate::controller::reconciler::image::{resolve_image, ImageResolution};
use crate::controller::reconciler::naming::{owner_label_value, revision_name};
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::condition::{REASON_RECONCILE_PAUSED, TYPE_SYNCED};
use crate::crd::{
    Condition, Package, PackageRevision, PackageRevisionSpec, PackageStatus, PullPolicy,
    RevisionDesiredState,
};
use crate::observability;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

const RECONCILE_PAUSED_MESSAGE: &str =
    "Reconciliation (including deletion) is paused via the pause annotation";

/// Reconcile a Package
///
/// Returns `Action::await_change()` on ordinary success and a timed requeue for
/// packages with pull policy `Always` so a mutable source is re-resolved.
pub async fn reconcile(
    package: Arc<Package>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = package.name_any();
    let span = info_span!("reconcile", package.name = %name);

    observability::metrics::increment_reconciliations();
    let start = Instant::now();
    let result = reconcile_package(&name, &ctx).instrument(span).await;
    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    if result.is_ok() {
        ctx.reset_backoff(&name);
    }
    result
}

async fn reconcile_package(name: &str, ctx: &Reconciler) -> Result<Action, ReconcilerError> {
    let package = ctx
        .bounded("get package", ctx.store.get_package(name))
        .await
        .map_err(ReconcilerError::GetPackage)?;
    let Some(package) = package else {
        debug!("Package {} not found, nothing to do", name);
        return Ok(Action::await_change());
    };
    let previous = package.status_or_default();

    if package.is_paused() {
        let mut next = previous.clone();
        next.conditions
            .set(Condition::reconcile_paused().with_message(RECONCILE_PAUSED_MESSAGE));
        ctx.persist_status(name, &previous, &next).await?;
        info!("Reconciliation of Package {} is paused", name);
        return Ok(Action::await_change());
    }

    if previous
        .conditions
        .get(TYPE_SYNCED)
        .is_some_and(|c| c.reason == REASON_RECONCILE_PAUSED)
    {
        let mut next = previous.clone();
        next.conditions.clear();
        ctx.persist_status(name, &previous, &next).await?;
        info!("Reconciliation of Package {} resumed", name);
        return Ok(Action::await_change());
    }

    let listed = ctx
        .bounded("list package revisions", ctx.store.list_revisions(name))
        .await
        .map_err(ReconcilerError::ListRevisions)?;
    let mut revisions = owned_revisions(&package, listed);

    let image = match resolve_image(ctx, &package).await {
        Ok(image) => image,
        Err(e) => return Err(fail_unpacking(ctx, name, &previous, e).await),
    };

    let target_name = match ctx
        .bounded(
            "resolve package revision identity",
            ctx.revisioner
                .revision(&package, &image.source, &image.pull_secrets),
        )
        .await
        .and_then(|identity| revision_name(name, &identity))
    {
        Ok(target_name) => target_name,
        Err(e) => {
            let err = ReconcilerError::ResolveIdentity(e);
            return Err(fail_unpacking(ctx, name, &previous, err).await);
        }
    };

    let existing = revisions.iter().find(|r| r.name_any() == target_name).cloned();
    let created = existing.is_none();
    let target = match existing {
        Some(revision) => revision,
        None => {
            info!("Materializing PackageRevision {} for {}", target_name, image.source);
            let revision = new_revision(&package, &target_name, next_ordinal(&revisions), &image);
            revisions.push(revision.clone());
            revision
        }
    };

    let plan = plan_activation(
        package.spec.revision_activation_policy,
        &revisions,
        &target,
    );

    let mut writes = Vec::new();
    for other in &plan.deactivate {
        if let Some(revision) = revisions.iter().find(|r| r.name_any() == *other) {
            writes.push(revision_payload(&package, revision, RevisionDesiredState::Inactive));
        }
    }
    if created || plan.target_changed(&target) {
        writes.push(revision_payload(&package, &target, plan.desired_state));
    }

    for payload in &writes {
        if let Err(e) = ctx
            .bounded("apply package revision", ctx.store.apply_revision(payload))
            .await
        {
            let next = aggregate_status(&previous, &target, &image, None);
            if let Err(status_err) = ctx.persist_status(name, &previous, &next).await {
                warn!("{}", status_err);
            }
            return Err(ReconcilerError::ApplyRevision(e));
        }
        debug!(
            "Applied PackageRevision {} as {:?}",
            payload.name_any(),
            payload.spec.desired_state
        );
    }
    if created {
        observability::metrics::increment_revisions_created();
    }
    if plan.target_changed(&target) && plan.desired_state == RevisionDesiredState::Active {
        info!("Activated PackageRevision {}", target_name);
        observability::metrics::increment_activations();
    }
    for revision in &mut revisions {
        if revision.name_any() == target_name {
            revision.spec.desired_state = plan.desired_state;
        } else if plan.deactivate.contains(&revision.name_any()) {
            revision.spec.desired_state = RevisionDesiredState::Inactive;
        }
    }

    let next = aggregate_status(&previous, &target, &image, Some(plan.installed));
    ctx.persist_status(name, &previous, &next).await?;

    collect_garbage(
        ctx,
        &revisions,
        &target_name,
        package.spec.revision_history_limit,
    )
    .await?;

    if package.spec.package_pull_policy == PullPolicy::Always {
        observability::metrics::increment_requeues_total("pull-always");
        return Ok(Action::requeue(ctx.settings.pull_poll_interval));
    }
    Ok(Action::await_change())
}

/// Record a resolution failure on the package and hand the error back
async fn fail_unpacking(
    ctx: &Reconciler,
    name: &str,
    previous: &PackageStatus,
    err: ReconcilerError,
) -> ReconcilerError {
    let mut next = previous.clone();
    next.conditions.set(Condition::unpacking(&err));
    if let Err(status_err) = ctx.persist_status(name, previous, &next).await {
        warn!("{}", status_err);
    }
    err
}

/// Drop listed revisions controlled by a different object
///
/// Revisions without a controller reference are kept.
fn owned_revisions(package: &Package, revisions: Vec<PackageRevision>) -> Vec<PackageRevision> {
    let Some(uid) = package.uid() else {
        return revisions;
    };
    revisions
        .into_iter()
        .filter(|r| {
            r.owner_references()
                .iter()
                .find(|o| o.controller == Some(true))
                .is_none_or(|o| o.uid == uid)
        })
        .collect()
}

fn next_ordinal(revisions: &[PackageRevision]) -> i64 {
    revisions
        .iter()
        .map(|r| r.spec.revision)
        .max()
        .unwrap_or(0)
        + 1
}

fn new_revision(
    package: &Package,
    name: &str,
    ordinal: i64,
    image: &ImageResolution,
) -> PackageRevision {
    PackageRevision::new(
        name,
        PackageRevisionSpec {
            desired_state: RevisionDesiredState::Inactive,
            revision: ordinal,
            package_image: image.source.clone(),
            package_pull_policy: package.spec.package_pull_policy,
            package_pull_secrets: image.pull_secrets.clone(),
        },
    )
}

fn owner_reference(package: &Package) -> OwnerReference {
    OwnerReference {
        api_version: Package::api_version(&()).to_string(),
        kind: Package::kind(&()).to_string(),
        name: package.name_any(),
        uid: package.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Apply payload for `revision` with `desired_state`
///
/// Only fields owned by the controller are sent; status and server-managed
/// metadata are left out.
fn revision_payload(
    package: &Package,
    revision: &PackageRevision,
    desired_state: RevisionDesiredState,
) -> PackageRevision {
    let mut payload = PackageRevision::new(
        &revision.name_any(),
        PackageRevisionSpec {
            desired_state,
            ..revision.spec.clone()
        },
    );
    payload.metadata.labels = Some(BTreeMap::from([(
        OWNER_LABEL.to_string(),
        owner_label_value(&package.name_any()),
    )]));
    payload.metadata.owner_references = Some(vec![owner_reference(package)]);
    payload
}
