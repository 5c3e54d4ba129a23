//! # Garbage Collector
//!
//! Enforces `revisionHistoryLimit`. The current revision and any Active
//! revision are never deleted. Among the remaining revisions the `limit`
//! newest by ordinal are kept.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::PackageRevision;
use crate::observability;
use kube::ResourceExt;
use std::collections::HashMap;
use tracing::{info, warn};

/// Names of revisions to delete, oldest last
///
/// No limit means unlimited history. Duplicate ordinals are reported as a
/// data-integrity error rather than resolved arbitrarily.
pub fn select_for_deletion(
    revisions: &[PackageRevision],
    current: &str,
    limit: Option<u32>,
) -> Result<Vec<String>, ReconcilerError> {
    let Some(limit) = limit else {
        return Ok(Vec::new());
    };

    let mut seen: HashMap<i64, String> = HashMap::new();
    for revision in revisions {
        if let Some(first) = seen.insert(revision.spec.revision, revision.name_any()) {
            return Err(ReconcilerError::DuplicateRevisionOrdinal {
                ordinal: revision.spec.revision,
                first,
                second: revision.name_any(),
            });
        }
    }

    let mut others: Vec<&PackageRevision> = revisions
        .iter()
        .filter(|r| r.name_any() != current)
        .collect();
    others.sort_by(|a, b| b.spec.revision.cmp(&a.spec.revision));

    Ok(others
        .into_iter()
        .skip(limit as usize)
        .filter(|r| !r.is_active())
        .map(ResourceExt::name_any)
        .collect())
}

/// Delete revisions beyond the history limit
///
/// Every selected revision is attempted; the first failure is returned.
pub async fn collect_garbage(
    ctx: &Reconciler,
    revisions: &[PackageRevision],
    current: &str,
    limit: Option<u32>,
) -> Result<usize, ReconcilerError> {
    let doomed = select_for_deletion(revisions, current, limit)?;
    let mut first_error = None;
    let mut deleted = 0;

    for name in &doomed {
        match ctx
            .bounded("delete package revision", ctx.store.delete_revision(name))
            .await
        {
            Ok(()) => {
                info!("Garbage collected PackageRevision {}", name);
                observability::metrics::increment_revisions_garbage_collected();
                deleted += 1;
            }
            Err(e) => {
                warn!("Failed to garbage collect PackageRevision {}: {:#}", name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(ReconcilerError::GarbageCollect(e)),
        None => Ok(deleted),
    }
}
