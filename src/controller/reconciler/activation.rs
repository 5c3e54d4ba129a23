//! # Activation Selector
//!
//! Decides the desired state of the target revision and which other revisions
//! must be deactivated so that at most one revision per package is Active.

use crate::crd::{ActivationPolicy, Condition, PackageRevision, RevisionDesiredState};
use kube::ResourceExt;

/// Activation decision for one pass
#[derive(Debug, Clone)]
pub struct ActivationPlan {
    /// Desired state of the target revision
    pub desired_state: RevisionDesiredState,
    /// Other revisions currently Active that must become Inactive
    pub deactivate: Vec<String>,
    /// Package `Installed` condition for this outcome
    pub installed: Condition,
}

impl ActivationPlan {
    /// Whether the target revision has to be written
    #[must_use]
    pub fn target_changed(&self, target: &PackageRevision) -> bool {
        target.spec.desired_state != self.desired_state
    }
}

/// Plan activation of `target` among the package's `revisions`
///
/// `Automatic` always activates the target. `Manual` keeps whatever the target
/// already has, which for a freshly materialized revision is `Inactive`.
#[must_use]
pub fn plan_activation(
    policy: ActivationPolicy,
    revisions: &[PackageRevision],
    target: &PackageRevision,
) -> ActivationPlan {
    let desired_state = match policy {
        ActivationPolicy::Automatic => RevisionDesiredState::Active,
        ActivationPolicy::Manual => target.spec.desired_state,
    };

    let target_name = target.name_any();
    let deactivate = if desired_state == RevisionDesiredState::Active {
        revisions
            .iter()
            .filter(|r| r.is_active() && r.name_any() != target_name)
            .map(ResourceExt::name_any)
            .collect()
    } else {
        Vec::new()
    };

    let installed = match desired_state {
        RevisionDesiredState::Active => Condition::active(),
        RevisionDesiredState::Inactive => Condition::inactive(),
    };

    ActivationPlan {
        desired_state,
        deactivate,
        installed,
    }
}
