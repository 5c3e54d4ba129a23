//! # Health/Status Aggregator
//!
//! Folds the outcome of a pass into the next Package status. This is the only
//! place the status of a non-paused pass is assembled, so a pass always ends
//! in at most one status write.

use crate::controller::reconciler::image::ImageResolution;
use crate::crd::{Condition, ConditionStatus, PackageRevision, PackageStatus};
use kube::ResourceExt;

/// Package `Healthy` condition derived from the revision's health condition
#[must_use]
pub fn package_health(revision_health: Option<&Condition>) -> Condition {
    let Some(health) = revision_health else {
        return Condition::unhealthy()
            .with_message(format!("Package revision health is \"{}\"", ConditionStatus::Unknown));
    };
    if health.status == ConditionStatus::True {
        return Condition::healthy();
    }
    let message = match health.message.as_deref() {
        Some(message) if !message.is_empty() => format!(
            "Package revision health is \"{}\" with message: {message}",
            health.status
        ),
        _ => format!("Package revision health is \"{}\"", health.status),
    };
    Condition::unhealthy().with_message(message)
}

/// Next Package status for a pass that resolved `current`
///
/// `installed` is `None` when the activation outcome could not be applied; the
/// existing `Installed` condition is then left as it was.
#[must_use]
pub fn aggregate_status(
    previous: &PackageStatus,
    current: &PackageRevision,
    image: &ImageResolution,
    installed: Option<Condition>,
) -> PackageStatus {
    let mut status = previous.clone();
    status.conditions.set(package_health(current.health()));
    if let Some(installed) = installed {
        status.conditions.set(installed);
    }
    status.current_revision = Some(current.name_any());
    status.current_identifier = Some(image.source.clone());
    status.resolved_package.clone_from(&image.resolved);
    status.applied_image_config_refs.clone_from(&image.applied);
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::condition::{REASON_HEALTHY, REASON_UNHEALTHY, TYPE_HEALTHY};

    fn revision_condition(status: ConditionStatus, message: Option<&str>) -> Condition {
        Condition {
            r#type: TYPE_HEALTHY.to_string(),
            status,
            reason: "Reported".to_string(),
            message: message.map(str::to_string),
            last_transition_time: None,
        }
    }

    #[test]
    fn test_unknown_when_not_reported() {
        let health = package_health(None);
        assert_eq!(health.reason, REASON_UNHEALTHY);
        assert_eq!(
            health.message.as_deref(),
            Some("Package revision health is \"Unknown\"")
        );
    }

    #[test]
    fn test_healthy() {
        let health = package_health(Some(&revision_condition(ConditionStatus::True, None)));
        assert_eq!(health.reason, REASON_HEALTHY);
        assert_eq!(health.status, ConditionStatus::True);
    }

    #[test]
    fn test_unhealthy_with_message() {
        let health = package_health(Some(&revision_condition(
            ConditionStatus::False,
            Some("some message"),
        )));
        assert_eq!(health.status, ConditionStatus::False);
        assert_eq!(
            health.message.as_deref(),
            Some("Package revision health is \"False\" with message: some message")
        );
    }

    #[test]
    fn test_reported_unknown() {
        let health = package_health(Some(&revision_condition(ConditionStatus::Unknown, None)));
        assert_eq!(
            health.message.as_deref(),
            Some("Package revision health is \"Unknown\"")
        );
    }
}
