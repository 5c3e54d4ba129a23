//! # Reconciler Types
//!
//! Error and state types used by the reconciler.

use crate::controller::backoff::FibonacciBackoff;
use std::time::Duration;

/// Error returned from a reconcile pass
///
/// One variant per pass stage. The message prefix is stable so failures can be
/// classified by stage without inspecting the cause.
#[derive(Debug, thiserror::Error)]
pub enum ReconcilerError {
    #[error("cannot get package: {0:#}")]
    GetPackage(anyhow::Error),
    #[error("cannot list package revisions: {0:#}")]
    ListRevisions(anyhow::Error),
    #[error("cannot rewrite image path using config: {0:#}")]
    RewriteImage(anyhow::Error),
    #[error("cannot get image pull secret from config: {0:#}")]
    GetPullConfig(anyhow::Error),
    #[error("cannot resolve package revision identity: {0:#}")]
    ResolveIdentity(anyhow::Error),
    #[error("cannot apply package revision: {0:#}")]
    ApplyRevision(anyhow::Error),
    #[error("cannot update package status: {0:#}")]
    UpdateStatus(anyhow::Error),
    #[error("cannot garbage collect old package revision: {0:#}")]
    GarbageCollect(anyhow::Error),
    #[error("package revisions {first} and {second} share ordinal {ordinal}")]
    DuplicateRevisionOrdinal {
        ordinal: i64,
        first: String,
        second: String,
    },
}

impl ReconcilerError {
    /// Short stable label of the failing stage, used as a metric label
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::GetPackage(_) => "get_package",
            Self::ListRevisions(_) => "list_revisions",
            Self::RewriteImage(_) => "rewrite_image",
            Self::GetPullConfig(_) => "pull_secret",
            Self::ResolveIdentity(_) => "resolve_identity",
            Self::ApplyRevision(_) => "apply_revision",
            Self::UpdateStatus(_) => "update_status",
            Self::GarbageCollect(_) => "garbage_collect",
            Self::DuplicateRevisionOrdinal { .. } => "duplicate_ordinal",
        }
    }
}

/// Tunables of a reconcile pass
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Requeue interval for packages with pull policy `Always`
    pub pull_poll_interval: Duration,
    /// Deadline for each collaborator call
    pub call_timeout: Duration,
    /// Fibonacci backoff bounds for failed passes (minutes)
    pub backoff_min_minutes: u64,
    pub backoff_max_minutes: u64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            pull_poll_interval: Duration::from_secs(DEFAULT_PACKAGE_PULL_POLL_INTERVAL_SECS),
            call_timeout: Duration::from_secs(DEFAULT_COLLABORATOR_TIMEOUT_SECS),
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
        }
    }
}

/// Backoff state for a specific package
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_messages_wrap_cause() {
        let err = ReconcilerError::GetPackage(anyhow!("boom"));
        assert_eq!(err.to_string(), "cannot get package: boom");

        let err = ReconcilerError::RewriteImage(anyhow!("boom").context("listing configs"));
        assert_eq!(
            err.to_string(),
            "cannot rewrite image path using config: listing configs: boom"
        );
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(
            ReconcilerError::GarbageCollect(anyhow!("x")).stage(),
            "garbage_collect"
        );
        assert_eq!(
            ReconcilerError::DuplicateRevisionOrdinal {
                ordinal: 1,
                first: "a".to_string(),
                second: "b".to_string(),
            }
            .stage(),
            "duplicate_ordinal"
        );
    }
}
