//! # Error Policy
//!
//! Handling of failed reconcile passes and watch stream errors.

use crate::controller::reconciler::{BackoffState, Reconciler, ReconcilerError};
use crate::crd::Package;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Requeue a failed Package with its own Fibonacci backoff
///
/// Backoff state is keyed by package name so one failing package never delays
/// another. The state is cleared by the next successful pass.
pub fn handle_reconciliation_error(
    obj: Arc<Package>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        package.name = name.as_str(),
        stage = error.stage(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for Package {}: {}", name, error);
    observability::metrics::increment_reconciliation_errors(error.stage());

    let settings = &ctx.settings;
    let (backoff_seconds, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(name.clone()).or_insert_with(|| {
                BackoffState::new(settings.backoff_min_minutes, settings.backoff_max_minutes)
            });
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using minimum backoff", e);
            (settings.backoff_min_minutes * 60, 0)
        }
    };

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));
    info!(
        "🔄 Retrying Package {} in {}s (error count: {}, next attempt {})",
        name,
        backoff_seconds,
        error_count,
        next_trigger_time.to_rfc3339()
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Classification of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    Unauthorized,
    Expired,
    Throttled,
    NotFound,
    Other,
}

impl WatchErrorKind {
    /// Classify by the rendered error; 404 is checked first since a plain text
    /// 404 body surfaces as a decode error mentioning the watch.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        let not_found = error.contains("ObjectNotFound")
            || error.contains("404")
            || error.contains("not found");
        if not_found {
            Self::NotFound
        } else if error.contains("401") || error.contains("Unauthorized") {
            Self::Unauthorized
        } else if error.contains("410")
            || error.contains("too old resource version")
            || error.contains("Expired")
            || error.contains("Gone")
        {
            Self::Expired
        } else if error.contains("429")
            || error.contains("storage is (re)initializing")
            || error.contains("TooManyRequests")
        {
            Self::Throttled
        } else {
            Self::Other
        }
    }
}

/// Handle a watch stream error
///
/// Returns `None` to drop the event and let the stream restart, `Some(())` to
/// keep it.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );

    async move {
        match WatchErrorKind::classify(error_string) {
            WatchErrorKind::Unauthorized => {
                error!("❌ Watch authentication failed (401 Unauthorized), RBAC may have been revoked or the token expired");
                error!("   kubectl auth can-i list packages.pkg.octopilot.io --as=system:serviceaccount:<namespace>:package-manager-controller");
                warn!(
                    "⏳ Waiting {}s before retrying watch...",
                    watch_restart_delay.as_secs()
                );
                tokio::time::sleep(watch_restart_delay).await;
                None
            }
            WatchErrorKind::Expired => {
                warn!("Watch resource version expired (410), watch will restart");
                None
            }
            WatchErrorKind::Throttled => {
                let current = backoff_ms.load(Ordering::Relaxed);
                warn!(
                    "API server throttling or reinitializing (429), backing off for {}ms before restart...",
                    current
                );
                tokio::time::sleep(Duration::from_millis(current)).await;
                backoff_ms.store((current * 2).min(max_backoff_ms), Ordering::Relaxed);
                None
            }
            WatchErrorKind::NotFound => {
                warn!(
                    "Object not found (404), normal after a delete; check the CRDs are installed if it persists. Error: {}",
                    error_string
                );
                Some(())
            }
            WatchErrorKind::Other => {
                error!("Controller stream error: {}", error_string);
                tokio::time::sleep(watch_restart_delay).await;
                None
            }
        }
    }
    .instrument(error_span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::ReconcilerSettings;
    use crate::crd::PackageSpec;
    use crate::provider::{MockConfigStore, MockPackageStore, MockRevisioner};
    use anyhow::anyhow;

    fn context() -> Arc<Reconciler> {
        Arc::new(Reconciler::new(
            Arc::new(MockPackageStore::new()),
            Arc::new(MockRevisioner::new()),
            Arc::new(MockConfigStore::new()),
            ReconcilerSettings::default(),
        ))
    }

    fn package(name: &str) -> Arc<Package> {
        Arc::new(Package::new(
            name,
            PackageSpec {
                package: "xpkg.example.com/org/test:v1".to_string(),
                package_pull_policy: Default::default(),
                package_pull_secrets: Vec::new(),
                revision_activation_policy: Default::default(),
                revision_history_limit: None,
            },
        ))
    }

    #[test]
    fn test_backoff_grows_per_package() {
        let ctx = context();
        let err = ReconcilerError::ApplyRevision(anyhow!("boom"));

        let first = handle_reconciliation_error(package("a"), &err, Arc::clone(&ctx));
        let second = handle_reconciliation_error(package("a"), &err, Arc::clone(&ctx));
        let third = handle_reconciliation_error(package("a"), &err, Arc::clone(&ctx));
        let other = handle_reconciliation_error(package("b"), &err, Arc::clone(&ctx));

        assert_eq!(first, Action::requeue(Duration::from_secs(60)));
        assert_eq!(second, Action::requeue(Duration::from_secs(60)));
        assert_eq!(third, Action::requeue(Duration::from_secs(120)));
        assert_eq!(other, Action::requeue(Duration::from_secs(60)));
    }

    #[test]
    fn test_success_resets_backoff() {
        let ctx = context();
        let err = ReconcilerError::GetPackage(anyhow!("boom"));
        for _ in 0..4 {
            handle_reconciliation_error(package("a"), &err, Arc::clone(&ctx));
        }

        ctx.reset_backoff("a");

        assert_eq!(
            handle_reconciliation_error(package("a"), &err, ctx),
            Action::requeue(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_classify_watch_errors() {
        assert_eq!(
            WatchErrorKind::classify("Api(ErrorResponse { code: 401, reason: \"Unauthorized\" })"),
            WatchErrorKind::Unauthorized
        );
        assert_eq!(
            WatchErrorKind::classify("WatchFailed: invalid type: integer `404`"),
            WatchErrorKind::NotFound
        );
        assert_eq!(
            WatchErrorKind::classify("too old resource version: 123"),
            WatchErrorKind::Expired
        );
        assert_eq!(
            WatchErrorKind::classify("storage is (re)initializing"),
            WatchErrorKind::Throttled
        );
        assert_eq!(WatchErrorKind::classify("connection reset"), WatchErrorKind::Other);
    }

    #[tokio::test]
    async fn test_throttled_doubles_backoff_up_to_max() {
        let backoff = AtomicU64::new(1);
        let kept =
            handle_watch_stream_error("429 TooManyRequests", &backoff, 3, Duration::ZERO).await;
        assert!(kept.is_none());
        assert_eq!(backoff.load(Ordering::Relaxed), 2);

        handle_watch_stream_error("429 TooManyRequests", &backoff, 3, Duration::ZERO).await;
        assert_eq!(backoff.load(Ordering::Relaxed), 3);
    }
}
