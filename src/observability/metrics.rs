//! # Metrics
//!
//! Prometheus metrics for the package controller.
//!
//! ## Metrics Exposed
//!
//! - `package_manager_reconciliations_total` - Reconcile passes started
//! - `package_manager_reconciliation_errors_total` - Failed passes, by stage
//! - `package_manager_reconciliation_duration_seconds` - Duration of a pass
//! - `package_manager_revisions_created_total` - PackageRevisions materialized
//! - `package_manager_activations_total` - PackageRevisions switched to Active
//! - `package_manager_revisions_garbage_collected_total` - PackageRevisions deleted by history limit
//! - `package_manager_requeues_total` - Requeues, by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "package_manager_reconciliations_total",
        "Total number of reconcile passes",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "package_manager_reconciliation_errors_total",
            "Total number of failed reconcile passes by stage",
        ),
        &["stage"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "package_manager_reconciliation_duration_seconds",
            "Duration of a reconcile pass in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REVISIONS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "package_manager_revisions_created_total",
        "Total number of package revisions materialized",
    )
    .expect("Failed to create REVISIONS_CREATED_TOTAL metric - this should never happen")
});

static ACTIVATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "package_manager_activations_total",
        "Total number of package revisions activated",
    )
    .expect("Failed to create ACTIVATIONS_TOTAL metric - this should never happen")
});

static REVISIONS_GARBAGE_COLLECTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "package_manager_revisions_garbage_collected_total",
        "Total number of package revisions deleted by the history limit",
    )
    .expect(
        "Failed to create REVISIONS_GARBAGE_COLLECTED_TOTAL metric - this should never happen",
    )
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "package_manager_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REVISIONS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ACTIVATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REVISIONS_GARBAGE_COLLECTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(stage: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[stage]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_revisions_created() {
    REVISIONS_CREATED_TOTAL.inc();
}

pub fn increment_activations() {
    ACTIVATIONS_TOTAL.inc();
}

pub fn increment_revisions_garbage_collected() {
    REVISIONS_GARBAGE_COLLECTED_TOTAL.inc();
}

/// Reasons in use: `error-backoff`, `pull-always`
pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Encoder;

    #[test]
    fn test_labelled_counters_track_per_label() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["apply_revision"])
            .get();
        increment_reconciliation_errors("apply_revision");
        increment_reconciliation_errors("apply_revision");
        assert_eq!(
            RECONCILIATION_ERRORS_TOTAL
                .with_label_values(&["apply_revision"])
                .get(),
            before + 2
        );
    }

    #[test]
    fn test_registered_metrics_are_gathered() {
        // Registration is process-wide; a second registration reports a duplicate.
        let _ = register_metrics();
        increment_requeues_total("pull-always");
        let mut buffer = Vec::new();
        prometheus::TextEncoder::new()
            .encode(&REGISTRY.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("package_manager_requeues_total{reason=\"pull-always\"}"));
        assert!(text.contains("package_manager_reconciliations_total"));
    }
}
