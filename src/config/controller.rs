//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::controller::reconciler::ReconcilerSettings;
use std::time::Duration;

/// Controller-level configuration
///
/// Every setting has a default and can be overridden via environment variables,
/// which the deployment populates from a ConfigMap using `envFrom`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Requeue interval for packages with pull policy `Always` (seconds)
    pub pull_poll_interval_secs: u64,
    /// Deadline for each object store, registry or image config call (seconds)
    pub collaborator_timeout_secs: u64,
    /// Fibonacci backoff minimum for failed passes (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff maximum for failed passes (minutes)
    pub backoff_max_minutes: u64,
    /// Delay before restarting the watch stream after it ends or fails (seconds)
    pub watch_restart_delay_secs: u64,
    /// Namespace where the controller runs and package pull secrets live
    pub controller_namespace: String,
    /// Port of the metrics and probe server
    pub metrics_port: u16,
    /// Packages reconciled at once
    pub max_concurrent_reconciliations: u16,
    /// Timeout of a single registry HTTP request (seconds)
    pub registry_request_timeout_secs: u64,
    pub server_startup_timeout_secs: u64,
    pub server_poll_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            pull_poll_interval_secs: DEFAULT_PACKAGE_PULL_POLL_INTERVAL_SECS,
            collaborator_timeout_secs: DEFAULT_COLLABORATOR_TIMEOUT_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            registry_request_timeout_secs: DEFAULT_REGISTRY_REQUEST_TIMEOUT_SECS,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        use crate::constants::*;
        let lookup = &lookup;
        Self {
            pull_poll_interval_secs: var_or_default(
                lookup,
                "PACKAGE_PULL_POLL_INTERVAL_SECS",
                DEFAULT_PACKAGE_PULL_POLL_INTERVAL_SECS,
            ),
            collaborator_timeout_secs: var_or_default(
                lookup,
                "COLLABORATOR_TIMEOUT_SECS",
                DEFAULT_COLLABORATOR_TIMEOUT_SECS,
            ),
            backoff_min_minutes: var_or_default(
                lookup,
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: var_or_default(
                lookup,
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            watch_restart_delay_secs: var_or_default(
                lookup,
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            controller_namespace: var_or_default_str(
                lookup,
                "POD_NAMESPACE",
                DEFAULT_CONTROLLER_NAMESPACE,
            ),
            metrics_port: var_or_default(lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
            max_concurrent_reconciliations: var_or_default(
                lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            registry_request_timeout_secs: var_or_default(
                lookup,
                "REGISTRY_REQUEST_TIMEOUT_SECS",
                DEFAULT_REGISTRY_REQUEST_TIMEOUT_SECS,
            ),
            server_startup_timeout_secs: var_or_default(
                lookup,
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: var_or_default(
                lookup,
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }

    /// Settings handed to each reconcile pass
    #[must_use]
    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            pull_poll_interval: Duration::from_secs(self.pull_poll_interval_secs),
            call_timeout: Duration::from_secs(self.collaborator_timeout_secs),
            backoff_min_minutes: self.backoff_min_minutes,
            backoff_max_minutes: self.backoff_max_minutes,
        }
    }

    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    pub fn server_startup_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.server_startup_timeout_secs)
    }

    pub fn server_poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.server_poll_interval_ms)
    }
}

/// Parse a variable or fall back to the default when missing or malformed
fn var_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn var_or_default_str(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ControllerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(from_map(&[]), ControllerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PACKAGE_PULL_POLL_INTERVAL_SECS", "300"),
            ("POD_NAMESPACE", "pkg-system"),
            ("METRICS_PORT", "9090"),
            ("MAX_CONCURRENT_RECONCILIATIONS", "4"),
        ]);
        assert_eq!(config.pull_poll_interval_secs, 300);
        assert_eq!(config.controller_namespace, "pkg-system");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.max_concurrent_reconciliations, 4);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = from_map(&[("METRICS_PORT", "not-a-port"), ("POD_NAMESPACE", "")]);
        assert_eq!(config.metrics_port, 5000);
        assert_eq!(config.controller_namespace, "octopilot-system");
    }

    #[test]
    fn test_reconciler_settings() {
        let settings = from_map(&[
            ("COLLABORATOR_TIMEOUT_SECS", "7"),
            ("BACKOFF_MAX_MINUTES", "30"),
        ])
        .reconciler_settings();
        assert_eq!(settings.call_timeout, Duration::from_secs(7));
        assert_eq!(settings.pull_poll_interval, Duration::from_secs(60));
        assert_eq!(settings.backoff_min_minutes, 1);
        assert_eq!(settings.backoff_max_minutes, 30);
    }
}
