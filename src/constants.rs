//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Annotation that pauses reconciliation of a Package when set to `"true"`
pub const PAUSE_ANNOTATION: &str = "pkg.octopilot.io/paused";

/// Label linking a PackageRevision to the Package that owns it
pub const OWNER_LABEL: &str = "pkg.octopilot.io/owner";

/// Field manager used for server-side apply of PackageRevisions
pub const FIELD_MANAGER: &str = "package-manager-controller";

/// Maximum length of a Kubernetes object name (DNS-1123 label)
pub const MAX_NAME_LENGTH: usize = 63;

/// Number of identity characters used in a revision name
pub const REVISION_SUFFIX_LENGTH: usize = 12;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for packages with pull policy `Always` (seconds)
pub const DEFAULT_PACKAGE_PULL_POLL_INTERVAL_SECS: u64 = 60;

/// Default deadline for a single collaborator call (seconds)
pub const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 30;

/// Default Fibonacci backoff minimum (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default Fibonacci backoff maximum (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default maximum number of packages reconciled at once
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default timeout for a single registry HTTP request (seconds)
pub const DEFAULT_REGISTRY_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Default namespace holding package pull secrets
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "octopilot-system";

/// Default registry for references without a registry host
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// Default tag for references without a tag or digest
pub const DEFAULT_TAG: &str = "latest";
