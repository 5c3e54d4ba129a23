//! # Prelude
//!
//! ```rust
//! use package_manager_controller::prelude::*;
//! ```

pub use crate::crd::*;

pub use crate::provider::{ConfigStore, ImageConfigMatch, PackageStore, Revisioner};

pub use crate::controller::reconciler::{
    reconcile, BackoffState, Reconciler, ReconcilerError, ReconcilerSettings,
};

pub use crate::config::ControllerConfig;
