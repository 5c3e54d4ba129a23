//! # Custom Resource Definitions
//!
//! Kubernetes custom resources owned or read by the controller:
//!
//! - [`Package`]: desired state, one per installed package
//! - [`PackageRevision`]: one per resolved content identity of a package
//! - [`ImageConfig`]: prefix-matched rewrite and pull secret policy

pub mod condition;
mod image_config;
mod package;
mod revision;

pub use condition::{Condition, ConditionStatus, Conditions};
pub use image_config::*;
pub use package::*;
pub use revision::*;
