//! Package Manager Controller Library
//!
//! Reconciles `Package` resources into immutable `PackageRevision`s: resolves
//! the package image (with ImageConfig rewrites and pull secrets), names the
//! revision after its content identity, activates it, reports health on the
//! Package and prunes old revisions.
//!
//! ```rust
//! use package_manager_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
