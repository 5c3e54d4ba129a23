//! # Configuration
//!
//! - `controller`: controller settings from the environment

pub mod controller;

pub use controller::ControllerConfig;
