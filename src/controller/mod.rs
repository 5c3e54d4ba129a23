//! # Controller
//!
//! - `backoff`: Fibonacci backoff for failed passes
//! - `reconciler`: Package reconcile pass
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
