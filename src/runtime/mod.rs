//! # Runtime
//!
//! - `initialization`: process start-up
//! - `watch_loop`: the Package controller loop
//! - `error_policy`: backoff for failed passes and watch errors

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
