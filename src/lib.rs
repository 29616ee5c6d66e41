//! Application Master reconciliation engine.
//!
//! Continuously reconciles the actual population of running containers for
//! a set of declared roles against a user-authored cluster specification:
//! requests containers when short, releases them when in surplus, tracks
//! starts and failures, enforces a failure threshold, and publishes a live
//! cluster status. See `engine::AppState` for the reconciler itself.

pub mod clock;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod operations;
pub mod priority;
pub mod providers;
pub mod resource;
pub mod role;
pub mod role_instance;
pub mod role_status;
pub mod spec;
pub mod status;

pub use error::{AmError, Result};
