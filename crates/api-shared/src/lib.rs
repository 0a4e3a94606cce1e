//! # API Shared
//!
//! Shared utilities and definitions for the Clearwater APIs.
//!
//! Contains:
//! - Wire request/response types (`types` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `clearwater-run` binary.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
