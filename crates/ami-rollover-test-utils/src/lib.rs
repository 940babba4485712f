//! Shared test utilities for ami-rollover
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection for live integration tests
//! - [`fixtures`]: Typed provider data for the reference deploy scenario

pub mod aws;
pub mod fixtures;

// Re-export commonly used items
pub use aws::{get_test_region, unused_image_id};
pub use fixtures::*;
