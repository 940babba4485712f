//! ami-rollover-common - Shared types and defaults
//!
//! This crate provides the typed view of the provider data used by the
//! deployer, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`balancer`]: Load balancer membership and per-instance health
//! - [`defaults`]: Default configuration values
//! - [`ids`]: Opaque identifier newtypes (image, instance, load balancer)
//! - [`instance`]: Instance profiles and lifecycle states

pub mod balancer;
pub mod defaults;
pub mod ids;
pub mod instance;

// Re-export commonly used types
pub use balancer::{HealthStatus, InstanceHealth, LoadBalancerMembership};
pub use ids::{ImageId, InstanceId, LoadBalancerName, display_ids};
pub use instance::{InstanceProfile, InstanceState, InstanceStatus};
