//! AWS client modules for the deployer
//!
//! This module provides wrappers around AWS SDK clients for:
//! - EC2: Discovering, launching and terminating instances
//! - ELB: Classic load balancer membership and health
//! - STS: Credential check and account ID lookup

pub mod account;
pub mod context;
pub mod ec2;
pub mod elb;
pub mod error;

pub use account::{AccountId, get_current_account_id};
pub use context::AwsContext;
pub use ec2::{Ec2Client, Ec2Operations};
pub use elb::{ElbClient, ElbOperations};
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};

/// Construct a service client wrapper from a loaded [`AwsContext`].
pub trait FromAwsContext {
    fn from_context(ctx: &AwsContext) -> Self;
}
