//! EC2 instance discovery, launch and termination

mod instance;
mod operations;

pub use instance::{profile_from_instance, profiles_from_page, running_instance_filters};
pub use operations::Ec2Operations;

#[cfg(test)]
pub use operations::MockEc2Operations;

use crate::aws::FromAwsContext;
use crate::aws::context::AwsContext;
use anyhow::Result;
use aws_sdk_ec2::Client;

/// EC2 client used by the deploy stages
pub struct Ec2Client {
    pub(crate) client: Client,
}

impl Ec2Client {
    /// Create a new EC2 client (loads AWS config from environment)
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }
}

impl FromAwsContext for Ec2Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}
