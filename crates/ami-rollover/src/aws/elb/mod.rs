//! Classic Elastic Load Balancing membership and health

mod balancer;
mod operations;

pub use balancer::{health_from_state, membership_from_description};
pub use operations::ElbOperations;

#[cfg(test)]
pub use operations::MockElbOperations;

use crate::aws::FromAwsContext;
use crate::aws::context::AwsContext;
use anyhow::Result;
use aws_sdk_elasticloadbalancing::Client;

/// Classic load balancer client used by the deploy stages
pub struct ElbClient {
    pub(crate) client: Client,
}

impl ElbClient {
    /// Create a new ELB client (loads AWS config from environment)
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }
}

impl FromAwsContext for ElbClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elb_client(),
        }
    }
}
