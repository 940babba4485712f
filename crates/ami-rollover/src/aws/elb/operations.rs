//! Load balancer operations trait for testing

use super::ElbClient;
use ami_rollover_common::{HealthStatus, InstanceId, LoadBalancerMembership, LoadBalancerName};
use anyhow::Result;

/// Trait for classic load balancer operations that can be mocked in tests.
///
/// Note: Lists of ids are passed as owned `Vec`s to work around mockall
/// lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ElbOperations: Send + Sync {
    /// Every load balancer in the region with its registered instances
    async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerMembership>>;

    /// Register the given instances with `load_balancer` in a single call
    async fn register_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<()>;

    /// Health of the given instances as seen by `load_balancer`
    async fn describe_instance_health(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<Vec<HealthStatus>>;

    /// Deregister the given instances from `load_balancer` in a single call
    async fn deregister_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<()>;
}

impl ElbOperations for ElbClient {
    async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerMembership>> {
        ElbClient::describe_load_balancers(self).await
    }

    async fn register_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<()> {
        ElbClient::register_instances(self, load_balancer, &instance_ids).await
    }

    async fn describe_instance_health(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<Vec<HealthStatus>> {
        ElbClient::describe_instance_health(self, load_balancer, &instance_ids).await
    }

    async fn deregister_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: Vec<InstanceId>,
    ) -> Result<()> {
        ElbClient::deregister_instances(self, load_balancer, &instance_ids).await
    }
}
