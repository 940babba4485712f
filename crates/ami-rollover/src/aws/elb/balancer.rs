//! Classic load balancer discovery, registration and health

use super::ElbClient;
use ami_rollover_common::{
    HealthStatus, InstanceHealth, InstanceId, LoadBalancerMembership, LoadBalancerName,
};
use anyhow::{Context, Result};
use aws_sdk_elasticloadbalancing::types::{Instance, InstanceState, LoadBalancerDescription};
use tracing::{debug, info};

/// Typed view of one described load balancer.
///
/// Attachments without an instance id are skipped.
pub fn membership_from_description(
    description: &LoadBalancerDescription,
) -> Result<LoadBalancerMembership> {
    let name = description
        .load_balancer_name()
        .context("Described load balancer has no name")?;

    let instance_ids = description
        .instances()
        .iter()
        .filter_map(|i| i.instance_id())
        .map(InstanceId::from)
        .collect();

    Ok(LoadBalancerMembership::new(name, instance_ids))
}

/// Typed view of one health row
pub fn health_from_state(state: &InstanceState) -> Result<HealthStatus> {
    let instance_id = state
        .instance_id()
        .context("Instance health entry has no instance ID")?;

    Ok(HealthStatus {
        instance_id: instance_id.into(),
        health: state
            .state()
            .map(InstanceHealth::from_provider)
            .unwrap_or(InstanceHealth::Unknown),
        reason_code: state.reason_code().map(str::to_string),
        description: state.description().map(str::to_string),
    })
}

fn elb_instances(instance_ids: &[InstanceId]) -> Vec<Instance> {
    instance_ids
        .iter()
        .map(|id| Instance::builder().instance_id(id.as_str()).build())
        .collect()
}

impl ElbClient {
    /// Every classic load balancer in the region, following `Marker` pagination
    pub async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerMembership>> {
        let mut balancers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .context("Failed to describe load balancers")?;

            debug!(
                count = response.load_balancer_descriptions().len(),
                "Raw describe_load_balancers page"
            );

            for description in response.load_balancer_descriptions() {
                balancers.push(membership_from_description(description)?);
            }

            match response.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(balancers)
    }

    /// Register instances with a load balancer in a single call
    pub async fn register_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: &[InstanceId],
    ) -> Result<()> {
        let response = self
            .client
            .register_instances_with_load_balancer()
            .load_balancer_name(load_balancer.as_str())
            .set_instances(Some(elb_instances(instance_ids)))
            .send()
            .await
            .with_context(|| format!("Failed to register instances with {load_balancer}"))?;

        info!(
            load_balancer = %load_balancer,
            registered = response.instances().len(),
            "Registered instances"
        );

        Ok(())
    }

    /// Health of the given instances as seen by a load balancer
    pub async fn describe_instance_health(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: &[InstanceId],
    ) -> Result<Vec<HealthStatus>> {
        let response = self
            .client
            .describe_instance_health()
            .load_balancer_name(load_balancer.as_str())
            .set_instances(Some(elb_instances(instance_ids)))
            .send()
            .await
            .with_context(|| format!("Failed to describe instance health on {load_balancer}"))?;

        response
            .instance_states()
            .iter()
            .map(health_from_state)
            .collect()
    }

    /// Deregister instances from a load balancer in a single call
    pub async fn deregister_instances(
        &self,
        load_balancer: &LoadBalancerName,
        instance_ids: &[InstanceId],
    ) -> Result<()> {
        let response = self
            .client
            .deregister_instances_from_load_balancer()
            .load_balancer_name(load_balancer.as_str())
            .set_instances(Some(elb_instances(instance_ids)))
            .send()
            .await
            .with_context(|| format!("Failed to deregister instances from {load_balancer}"))?;

        debug!(remaining = ?response.instances(), "Deregister response");

        Ok(())
    }
}
