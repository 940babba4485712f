//! Stage 5: take the old instances out of service

use super::progress::{DeployEvent, ProgressReporter};
use crate::aws::{Ec2Operations, ElbOperations};
use ami_rollover_common::{InstanceId, LoadBalancerName, display_ids};
use anyhow::Result;
use tracing::info;

/// Deregister `instance_ids` from `load_balancer`, then terminate them.
///
/// Termination is only requested after deregistration succeeded. Neither
/// step waits for the provider to finish.
pub async fn retire_instances<E: Ec2Operations, L: ElbOperations>(
    ec2: &E,
    elb: &L,
    load_balancer: &LoadBalancerName,
    instance_ids: &[InstanceId],
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.report(DeployEvent::Retiring {
        load_balancer: load_balancer.clone(),
        instances: instance_ids.to_vec(),
    });

    elb.deregister_instances(load_balancer, instance_ids.to_vec())
        .await?;
    info!(load_balancer = %load_balancer, instances = %display_ids(instance_ids), "Deregistered old instances");

    ec2.terminate_instances(instance_ids.to_vec()).await?;
    info!(instances = %display_ids(instance_ids), "Termination requested for old instances");

    Ok(())
}
