//! Stage 2: find the load balancer serving the old instances

use super::error::DeployError;
use super::progress::{DeployEvent, ProgressReporter};
use crate::aws::ElbOperations;
use ami_rollover_common::{InstanceId, LoadBalancerName};
use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Name of the load balancer with any of `instance_ids` registered.
///
/// Load balancers are scanned in the order the provider lists them and the
/// last one that matches is used. Fails with [`DeployError::NoLoadBalancer`]
/// when none matches, which is always the case for an empty id list.
pub async fn locate_load_balancer<L: ElbOperations>(
    elb: &L,
    instance_ids: &[InstanceId],
    progress: &dyn ProgressReporter,
) -> Result<LoadBalancerName> {
    let wanted: HashSet<&InstanceId> = instance_ids.iter().collect();

    let balancers = elb.describe_load_balancers().await?;
    debug!(count = balancers.len(), "Described load balancers");

    let candidates: Vec<&LoadBalancerName> = balancers
        .iter()
        .filter(|lb| lb.serves_any(&wanted))
        .map(|lb| &lb.name)
        .collect();

    let Some(&chosen) = candidates.last() else {
        progress.report(DeployEvent::NoLoadBalancer {
            instances: instance_ids.to_vec(),
        });
        return Err(DeployError::NoLoadBalancer {
            instances: instance_ids.to_vec(),
        }
        .into());
    };

    if candidates.len() > 1 {
        warn!(
            candidates = ?candidates.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            chosen = %chosen,
            "Several load balancers serve the old instances; using the last one listed"
        );
    }

    info!(load_balancer = %chosen, "ELB name");
    progress.report(DeployEvent::LoadBalancerLocated {
        load_balancer: chosen.clone(),
        instances: instance_ids.to_vec(),
    });

    Ok(chosen.clone())
}
