//! Deploy failures that are not provider faults

use ami_rollover_common::{ImageId, InstanceId, InstanceState, display_ids};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    /// Old and new image are the same; rejected before any network call
    #[error("Both image ids cannot be the same: {image}")]
    IdenticalImages { image: ImageId },

    /// No load balancer has any of the old instances registered
    #[error("No load balancer found for instances: {}", display_ids(.instances))]
    NoLoadBalancer { instances: Vec<InstanceId> },

    /// A freshly launched instance left the path to `running`
    #[error("Instance {instance_id} entered state {state} while waiting for it to run")]
    InstanceNotRunning {
        instance_id: InstanceId,
        state: InstanceState,
    },
}
