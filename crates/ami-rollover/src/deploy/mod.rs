//! Blue/green replacement of the instances of one image
//!
//! A run is a fixed sequence of stages, each in its own module:
//!
//! 1. [`inspect`]: profiles of the running instances of the old image
//! 2. [`locate`]: the load balancer serving them
//! 3. [`launch`]: one replacement per profile, waited on until running
//! 4. [`register`]: replacements added to the load balancer, waited on until healthy
//! 5. [`retire`]: old instances deregistered and terminated, only after 4 succeeded
//!
//! Stages 1 and 2 only read, and together form the [`DeployPlan`].

pub mod error;
pub mod inspect;
pub mod launch;
pub mod locate;
pub mod progress;
pub mod register;
pub mod retire;

pub use error::DeployError;
pub use inspect::inspect_image;
pub use launch::launch_replacements;
pub use locate::locate_load_balancer;
pub use progress::{DeployEvent, ProgressReporter, StdoutReporter, render};
pub use register::register_and_wait;
pub use retire::retire_instances;

use crate::aws::{Ec2Operations, ElbOperations};
use crate::config::{ImagePair, WaitSettings};
use ami_rollover_common::{ImageId, InstanceId, InstanceProfile, LoadBalancerName};
use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

/// What a run would change, as discovered by the read-only stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployPlan {
    pub old_image: ImageId,
    pub new_image: ImageId,
    pub load_balancer: LoadBalancerName,
    /// One entry per old instance, each the template of its replacement
    pub profiles: Vec<InstanceProfile>,
}

impl DeployPlan {
    pub fn old_instance_ids(&self) -> Vec<InstanceId> {
        self.profiles.iter().map(|p| p.instance_id.clone()).collect()
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub load_balancer: LoadBalancerName,
    pub old_instances: Vec<InstanceId>,
    pub new_instances: Vec<InstanceId>,
    /// Every replacement passed the load balancer health checks
    pub healthy: bool,
    /// Old instances were deregistered and terminated
    pub retired: bool,
}

/// Runs the deploy stages against the given provider clients
pub struct Deployer<E, L, P> {
    ec2: E,
    elb: L,
    waits: WaitSettings,
    progress: P,
}

impl<E, L, P> Deployer<E, L, P>
where
    E: Ec2Operations,
    L: ElbOperations,
    P: ProgressReporter,
{
    pub fn new(ec2: E, elb: L, waits: WaitSettings, progress: P) -> Self {
        Self {
            ec2,
            elb,
            waits,
            progress,
        }
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Run the read-only stages: find the old instances and their load balancer.
    pub async fn plan(&self, images: &ImagePair) -> Result<DeployPlan> {
        let profiles = inspect_image(&self.ec2, images.old_image(), &self.progress).await?;
        let old_ids: Vec<InstanceId> = profiles.iter().map(|p| p.instance_id.clone()).collect();
        let load_balancer = locate_load_balancer(&self.elb, &old_ids, &self.progress).await?;

        Ok(DeployPlan {
            old_image: images.old_image().clone(),
            new_image: images.new_image().clone(),
            load_balancer,
            profiles,
        })
    }

    /// Run every stage.
    ///
    /// The old instances are retired only when all replacements became
    /// healthy. Otherwise both generations are left running and the report
    /// says so; nothing is rolled back.
    pub async fn run(&self, images: &ImagePair) -> Result<DeployReport> {
        let plan = self.plan(images).await?;
        let old_instances = plan.old_instance_ids();

        let new_instances = launch_replacements(
            &self.ec2,
            &plan.new_image,
            &plan.profiles,
            &self.waits.running,
            &self.progress,
        )
        .await?;

        let healthy = register_and_wait(
            &self.elb,
            &plan.load_balancer,
            &new_instances,
            &self.waits.health,
            &self.progress,
        )
        .await?;

        if healthy {
            retire_instances(
                &self.ec2,
                &self.elb,
                &plan.load_balancer,
                &old_instances,
                &self.progress,
            )
            .await?;
            info!(load_balancer = %plan.load_balancer, "Deploy complete");
        } else {
            warn!(
                load_balancer = %plan.load_balancer,
                "Replacements are not healthy; old instances left in service"
            );
        }

        Ok(DeployReport {
            load_balancer: plan.load_balancer,
            old_instances,
            new_instances,
            healthy,
            retired: healthy,
        })
    }
}
