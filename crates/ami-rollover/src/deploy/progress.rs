//! Progress reporting for the deploy stages
//!
//! Stages emit [`DeployEvent`]s to a [`ProgressReporter`] handed to the
//! [`Deployer`](super::Deployer) at construction. The CLI prints them as
//! human-readable lines; tests record them.

use ami_rollover_common::{ImageId, InstanceId, LoadBalancerName, display_ids};

/// Event emitted by a deploy stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// Looking up running instances of the old image
    Inspecting { image: ImageId },
    /// The load balancer serving the old instances was found
    LoadBalancerLocated {
        load_balancer: LoadBalancerName,
        instances: Vec<InstanceId>,
    },
    /// No load balancer has any of the old instances registered
    NoLoadBalancer { instances: Vec<InstanceId> },
    /// Replacements launched, waiting for them to run
    WaitingForRunning { instances: Vec<InstanceId> },
    /// All replacements are running
    Launched {
        image: ImageId,
        instances: Vec<InstanceId>,
    },
    /// Replacements registered, waiting for health checks
    WaitingForHealth { load_balancer: LoadBalancerName },
    /// Health checks did not pass; old instances are kept
    HealthCheckFailed { reason: String },
    /// Deregistering and terminating the old instances
    Retiring {
        load_balancer: LoadBalancerName,
        instances: Vec<InstanceId>,
    },
}

/// Sink for deploy progress
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: DeployEvent);
}

/// Progress reporter that prints one line per event to stdout
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl StdoutReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for StdoutReporter {
    fn report(&self, event: DeployEvent) {
        println!("### {} ###\n", render(&event));
    }
}

/// Human-readable progress line for an event
pub fn render(event: &DeployEvent) -> String {
    match event {
        DeployEvent::Inspecting { image } => {
            format!("Gathering information from image {image}.")
        }
        DeployEvent::LoadBalancerLocated {
            load_balancer,
            instances,
        } => format!(
            "ELB name {load_balancer} is being used for instances {}.",
            display_ids(instances)
        ),
        DeployEvent::NoLoadBalancer { instances } => format!(
            "No ELB is being used for instances {}.",
            display_ids(instances)
        ),
        DeployEvent::WaitingForRunning { instances } => format!(
            "Wait for newly launched instances {} state change to running.",
            display_ids(instances)
        ),
        DeployEvent::Launched { image, instances } => format!(
            "Instances launched based on AMI {image} are {}.",
            display_ids(instances)
        ),
        DeployEvent::WaitingForHealth { load_balancer } => {
            format!("Wait for registered instances to pass health checks on {load_balancer}.")
        }
        DeployEvent::HealthCheckFailed { reason } => {
            format!("Health checks did not pass, keeping old instances: {reason}")
        }
        DeployEvent::Retiring {
            load_balancer,
            instances,
        } => format!(
            "Deregister from ELB {load_balancer} and terminate instances {}",
            display_ids(instances)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_located_balancer() {
        let line = render(&DeployEvent::LoadBalancerLocated {
            load_balancer: "test-elb".into(),
            instances: vec!["i-01fb1e7".into()],
        });
        assert_eq!(
            line,
            "ELB name test-elb is being used for instances [i-01fb1e7]."
        );
    }

    #[test]
    fn test_renders_missing_balancer() {
        let line = render(&DeployEvent::NoLoadBalancer {
            instances: vec!["i-1".into()],
        });
        assert_eq!(line, "No ELB is being used for instances [i-1].");
    }

    #[test]
    fn test_renders_retirement() {
        let line = render(&DeployEvent::Retiring {
            load_balancer: "test-elb".into(),
            instances: vec!["i-1".into(), "i-2".into()],
        });
        assert!(line.contains("test-elb"));
        assert!(line.ends_with("[i-1, i-2]"));
    }
}
