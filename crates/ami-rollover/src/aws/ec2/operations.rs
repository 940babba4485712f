//! EC2 operations trait for testing

use super::Ec2Client;
use ami_rollover_common::{ImageId, InstanceId, InstanceProfile, InstanceStatus};
use anyhow::Result;

/// Trait for EC2 operations that can be mocked in tests.
///
/// This trait abstracts the EC2 client operations to enable unit testing
/// of the deploy stages without hitting real AWS.
///
/// Note: Lists of ids are passed as owned `Vec`s to work around mockall
/// lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait Ec2Operations: Send + Sync {
    /// Profiles of all running instances launched from `image`
    async fn describe_running_instances(&self, image: &ImageId) -> Result<Vec<InstanceProfile>>;

    /// Launch one instance of `image` configured like `profile`
    async fn run_instance(&self, image: &ImageId, profile: &InstanceProfile)
    -> Result<InstanceId>;

    /// Current lifecycle state of each given instance
    async fn describe_instance_states(
        &self,
        instance_ids: Vec<InstanceId>,
    ) -> Result<Vec<InstanceStatus>>;

    /// Request termination of the given instances in a single call
    async fn terminate_instances(&self, instance_ids: Vec<InstanceId>) -> Result<()>;
}

impl Ec2Operations for Ec2Client {
    async fn describe_running_instances(&self, image: &ImageId) -> Result<Vec<InstanceProfile>> {
        Ec2Client::describe_running_instances(self, image).await
    }

    async fn run_instance(
        &self,
        image: &ImageId,
        profile: &InstanceProfile,
    ) -> Result<InstanceId> {
        Ec2Client::run_instance(self, image, profile).await
    }

    async fn describe_instance_states(
        &self,
        instance_ids: Vec<InstanceId>,
    ) -> Result<Vec<InstanceStatus>> {
        Ec2Client::describe_instance_states(self, &instance_ids).await
    }

    async fn terminate_instances(&self, instance_ids: Vec<InstanceId>) -> Result<()> {
        Ec2Client::terminate_instances(self, &instance_ids).await
    }
}
