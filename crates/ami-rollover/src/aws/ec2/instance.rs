//! EC2 instance lifecycle operations

use super::Ec2Client;
use ami_rollover_common::defaults::INSTANCES_PER_LAUNCH;
use ami_rollover_common::{ImageId, InstanceId, InstanceProfile, InstanceState, InstanceStatus};
use anyhow::{Context, Result};
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::operation::describe_instances::builders::DescribeInstancesFluentBuilder;
use aws_sdk_ec2::operation::run_instances::builders::RunInstancesFluentBuilder;
use aws_sdk_ec2::types::{Filter, Instance, InstanceType};
use tracing::{debug, info};

/// Capture the launch template of a described instance.
///
/// Instance id, type and subnet are required; a response without them is
/// treated as malformed. The key pair is optional.
pub fn profile_from_instance(instance: &Instance) -> Result<InstanceProfile> {
    let instance_id = instance
        .instance_id()
        .context("Described instance has no instance ID")?;

    let instance_type = instance
        .instance_type()
        .with_context(|| format!("Instance {instance_id} has no instance type"))?;

    let subnet_id = instance
        .subnet_id()
        .with_context(|| format!("Instance {instance_id} has no subnet ID"))?;

    let security_group_ids = instance
        .security_groups()
        .iter()
        .filter_map(|sg| sg.group_id())
        .map(str::to_string)
        .collect();

    Ok(InstanceProfile {
        instance_id: instance_id.into(),
        instance_type: instance_type.as_str().to_string(),
        key_name: instance.key_name().map(str::to_string),
        security_group_ids,
        subnet_id: subnet_id.to_string(),
    })
}

/// `DescribeInstances` filters selecting the running instances of `image`
pub fn running_instance_filters(image: &ImageId) -> Vec<Filter> {
    vec![
        Filter::builder()
            .name("image-id")
            .values(image.as_str())
            .build(),
        Filter::builder()
            .name("instance-state-name")
            .values("running")
            .build(),
    ]
}

/// Profiles of every instance of every reservation in one result page,
/// plus the token of the next page if there is one.
pub fn profiles_from_page(
    page: &DescribeInstancesOutput,
) -> Result<(Vec<InstanceProfile>, Option<String>)> {
    let profiles = page
        .reservations()
        .iter()
        .flat_map(|r| r.instances())
        .map(profile_from_instance)
        .collect::<Result<Vec<_>>>()?;

    let next_token = page
        .next_token()
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    Ok((profiles, next_token))
}

impl Ec2Client {
    fn describe_running_request(
        &self,
        image: &ImageId,
        next_token: Option<String>,
    ) -> DescribeInstancesFluentBuilder {
        self.client
            .describe_instances()
            .set_filters(Some(running_instance_filters(image)))
            .set_next_token(next_token)
    }

    fn run_instance_request(
        &self,
        image: &ImageId,
        profile: &InstanceProfile,
    ) -> RunInstancesFluentBuilder {
        let request = self
            .client
            .run_instances()
            .image_id(image.as_str())
            .instance_type(InstanceType::from(profile.instance_type.as_str()))
            .subnet_id(&profile.subnet_id)
            .min_count(INSTANCES_PER_LAUNCH)
            .max_count(INSTANCES_PER_LAUNCH)
            .set_key_name(profile.key_name.clone());

        if profile.security_group_ids.is_empty() {
            request
        } else {
            request.set_security_group_ids(Some(profile.security_group_ids.clone()))
        }
    }

    /// Profiles of all running instances launched from `image`.
    ///
    /// Follows `NextToken` pagination. No matches is an empty list, not an
    /// error.
    pub async fn describe_running_instances(&self, image: &ImageId) -> Result<Vec<InstanceProfile>> {
        let mut profiles = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .describe_running_request(image, next_token.take())
                .send()
                .await
                .with_context(|| format!("Failed to describe instances of image {image}"))?;

            debug!(
                image = %image,
                reservations = response.reservations().len(),
                "Raw describe_instances page"
            );

            let (page, next) = profiles_from_page(&response)?;
            for profile in page {
                info!(instance_id = %profile.instance_id, "Added instance to the list");
                profiles.push(profile);
            }

            match next {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(profiles)
    }

    /// Launch one instance of `image` with the attributes of `profile`
    pub async fn run_instance(&self, image: &ImageId, profile: &InstanceProfile) -> Result<InstanceId> {
        info!(
            image = %image,
            instance_type = %profile.instance_type,
            subnet_id = %profile.subnet_id,
            replaces = %profile.instance_id,
            "Launching instance"
        );

        let response = self
            .run_instance_request(image, profile)
            .send()
            .await
            .with_context(|| format!("Failed to launch replacement for {}", profile.instance_id))?;

        let instance_id = response
            .instances()
            .first()
            .context("No instance returned")?
            .instance_id()
            .context("No instance ID")?;

        info!(instance_id = %instance_id, "Instance launched");

        Ok(instance_id.into())
    }

    /// Current lifecycle state of each given instance.
    ///
    /// Instances without a reported state are treated as `pending`.
    pub async fn describe_instance_states(
        &self,
        instance_ids: &[InstanceId],
    ) -> Result<Vec<InstanceStatus>> {
        if instance_ids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .describe_instances()
            .set_instance_ids(Some(instance_ids.iter().map(|id| id.to_string()).collect()))
            .send()
            .await
            .context("Failed to describe instance states")?;

        let statuses = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(|instance| {
                let id = instance.instance_id()?;
                let state = instance
                    .state()
                    .and_then(|s| s.name())
                    .map(|name| InstanceState::from_provider(name.as_str()))
                    .unwrap_or(InstanceState::Pending);
                Some(InstanceStatus::new(id, state))
            })
            .collect();

        Ok(statuses)
    }

    /// Terminate multiple instances in a single API call
    pub async fn terminate_instances(&self, instance_ids: &[InstanceId]) -> Result<()> {
        if instance_ids.is_empty() {
            return Ok(());
        }

        info!(count = instance_ids.len(), "Terminating instances in batch");

        let response = self
            .client
            .terminate_instances()
            .set_instance_ids(Some(instance_ids.iter().map(|id| id.to_string()).collect()))
            .send()
            .await
            .context("Failed to terminate instances")?;

        debug!(response = ?response.terminating_instances(), "Terminate response");

        Ok(())
    }
}
