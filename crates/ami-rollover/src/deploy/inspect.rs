//! Stage 1: collect profiles of the running instances of the old image

use super::progress::{DeployEvent, ProgressReporter};
use crate::aws::Ec2Operations;
use ami_rollover_common::{ImageId, InstanceProfile};
use anyhow::Result;
use tracing::{debug, info};

/// Profiles of every running instance launched from `image`.
///
/// An empty list means there is nothing to migrate.
pub async fn inspect_image<E: Ec2Operations>(
    ec2: &E,
    image: &ImageId,
    progress: &dyn ProgressReporter,
) -> Result<Vec<InstanceProfile>> {
    progress.report(DeployEvent::Inspecting {
        image: image.clone(),
    });

    let profiles = ec2.describe_running_instances(image).await?;

    info!(image = %image, count = profiles.len(), "Collected running instances");
    debug!(profiles = ?profiles, "Trimmed result");

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ec2::MockEc2Operations;
    use crate::deploy::progress::recording::RecordingReporter;
    use ami_rollover_test_utils::{OLD_IMAGE, OLD_INSTANCE, old_profile};

    #[tokio::test]
    async fn test_returns_profiles_of_old_image() {
        let mut ec2 = MockEc2Operations::new();
        ec2.expect_describe_running_instances()
            .withf(|image| image.as_str() == OLD_IMAGE)
            .times(1)
            .returning(|_| Ok(vec![old_profile()]));
        let progress = RecordingReporter::default();

        let profiles = inspect_image(&ec2, &OLD_IMAGE.into(), &progress)
            .await
            .unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].instance_id.as_str(), OLD_INSTANCE);
        assert_eq!(
            progress.events(),
            vec![DeployEvent::Inspecting {
                image: OLD_IMAGE.into()
            }]
        );
    }

    #[tokio::test]
    async fn test_no_running_instances_is_empty_not_error() {
        let mut ec2 = MockEc2Operations::new();
        ec2.expect_describe_running_instances()
            .returning(|_| Ok(Vec::new()));

        let profiles = inspect_image(&ec2, &"ami-unused".into(), &RecordingReporter::default())
            .await
            .unwrap();

        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn test_provider_fault_propagates() {
        let mut ec2 = MockEc2Operations::new();
        ec2.expect_describe_running_instances()
            .returning(|_| Err(anyhow::anyhow!("UnauthorizedOperation: denied")));

        let err = inspect_image(&ec2, &OLD_IMAGE.into(), &RecordingReporter::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("UnauthorizedOperation"));
    }
}
