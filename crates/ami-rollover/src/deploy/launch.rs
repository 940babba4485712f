//! Stage 3: launch one replacement per old instance and wait for them to run

use super::error::DeployError;
use super::progress::{DeployEvent, ProgressReporter};
use crate::aws::{Ec2Operations, classify_anyhow_error};
use crate::wait::{WaitConfig, wait_for_resource};
use ami_rollover_common::{ImageId, InstanceId, InstanceProfile, InstanceState, display_ids};
use anyhow::Result;
use tracing::{debug, info, warn};

/// Launch a replacement for every profile from `image`, preserving order,
/// then block until all of them are running.
///
/// Launch requests are issued one at a time. A launched instance that ends
/// up in a terminal state, or a wait that exhausts `wait`, fails the stage;
/// instances launched so far are left as they are.
pub async fn launch_replacements<E: Ec2Operations>(
    ec2: &E,
    image: &ImageId,
    profiles: &[InstanceProfile],
    wait: &WaitConfig,
    progress: &dyn ProgressReporter,
) -> Result<Vec<InstanceId>> {
    if profiles.is_empty() {
        return Ok(Vec::new());
    }

    let mut launched = Vec::with_capacity(profiles.len());
    for profile in profiles {
        launched.push(ec2.run_instance(image, profile).await?);
    }

    progress.report(DeployEvent::WaitingForRunning {
        instances: launched.clone(),
    });
    debug!(
        interval_secs = wait.interval.as_secs(),
        max_wait_secs = wait.max_wait().as_secs(),
        "Waiting for launched instances to run"
    );

    let attempts = wait_for_resource(
        wait,
        || poll_running(ec2, &launched),
        &format!("instances {} running", display_ids(&launched)),
    )
    .await
    .map_err(|e| e.into_anyhow())?;

    info!(instances = %display_ids(&launched), attempts, "Newly launched instances are running");
    progress.report(DeployEvent::Launched {
        image: image.clone(),
        instances: launched.clone(),
    });

    Ok(launched)
}

/// One running-state check: ready when every id is reported `running`.
async fn poll_running<E: Ec2Operations>(ec2: &E, instance_ids: &[InstanceId]) -> Result<bool> {
    let statuses = match ec2.describe_instance_states(instance_ids.to_vec()).await {
        Ok(statuses) => statuses,
        Err(e) if classify_anyhow_error(&e).is_retryable() => {
            warn!(error = %e, "Instance state not available yet, retrying");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    if let Some(failed) = statuses.iter().find(|s| s.state.is_terminal()) {
        return Err(DeployError::InstanceNotRunning {
            instance_id: failed.instance_id.clone(),
            state: failed.state,
        }
        .into());
    }

    let running = instance_ids
        .iter()
        .filter(|id| {
            statuses
                .iter()
                .any(|s| &s.instance_id == *id && s.state == InstanceState::Running)
        })
        .count();
    debug!(running, total = instance_ids.len(), "Polled instance states");

    Ok(running == instance_ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ec2::MockEc2Operations;
    use crate::deploy::progress::recording::RecordingReporter;
    use ami_rollover_common::InstanceStatus;
    use ami_rollover_test_utils::{NEW_IMAGE, ids, profile, statuses};
    use std::time::Duration;

    fn fast_wait(max_attempts: u32) -> WaitConfig {
        WaitConfig::new(Duration::from_millis(1), max_attempts)
    }

    /// Launches hand out `i-new-<n>` in call order
    fn expect_launches(ec2: &mut MockEc2Operations, count: usize) {
        let mut next = 0;
        ec2.expect_run_instance()
            .times(count)
            .returning(move |_, _| {
                next += 1;
                Ok(InstanceId::from(format!("i-new-{next}")))
            });
    }

    #[tokio::test]
    async fn test_launches_one_instance_per_profile_in_order() {
        let mut ec2 = MockEc2Operations::new();
        let mut seq = mockall::Sequence::new();
        ec2.expect_run_instance()
            .withf(|image, p| image.as_str() == NEW_IMAGE && p.instance_id.as_str() == "i-a")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("i-new-a".into()));
        ec2.expect_run_instance()
            .withf(|image, p| image.as_str() == NEW_IMAGE && p.instance_id.as_str() == "i-b")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("i-new-b".into()));
        ec2.expect_describe_instance_states()
            .returning(|_| Ok(statuses(&["i-new-a", "i-new-b"], InstanceState::Running)));
        let progress = RecordingReporter::default();

        let launched = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro"), profile("i-b", "t2.micro")],
            &fast_wait(3),
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(launched, ids(&["i-new-a", "i-new-b"]));
        assert_eq!(
            progress.events().last(),
            Some(&DeployEvent::Launched {
                image: NEW_IMAGE.into(),
                instances: ids(&["i-new-a", "i-new-b"]),
            })
        );
    }

    #[tokio::test]
    async fn test_profile_is_passed_verbatim() {
        let mut ec2 = MockEc2Operations::new();
        let template = profile("i-a", "t2.micro");
        let expected = template.clone();
        ec2.expect_run_instance()
            .withf(move |_, p| *p == expected)
            .times(1)
            .returning(|_, _| Ok("i-new".into()));
        ec2.expect_describe_instance_states()
            .returning(|_| Ok(statuses(&["i-new"], InstanceState::Running)));

        launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[template],
            &fast_wait(1),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_waits_until_all_running() {
        let mut ec2 = MockEc2Operations::new();
        expect_launches(&mut ec2, 2);
        let mut polls = 0;
        ec2.expect_describe_instance_states()
            .withf(|requested| *requested == ids(&["i-new-1", "i-new-2"]))
            .times(3)
            .returning(move |_| {
                polls += 1;
                let second = if polls < 3 {
                    InstanceState::Pending
                } else {
                    InstanceState::Running
                };
                Ok(vec![
                    InstanceStatus::new("i-new-1", InstanceState::Running),
                    InstanceStatus::new("i-new-2", second),
                ])
            });

        let launched = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro"), profile("i-b", "t2.micro")],
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert_eq!(launched.len(), 2);
    }

    #[tokio::test]
    async fn test_not_yet_visible_instance_is_retried() {
        let mut ec2 = MockEc2Operations::new();
        expect_launches(&mut ec2, 1);
        let mut polls = 0;
        ec2.expect_describe_instance_states()
            .times(2)
            .returning(move |_| {
                polls += 1;
                if polls == 1 {
                    Err(anyhow::anyhow!(
                        "InvalidInstanceID.NotFound: The instance ID 'i-new-1' does not exist"
                    ))
                } else {
                    Ok(statuses(&["i-new-1"], InstanceState::Running))
                }
            });

        let launched = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro")],
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert_eq!(launched, ids(&["i-new-1"]));
    }

    #[tokio::test]
    async fn test_terminal_state_fails_immediately() {
        let mut ec2 = MockEc2Operations::new();
        expect_launches(&mut ec2, 1);
        ec2.expect_describe_instance_states()
            .times(1)
            .returning(|_| Ok(statuses(&["i-new-1"], InstanceState::Terminated)));

        let err = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro")],
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::InstanceNotRunning {
                state: InstanceState::Terminated,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_wait_exhaustion_is_fatal() {
        let mut ec2 = MockEc2Operations::new();
        expect_launches(&mut ec2, 1);
        ec2.expect_describe_instance_states()
            .times(3)
            .returning(|_| Ok(statuses(&["i-new-1"], InstanceState::Pending)));

        let err = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro")],
            &fast_wait(3),
            &RecordingReporter::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let mut ec2 = MockEc2Operations::new();
        ec2.expect_run_instance()
            .returning(|_, _| Err(anyhow::anyhow!("InvalidAMIID.NotFound: no such image")));
        ec2.expect_describe_instance_states().never();

        let result = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[profile("i-a", "t2.micro")],
            &fast_wait(3),
            &RecordingReporter::default(),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_nothing_to_launch() {
        let mut ec2 = MockEc2Operations::new();
        ec2.expect_run_instance().never();
        ec2.expect_describe_instance_states().never();

        let launched = launch_replacements(
            &ec2,
            &NEW_IMAGE.into(),
            &[],
            &fast_wait(3),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert!(launched.is_empty());
    }
}
