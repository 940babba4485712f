//! Stage 4: register replacements with the load balancer and wait for health

use super::progress::{DeployEvent, ProgressReporter};
use crate::aws::{ElbOperations, classify_anyhow_error};
use crate::wait::{WaitConfig, wait_for_resource};
use ami_rollover_common::{InstanceId, LoadBalancerName, display_ids};
use anyhow::Result;
use tracing::{debug, error, info, warn};

/// Register `instance_ids` with `load_balancer` and wait until every one of
/// them is `InService`.
///
/// A rejected registration request is an error. Anything that goes wrong
/// while waiting, including the wait running out, yields `Ok(false)` so the
/// caller keeps the old instances in service.
pub async fn register_and_wait<L: ElbOperations>(
    elb: &L,
    load_balancer: &LoadBalancerName,
    instance_ids: &[InstanceId],
    wait: &WaitConfig,
    progress: &dyn ProgressReporter,
) -> Result<bool> {
    if instance_ids.is_empty() {
        warn!(load_balancer = %load_balancer, "No instances to register");
        return Ok(false);
    }

    elb.register_instances(load_balancer, instance_ids.to_vec())
        .await?;
    progress.report(DeployEvent::WaitingForHealth {
        load_balancer: load_balancer.clone(),
    });
    debug!(
        interval_secs = wait.interval.as_secs(),
        max_wait_secs = wait.max_wait().as_secs(),
        "Waiting for registered instances to pass health checks"
    );

    let outcome = wait_for_resource(
        wait,
        || poll_health(elb, load_balancer, instance_ids),
        &format!("instances {} in service on {load_balancer}", display_ids(instance_ids)),
    )
    .await;

    match outcome {
        Ok(attempts) => {
            info!(load_balancer = %load_balancer, attempts, "Registered instances are in service");
            Ok(true)
        }
        Err(e) if e.is_timeout() => {
            error!(load_balancer = %load_balancer, error = %e, "Health checks did not pass in time");
            progress.report(DeployEvent::HealthCheckFailed {
                reason: e.to_string(),
            });
            Ok(false)
        }
        Err(e) => {
            error!(load_balancer = %load_balancer, error = ?e, "Health polling failed");
            progress.report(DeployEvent::HealthCheckFailed {
                reason: e.to_string(),
            });
            Ok(false)
        }
    }
}

/// One health check: ready when every id is reported `InService`.
async fn poll_health<L: ElbOperations>(
    elb: &L,
    load_balancer: &LoadBalancerName,
    instance_ids: &[InstanceId],
) -> Result<bool> {
    let rows = match elb
        .describe_instance_health(load_balancer, instance_ids.to_vec())
        .await
    {
        Ok(rows) => rows,
        Err(e) if classify_anyhow_error(&e).is_retryable() => {
            warn!(error = %e, "Instance health not available yet, retrying");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let in_service = instance_ids
        .iter()
        .filter(|id| {
            rows.iter()
                .any(|row| &row.instance_id == *id && row.is_in_service())
        })
        .count();
    debug!(in_service, total = instance_ids.len(), "Polled instance health");

    Ok(in_service == instance_ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::elb::MockElbOperations;
    use crate::deploy::progress::recording::RecordingReporter;
    use ami_rollover_common::{HealthStatus, InstanceHealth};
    use ami_rollover_test_utils::{LOAD_BALANCER, health, ids};
    use std::time::Duration;

    fn fast_wait(max_attempts: u32) -> WaitConfig {
        WaitConfig::new(Duration::from_millis(1), max_attempts)
    }

    fn registers_once(elb: &mut MockElbOperations) {
        elb.expect_register_instances()
            .withf(|lb, requested| {
                lb.as_str() == LOAD_BALANCER && *requested == ids(&["i-new-1", "i-new-2"])
            })
            .times(1)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_healthy_after_a_few_polls() {
        let mut elb = MockElbOperations::new();
        registers_once(&mut elb);
        let mut polls = 0;
        elb.expect_describe_instance_health()
            .times(2)
            .returning(move |_, _| {
                polls += 1;
                let second = if polls == 1 {
                    InstanceHealth::OutOfService
                } else {
                    InstanceHealth::InService
                };
                Ok(vec![
                    HealthStatus::new("i-new-1", InstanceHealth::InService),
                    HealthStatus::new("i-new-2", second),
                ])
            });
        let progress = RecordingReporter::default();

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1", "i-new-2"]),
            &fast_wait(5),
            &progress,
        )
        .await
        .unwrap();

        assert!(healthy);
        assert_eq!(
            progress.events(),
            vec![DeployEvent::WaitingForHealth {
                load_balancer: LOAD_BALANCER.into()
            }]
        );
    }

    #[tokio::test]
    async fn test_never_healthy_is_false() {
        let mut elb = MockElbOperations::new();
        registers_once(&mut elb);
        elb.expect_describe_instance_health()
            .times(3)
            .returning(|_, _| Ok(health(&["i-new-1", "i-new-2"], InstanceHealth::OutOfService)));
        let progress = RecordingReporter::default();

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1", "i-new-2"]),
            &fast_wait(3),
            &progress,
        )
        .await
        .unwrap();

        assert!(!healthy);
        assert!(matches!(
            progress.events().last(),
            Some(DeployEvent::HealthCheckFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_in_service() {
        let mut elb = MockElbOperations::new();
        registers_once(&mut elb);
        elb.expect_describe_instance_health()
            .times(2)
            .returning(|_, _| Ok(health(&["i-new-1"], InstanceHealth::InService)));

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1", "i-new-2"]),
            &fast_wait(2),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert!(!healthy);
    }

    #[tokio::test]
    async fn test_provider_fault_while_polling_is_false() {
        let mut elb = MockElbOperations::new();
        registers_once(&mut elb);
        elb.expect_describe_instance_health()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("AccessDenied: not allowed")));

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1", "i-new-2"]),
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert!(!healthy);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_retried() {
        let mut elb = MockElbOperations::new();
        registers_once(&mut elb);
        let mut polls = 0;
        elb.expect_describe_instance_health()
            .times(2)
            .returning(move |_, _| {
                polls += 1;
                if polls == 1 {
                    Err(anyhow::anyhow!("InvalidInstance: instance not registered yet"))
                } else {
                    Ok(health(&["i-new-1", "i-new-2"], InstanceHealth::InService))
                }
            });

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1", "i-new-2"]),
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert!(healthy);
    }

    #[tokio::test]
    async fn test_rejected_registration_is_an_error() {
        let mut elb = MockElbOperations::new();
        elb.expect_register_instances()
            .returning(|_, _| Err(anyhow::anyhow!("LoadBalancerNotFound: gone")));
        elb.expect_describe_instance_health().never();

        let result = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &ids(&["i-new-1"]),
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_set_is_not_healthy() {
        let mut elb = MockElbOperations::new();
        elb.expect_register_instances().never();

        let healthy = register_and_wait(
            &elb,
            &LOAD_BALANCER.into(),
            &[],
            &fast_wait(5),
            &RecordingReporter::default(),
        )
        .await
        .unwrap();

        assert!(!healthy);
    }
}
