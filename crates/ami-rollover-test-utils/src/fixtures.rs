//! Typed provider data for unit tests
//!
//! The constants describe the reference scenario: image `ami-88888` runs one
//! instance `i-01fb1e7` behind `test-elb`, and `ami-12345` replaces it.

use ami_rollover_common::{
    HealthStatus, InstanceHealth, InstanceId, InstanceProfile, InstanceState, InstanceStatus,
    LoadBalancerMembership,
};

pub const OLD_IMAGE: &str = "ami-88888";
pub const NEW_IMAGE: &str = "ami-12345";
pub const OLD_INSTANCE: &str = "i-01fb1e7";
pub const LOAD_BALANCER: &str = "test-elb";

/// Profile of the old instance in the reference scenario
pub fn old_profile() -> InstanceProfile {
    InstanceProfile {
        instance_id: OLD_INSTANCE.into(),
        instance_type: "m5.xlarge".to_string(),
        key_name: Some("test-key".to_string()),
        security_group_ids: vec!["sg-54444".to_string()],
        subnet_id: "subnet-aaaaaa".to_string(),
    }
}

/// A profile with the given id and type and otherwise fixed attributes
pub fn profile(instance_id: &str, instance_type: &str) -> InstanceProfile {
    InstanceProfile {
        instance_id: instance_id.into(),
        instance_type: instance_type.to_string(),
        key_name: Some("test-key".to_string()),
        security_group_ids: vec!["sg-54444".to_string(), "sg-60000".to_string()],
        subnet_id: "subnet-aaaaaa".to_string(),
    }
}

pub fn ids(raw: &[&str]) -> Vec<InstanceId> {
    raw.iter().map(|id| InstanceId::from(*id)).collect()
}

pub fn membership(name: &str, instance_ids: &[&str]) -> LoadBalancerMembership {
    LoadBalancerMembership::new(name, ids(instance_ids))
}

/// State poll rows with every instance in `state`
pub fn statuses(instance_ids: &[&str], state: InstanceState) -> Vec<InstanceStatus> {
    instance_ids
        .iter()
        .map(|id| InstanceStatus::new(*id, state))
        .collect()
}

/// Health poll rows with every instance in `health`
pub fn health(instance_ids: &[&str], health: InstanceHealth) -> Vec<HealthStatus> {
    instance_ids
        .iter()
        .map(|id| HealthStatus::new(*id, health))
        .collect()
}
