//! Load balancer membership and health types

use crate::ids::{InstanceId, LoadBalancerName};
use std::collections::HashSet;

/// A described load balancer together with its registered instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerMembership {
    pub name: LoadBalancerName,
    pub instance_ids: Vec<InstanceId>,
}

impl LoadBalancerMembership {
    pub fn new(name: impl Into<LoadBalancerName>, instance_ids: Vec<InstanceId>) -> Self {
        Self {
            name: name.into(),
            instance_ids,
        }
    }

    /// Whether any of `wanted` is registered with this load balancer
    pub fn serves_any(&self, wanted: &HashSet<&InstanceId>) -> bool {
        self.instance_ids.iter().any(|id| wanted.contains(id))
    }
}

/// Per-instance health as reported by the load balancer
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum InstanceHealth {
    InService,
    OutOfService,
    Unknown,
}

impl InstanceHealth {
    /// Parse a provider health string, mapping unrecognized values to `Unknown`
    pub fn from_provider(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }
}

/// One row of a health poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub instance_id: InstanceId,
    pub health: InstanceHealth,
    pub reason_code: Option<String>,
    pub description: Option<String>,
}

impl HealthStatus {
    pub fn new(instance_id: impl Into<InstanceId>, health: InstanceHealth) -> Self {
        Self {
            instance_id: instance_id.into(),
            health,
            reason_code: None,
            description: None,
        }
    }

    pub fn is_in_service(&self) -> bool {
        self.health == InstanceHealth::InService
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serves_any_checks_intersection() {
        let lb = LoadBalancerMembership::new("web", vec!["i-1".into(), "i-2".into()]);
        let hit = InstanceId::from("i-2");
        let miss = InstanceId::from("i-9");

        assert!(lb.serves_any(&HashSet::from([&hit])));
        assert!(!lb.serves_any(&HashSet::from([&miss])));
        assert!(!lb.serves_any(&HashSet::new()));
    }

    #[test]
    fn test_parses_health_states() {
        assert_eq!(InstanceHealth::from_provider("InService"), InstanceHealth::InService);
        assert_eq!(
            InstanceHealth::from_provider("OutOfService"),
            InstanceHealth::OutOfService
        );
        assert_eq!(InstanceHealth::from_provider("Draining"), InstanceHealth::Unknown);
    }

    #[test]
    fn test_in_service_predicate() {
        assert!(HealthStatus::new("i-1", InstanceHealth::InService).is_in_service());
        assert!(!HealthStatus::new("i-1", InstanceHealth::OutOfService).is_in_service());
    }
}
