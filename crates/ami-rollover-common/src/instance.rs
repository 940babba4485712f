//! Instance profiles and lifecycle states

use crate::ids::InstanceId;
use serde::{Deserialize, Serialize};

/// Launch template captured from a running instance of the old image.
///
/// Built once from the describe response and never modified; the
/// replacement instance is launched with exactly these attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceProfile {
    /// Instance the profile was captured from
    pub instance_id: InstanceId,
    /// EC2 instance type (e.g. "m5.xlarge")
    pub instance_type: String,
    /// Key pair name, if the instance was launched with one
    pub key_name: Option<String>,
    /// Security group ids in the order the provider reported them
    pub security_group_ids: Vec<String>,
    /// VPC subnet id
    pub subnet_id: String,
}

/// EC2 instance lifecycle state
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
pub enum InstanceState {
    #[strum(serialize = "pending")]
    Pending,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "shutting-down")]
    ShuttingDown,
    #[strum(serialize = "terminated")]
    Terminated,
    #[strum(serialize = "stopping")]
    Stopping,
    #[strum(serialize = "stopped")]
    Stopped,
    /// State string the provider added after this enum was written
    #[strum(serialize = "unknown")]
    Unknown,
}

impl InstanceState {
    /// Parse a provider state name, mapping unrecognized values to `Unknown`
    pub fn from_provider(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }

    /// Whether an instance in this state can no longer become `running`
    /// without outside intervention.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ShuttingDown | Self::Terminated | Self::Stopping | Self::Stopped
        )
    }
}

/// One row of an instance state poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    pub instance_id: InstanceId,
    pub state: InstanceState,
}

impl InstanceStatus {
    pub fn new(instance_id: impl Into<InstanceId>, state: InstanceState) -> Self {
        Self {
            instance_id: instance_id.into(),
            state,
        }
    }
}
