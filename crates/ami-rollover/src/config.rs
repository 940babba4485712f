//! Configuration types for a deploy run

use crate::deploy::DeployError;
use crate::wait::WaitConfig;
use ami_rollover_common::ImageId;
use ami_rollover_common::defaults::{
    DEFAULT_HEALTH_INTERVAL_SECS, DEFAULT_HEALTH_MAX_ATTEMPTS, DEFAULT_RUNNING_INTERVAL_SECS,
    DEFAULT_RUNNING_MAX_ATTEMPTS,
};
use std::time::Duration;

/// The image being replaced and its replacement.
///
/// Construction fails when both ids are equal, so a value of this type is
/// always a meaningful migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    old: ImageId,
    new: ImageId,
}

impl ImagePair {
    pub fn new(old: impl Into<ImageId>, new: impl Into<ImageId>) -> Result<Self, DeployError> {
        let (old, new) = (old.into(), new.into());
        if old == new {
            return Err(DeployError::IdenticalImages { image: old });
        }
        Ok(Self { old, new })
    }

    /// Image whose running instances get replaced
    pub fn old_image(&self) -> &ImageId {
        &self.old
    }

    /// Image the replacements are launched from
    pub fn new_image(&self) -> &ImageId {
        &self.new
    }
}

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// AWS region; the SDK provider chain decides when unset
    pub region: Option<String>,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

/// Polling parameters for the two blocking waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Launched instances reaching `running`
    pub running: WaitConfig,
    /// Registered instances reaching `InService`
    pub health: WaitConfig,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            running: WaitConfig::new(
                Duration::from_secs(DEFAULT_RUNNING_INTERVAL_SECS),
                DEFAULT_RUNNING_MAX_ATTEMPTS,
            ),
            health: WaitConfig::new(
                Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
                DEFAULT_HEALTH_MAX_ATTEMPTS,
            ),
        }
    }
}

/// How a dry-run plan is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Output and runtime flags
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Stop after planning
    pub dry_run: bool,
    /// Plan output format
    pub format: OutputFormat,
    /// DEBUG logging
    pub verbose: bool,
}

/// Configuration for one deploy run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub images: ImagePair,
    pub aws: AwsConfig,
    pub waits: WaitSettings,
    pub output: OutputConfig,
}
