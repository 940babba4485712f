//! Default configuration values
//!
//! The wait defaults mirror the provider's own waiters for the same
//! conditions (15 second interval, 40 attempts).

/// Region used when neither `--region` nor the SDK provider chain yields one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Seconds between polls while waiting for launched instances to run
pub const DEFAULT_RUNNING_INTERVAL_SECS: u64 = 15;

/// Maximum number of running-state polls
pub const DEFAULT_RUNNING_MAX_ATTEMPTS: u32 = 40;

/// Seconds between polls while waiting for instances to pass health checks
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 15;

/// Maximum number of health polls
pub const DEFAULT_HEALTH_MAX_ATTEMPTS: u32 = 40;

/// Number of instances requested per launch call
pub const INSTANCES_PER_LAUNCH: i32 = 1;
