//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use thiserror::Error;

/// AWS error categories for retry decisions in the polling loops
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Instance id not yet visible right after launch (eventual consistency, retryable)
    #[error("Instance not yet visible to EC2 (eventual consistency)")]
    InstanceNotYetVisible,

    /// Load balancer does not know the instance yet (retryable during health polls)
    #[error("Instance not yet known to the load balancer")]
    InvalidInstance,

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AwsError::InstanceNotYetVisible | AwsError::InvalidInstance | AwsError::Throttled
        )
    }

    /// The provider error code, when one was reported
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. } => Some(code),
            AwsError::InstanceNotYetVisible => Some(INSTANCE_NOT_FOUND_CODE),
            AwsError::InvalidInstance => Some(INVALID_INSTANCE_CODE),
            AwsError::Throttled => None,
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        self.code().and_then(suggestion_for_code)
    }
}

/// EC2 code for an instance id that does not (yet) exist
const INSTANCE_NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";

/// ELB code for an instance the load balancer cannot resolve
const INVALID_INSTANCE_CODE: &str = "InvalidInstance";

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidAMIID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidKeyPair.NotFound",
    "LoadBalancerNotFound",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(INSTANCE_NOT_FOUND_CODE) => AwsError::InstanceNotYetVisible,
        Some(INVALID_INSTANCE_CODE) => AwsError::InvalidInstance,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain using `ProvideErrorMetadata` to extract `.code()` and
/// `.message()` from the SDK errors of every operation the deployer calls.
/// Falls back to string matching on the Debug representation if no typed
/// error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError as Ec2Error};
    use aws_sdk_ec2::operation::{
        describe_instances::DescribeInstancesError, run_instances::RunInstancesError,
        terminate_instances::TerminateInstancesError,
    };
    use aws_sdk_elasticloadbalancing::error::SdkError as ElbError;
    use aws_sdk_elasticloadbalancing::operation::{
        deregister_instances_from_load_balancer::DeregisterInstancesFromLoadBalancerError,
        describe_instance_health::DescribeInstanceHealthError,
        describe_load_balancers::DescribeLoadBalancersError,
        register_instances_with_load_balancer::RegisterInstancesWithLoadBalancerError,
    };

    macro_rules! classify_as {
        ($cause:expr, $($err:ty),+ $(,)?) => {
            $(
                if let Some(e) = $cause.downcast_ref::<$err>() {
                    let meta = ProvideErrorMetadata::meta(e);
                    return classify_aws_error(meta.code(), meta.message());
                }
            )+
        };
    }

    for cause in error.chain() {
        classify_as!(
            cause,
            Ec2Error<DescribeInstancesError>,
            Ec2Error<RunInstancesError>,
            Ec2Error<TerminateInstancesError>,
            ElbError<DescribeLoadBalancersError>,
            ElbError<RegisterInstancesWithLoadBalancerError>,
            ElbError<DescribeInstanceHealthError>,
            ElbError<DeregisterInstancesFromLoadBalancerError>,
        );
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// All known AWS error codes for extraction from debug strings.
///
/// Ordered so that a code is listed before any shorter code it contains
/// (`InvalidInstanceID.NotFound` before `InvalidInstance`).
const ALL_KNOWN_CODES: &[&str] = &[
    // Not found
    "InvalidInstanceID.NotFound",
    "InvalidAMIID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidKeyPair.NotFound",
    "LoadBalancerNotFound",
    // Health polling
    "InvalidInstance",
    // Throttling
    "ThrottlingException",
    "Throttling",
    "RequestLimitExceeded",
    // Credentials and permissions
    "UnauthorizedOperation",
    "AccessDenied",
    "ExpiredToken",
    "InvalidClientTokenId",
    // Capacity and limits
    "InsufficientInstanceCapacity",
    "InstanceLimitExceeded",
    "VcpuLimitExceeded",
    "Unsupported",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    if let Some(code) = ALL_KNOWN_CODES
        .iter()
        .find(|c| contains_code(debug_str, c))
    {
        return Some((*code).to_string());
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Whether `code` occurs in `haystack` as a whole token.
///
/// Codes are made of alphanumerics and dots, so `InvalidInstance` does not
/// match inside `InvalidInstanceID.Malformed`.
fn contains_code(haystack: &str, code: &str) -> bool {
    let is_code_char = |c: char| c.is_ascii_alphanumeric() || c == '.' || c == '_';

    haystack.match_indices(code).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + code.len()..].chars().next();
        !before.is_some_and(is_code_char) && !after.is_some_and(is_code_char)
    })
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "InvalidAMIID.NotFound",
        "Check that the new image id exists and is shared with this account in this region.",
    ),
    (
        "InvalidSubnetID.NotFound",
        "The subnet of an old instance no longer exists.",
    ),
    (
        "InvalidKeyPair.NotFound",
        "The key pair of an old instance has been deleted; recreate it or relaunch manually.",
    ),
    (
        "LoadBalancerNotFound",
        "The load balancer was deleted while the deploy was running.",
    ),
    (
        "UnauthorizedOperation",
        "The credentials lack permission for this EC2 action.",
    ),
    (
        "AccessDenied",
        "The credentials lack permission for this Elastic Load Balancing action.",
    ),
    (
        "ExpiredToken",
        "Refresh your AWS credentials (for example with `aws sso login`).",
    ),
    (
        "InvalidClientTokenId",
        "Refresh your AWS credentials (for example with `aws sso login`).",
    ),
    (
        "InsufficientInstanceCapacity",
        "Try again later; the subnet's availability zone is out of capacity for this type.",
    ),
    (
        "InstanceLimitExceeded",
        "Request a service limit increase via AWS Service Quotas console.",
    ),
    (
        "VcpuLimitExceeded",
        "Request a service limit increase via AWS Service Quotas console.",
    ),
    (
        "Unsupported",
        "This instance type may not be available in this region/AZ.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
