//! AWS account validation and identity

use anyhow::{Context, Result};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

/// Fetch the current AWS account ID via STS GetCallerIdentity
///
/// This call requires no permissions and succeeds whenever the credentials
/// are valid, so it runs before anything touches EC2 or the load balancer.
pub async fn get_current_account_id(sts: &aws_sdk_sts::Client) -> Result<AccountId> {
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId(account.to_string()))
}
