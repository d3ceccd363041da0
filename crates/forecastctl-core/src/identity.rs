//! Caller identity and resource handle synthesis.
//!
//! When a create call is skipped because the resource already exists, the
//! service does not hand back the existing ARN. The handle is rebuilt from
//! the caller's account and region instead, using the service's fixed ARN
//! template.

use std::fmt;

/// Opaque handle naming a created cloud resource.
///
/// Produced by create-or-adopt, consumed by describe polls and finally by
/// delete. The newtype prevents accidentally mixing handles with other
/// strings (resource names, bucket paths) threaded through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceArn(String);

impl ResourceArn {
    pub fn new(arn: impl Into<String>) -> Self {
        ResourceArn(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceArn {
    fn from(arn: String) -> Self {
        ResourceArn(arn)
    }
}

/// Account and region context of the current caller.
///
/// Resolved once at startup (STS `GetCallerIdentity` plus the configured
/// region) and used only to synthesize handles on the skip-create path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
    pub region: String,
}

impl CallerIdentity {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        CallerIdentity {
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Synthesize the deterministic handle for a named resource.
    ///
    /// Template: `arn:aws:forecast:<region>:<account>:<resource-type>/<name>`.
    pub fn arn(&self, resource_type: &str, name: &str) -> ResourceArn {
        ResourceArn(format!(
            "arn:aws:forecast:{}:{}:{}/{}",
            self.region, self.account_id, resource_type, name
        ))
    }
}
