//! Unified error handling for forecastctl-core
//!
//! One error type covers the whole pipeline: remote API failures pass through
//! as [`CoreError::Api`], and the lifecycle helpers add their own terminal
//! conditions on top. Nothing here is recovered automatically except the two
//! cases the lifecycle helpers handle themselves ("already exists" on create,
//! "not found" during delete-wait); every other variant aborts the pipeline.

use crate::api::ApiError;
use thiserror::Error;

/// Core error type for pipeline operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error from the remote forecasting API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A create call failed with something other than "already exists"
    #[error("failed to create {resource}: {source}")]
    CreationFailed {
        resource: String,
        #[source]
        source: ApiError,
    },

    /// The resource reached its terminal failure status during active-wait
    #[error("{name} failed to provision")]
    ProvisioningFailed { name: String },

    /// The resource reported a status outside the expected vocabulary
    #[error("{name} reported unexpected status {status:?}")]
    UnexpectedStatus { name: String, status: String },

    /// The resource reached its terminal failure status during delete-wait
    #[error("{name} failed to delete")]
    DeletionFailed { name: String },

    /// The poll policy's attempt budget was exhausted
    #[error("gave up waiting for {name} after {attempts} polls")]
    WaitTimeout { name: String, attempts: u32 },

    /// A request could not be constructed before reaching the service
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a "not found" error from the remote API
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this is an "already exists" error from the remote API
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_already_exists(),
            CoreError::CreationFailed { source, .. } => source.is_already_exists(),
            _ => false,
        }
    }
}
