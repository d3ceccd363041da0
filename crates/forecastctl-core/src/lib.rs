//! # forecastctl-core
//!
//! Engine layer for provisioning and tearing down an Amazon Forecast
//! pipeline. The forecasting service provisions everything asynchronously,
//! so the interesting logic lives in two places:
//!
//! - **Lifecycle waits** ([`lifecycle`]) - poll a resource until it reaches a
//!   terminal state (`ACTIVE`, gone, or a failure status), racing each tick
//!   against a cancellation token.
//! - **Idempotent create** ([`lifecycle::create_or_adopt`]) - tolerate
//!   "already exists" by synthesizing the resource handle from the caller
//!   identity instead of failing the pipeline.
//!
//! Everything else is kept deliberately thin: [`api`] folds remote errors
//! into a tagged kind the lifecycle helpers can branch on, [`identity`]
//! carries the account/region context for handle synthesis, and [`progress`]
//! lets callers observe polling without the engine knowing about
//! presentation.
//!
//! This crate never talks to the network itself. The binary crate owns the
//! SDK clients and hands the engine poll futures; tests drive the same entry
//! points with scripted status sequences.

pub mod api;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod progress;

// Re-export key types for convenience
pub use api::{ApiError, ApiResult, classify};
pub use error::{CoreError, Result};
pub use identity::{CallerIdentity, ResourceArn};
pub use lifecycle::{
    PollPolicy, StatusSnapshot, create_or_adopt, wait_for_active, wait_for_deleted,
};
pub use progress::{ProgressCallback, ProgressEvent};
