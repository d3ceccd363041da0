//! Resource lifecycle helpers: idempotent create and terminal-state waits.
//!
//! The forecasting service provisions resources asynchronously: a create call
//! returns a handle immediately and the resource then moves through
//! `CREATE_PENDING` / `CREATE_IN_PROGRESS` until it lands on `ACTIVE` or
//! `CREATE_FAILED`. Deletion mirrors this with `DELETE_*` statuses until the
//! resource stops existing. This module provides the three building blocks
//! every pipeline stage is made of:
//!
//! - [`create_or_adopt`] - create a resource, or synthesize its handle when an
//!   identically-named one already exists
//! - [`wait_for_active`] - poll until the resource is usable
//! - [`wait_for_deleted`] - poll until the resource is gone
//!
//! The waiters poll on a fixed interval with an optional attempt budget, and
//! race each tick against a cancellation token.

use crate::api::{ApiError, ApiResult};
use crate::error::{CoreError, Result};
use crate::identity::{CallerIdentity, ResourceArn};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Terminal success status for a provisioned resource
const STATUS_ACTIVE: &str = "ACTIVE";
/// Terminal failure status during creation
const STATUS_CREATE_FAILED: &str = "CREATE_FAILED";
/// Terminal failure status during deletion
const STATUS_DELETE_FAILED: &str = "DELETE_FAILED";
/// Prefix shared by all in-progress creation statuses
const CREATE_PREFIX: &str = "CREATE";
/// Prefix shared by all in-progress deletion statuses
const DELETE_PREFIX: &str = "DELETE";

/// Polling configuration for lifecycle waits.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between describe polls
    pub interval: Duration,
    /// Maximum number of polls before giving up; `None` waits indefinitely
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// One describe poll's worth of resource state.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Status string as reported by the service
    pub status: String,
    /// Service estimate of time left in the current operation, when available
    pub remaining_minutes: Option<i64>,
}

/// Create a resource, adopting an identically-named one if it already exists.
///
/// Runs the `create` future once. An "already exists" failure is downgraded
/// to a skip: the handle is synthesized from the caller identity using the
/// service's ARN template, so subsequent describe/delete calls work the same
/// as for a freshly created resource. Any other failure aborts with
/// [`CoreError::CreationFailed`].
pub async fn create_or_adopt<F, Fut>(
    identity: &CallerIdentity,
    resource_type: &str,
    name: &str,
    create: F,
) -> Result<ResourceArn>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<ResourceArn>>,
{
    match create().await {
        Ok(arn) => {
            debug!(resource = resource_type, name, arn = %arn, "created");
            Ok(arn)
        }
        Err(err) if err.is_already_exists() => {
            info!(resource = resource_type, name, "already exists, skipping create");
            Ok(identity.arn(resource_type, name))
        }
        Err(source) => Err(CoreError::CreationFailed {
            resource: format!("{resource_type}/{name}"),
            source,
        }),
    }
}

/// Block until a just-created resource becomes usable.
///
/// Polls on the policy interval. Each poll resolves one of four ways:
/// `ACTIVE` returns success, `CREATE_FAILED` fails with
/// [`CoreError::ProvisioningFailed`], any status not prefixed `CREATE` fails
/// with [`CoreError::UnexpectedStatus`], and anything else keeps polling. A
/// poll error propagates immediately without retry.
///
/// Cancellation while polling resolves as *success*, not as an error. This
/// mirrors the long-standing behavior of the pipeline and is kept
/// deliberately; callers relying on a hard deadline must not depend on the
/// wait reporting failure when the deadline expires. See DESIGN.md.
pub async fn wait_for_active<F, Fut>(
    name: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut poll: F,
    on_progress: Option<ProgressCallback>,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<StatusSnapshot>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    emit(
        &on_progress,
        ProgressEvent::Started {
            name: name.to_string(),
        },
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = cancel.cancelled() => {
                warn!(resource = name, "wait cancelled, resolving as success");
                return Ok(());
            }
        }
        attempts += 1;

        let snapshot = poll().await?;
        let status = snapshot.status;

        if status == STATUS_ACTIVE {
            emit(
                &on_progress,
                ProgressEvent::Active {
                    name: name.to_string(),
                },
            );
            info!(resource = name, attempts, "resource is active");
            return Ok(());
        }
        if status == STATUS_CREATE_FAILED {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    name: name.to_string(),
                    error: status.clone(),
                },
            );
            return Err(CoreError::ProvisioningFailed {
                name: name.to_string(),
            });
        }
        if !status.starts_with(CREATE_PREFIX) {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    name: name.to_string(),
                    error: status.clone(),
                },
            );
            return Err(CoreError::UnexpectedStatus {
                name: name.to_string(),
                status,
            });
        }

        emit(
            &on_progress,
            ProgressEvent::Polling {
                name: name.to_string(),
                status,
                remaining_minutes: snapshot.remaining_minutes,
                elapsed: start.elapsed(),
            },
        );

        if let Some(max) = policy.max_attempts
            && attempts >= max
        {
            return Err(CoreError::WaitTimeout {
                name: name.to_string(),
                attempts,
            });
        }
    }
}

/// Block until a resource is fully removed.
///
/// Polls on the policy interval. A "not found" poll error is the expected
/// terminal state and returns success, even on the first poll. Statuses not
/// prefixed `DELETE` fail with [`CoreError::UnexpectedStatus`];
/// `DELETE_FAILED` fails with [`CoreError::DeletionFailed`]; other `DELETE_*`
/// statuses keep polling.
///
/// Cancellation behaves as in [`wait_for_active`]: the wait resolves as
/// success.
pub async fn wait_for_deleted<F, Fut>(
    name: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut poll: F,
    on_progress: Option<ProgressCallback>,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<String>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    emit(
        &on_progress,
        ProgressEvent::Started {
            name: name.to_string(),
        },
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = cancel.cancelled() => {
                warn!(resource = name, "wait cancelled, resolving as success");
                return Ok(());
            }
        }
        attempts += 1;

        let status = match poll().await {
            Ok(status) => status,
            Err(err) if err.is_not_found() => {
                emit(
                    &on_progress,
                    ProgressEvent::Deleted {
                        name: name.to_string(),
                    },
                );
                info!(resource = name, attempts, "resource is gone");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        // DELETE_FAILED shares the DELETE prefix, so the terminal check has
        // to come before the vocabulary check.
        if status == STATUS_DELETE_FAILED {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    name: name.to_string(),
                    error: status.clone(),
                },
            );
            return Err(CoreError::DeletionFailed {
                name: name.to_string(),
            });
        }
        if !status.starts_with(DELETE_PREFIX) {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    name: name.to_string(),
                    error: status.clone(),
                },
            );
            return Err(CoreError::UnexpectedStatus {
                name: name.to_string(),
                status,
            });
        }

        emit(
            &on_progress,
            ProgressEvent::Polling {
                name: name.to_string(),
                status,
                remaining_minutes: None,
                elapsed: start.elapsed(),
            },
        );

        if let Some(max) = policy.max_attempts
            && attempts >= max
        {
            return Err(CoreError::WaitTimeout {
                name: name.to_string(),
                attempts,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1))
    }

    fn identity() -> CallerIdentity {
        CallerIdentity::new("111122223333", "us-east-1")
    }

    fn snapshot(status: &str) -> StatusSnapshot {
        StatusSnapshot {
            status: status.to_string(),
            remaining_minutes: None,
        }
    }

    // --- create_or_adopt ---

    #[tokio::test]
    async fn create_returns_fresh_arn() {
        let arn = create_or_adopt(&identity(), "dataset", "d1", || async {
            Ok(ResourceArn::new("arn:aws:forecast:us-east-1:111122223333:dataset/real"))
        })
        .await
        .unwrap();

        assert_eq!(
            arn.as_str(),
            "arn:aws:forecast:us-east-1:111122223333:dataset/real"
        );
    }

    #[tokio::test]
    async fn create_synthesizes_arn_when_already_exists() {
        let arn = create_or_adopt(&identity(), "dataset", "d1", || async {
            Err(ApiError::AlreadyExists {
                message: "Dataset d1 already exists".to_string(),
            })
        })
        .await
        .unwrap();

        assert_eq!(
            arn.as_str(),
            "arn:aws:forecast:us-east-1:111122223333:dataset/d1"
        );
    }

    #[tokio::test]
    async fn create_fails_on_other_errors() {
        let err = create_or_adopt(&identity(), "predictor", "p1", || async {
            Err(ApiError::Service {
                code: Some("LimitExceededException".to_string()),
                message: "quota".to_string(),
            })
        })
        .await
        .unwrap_err();

        match err {
            CoreError::CreationFailed { resource, source } => {
                assert_eq!(resource, "predictor/p1");
                assert!(!source.is_already_exists());
            }
            other => panic!("expected CreationFailed, got {other:?}"),
        }
    }

    // --- wait_for_active ---

    #[tokio::test]
    async fn active_after_exact_poll_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seq = ["CREATE_PENDING", "CREATE_IN_PROGRESS", "ACTIVE"];
        let poll = {
            let calls = calls.clone();
            move || {
                let i = calls.fetch_add(1, Ordering::SeqCst);
                let snap = snapshot(seq[i]);
                async move { Ok(snap) }
            }
        };

        let cancel = CancellationToken::new();
        wait_for_active("dataset-import-job", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn create_failed_status_is_provisioning_failure() {
        let cancel = CancellationToken::new();
        let err = wait_for_active(
            "predictor",
            &fast_policy(),
            &cancel,
            || async { Ok(snapshot("CREATE_FAILED")) },
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::ProvisioningFailed { name } if name == "predictor"));
    }

    #[tokio::test]
    async fn status_outside_create_vocabulary_is_unexpected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(snapshot("SUSPENDED")) }
            }
        };

        let cancel = CancellationToken::new();
        let err = wait_for_active("forecast", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap_err();

        match err {
            CoreError::UnexpectedStatus { name, status } => {
                assert_eq!(name, "forecast");
                assert_eq!(status, "SUSPENDED");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        // Terminal on the first sighting, no further polls.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn poll_error_propagates_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::Service {
                        code: None,
                        message: "connection reset".to_string(),
                    })
                }
            }
        };

        let cancel = CancellationToken::new();
        let err = wait_for_active("dataset-import-job", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remaining_minutes_reach_the_progress_callback() {
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let on_progress: ProgressCallback = {
            let events = events.clone();
            Box::new(move |event| events.lock().unwrap().push(event))
        };

        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                let i = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if i == 0 {
                        Ok(StatusSnapshot {
                            status: "CREATE_IN_PROGRESS".to_string(),
                            remaining_minutes: Some(7),
                        })
                    } else {
                        Ok(snapshot("ACTIVE"))
                    }
                }
            }
        };

        let cancel = CancellationToken::new();
        wait_for_active("predictor", &fast_policy(), &cancel, poll, Some(on_progress))
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Polling {
                status,
                remaining_minutes: Some(7),
                ..
            } if status == "CREATE_IN_PROGRESS"
        )));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ProgressEvent::Active { .. }))
        );
    }

    // Documents the long-standing quirk: a cancelled wait reports success,
    // indistinguishable from the resource actually becoming active. Kept on
    // purpose; see DESIGN.md before "fixing" this.
    #[tokio::test]
    async fn cancelled_wait_resolves_as_success_not_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(snapshot("CREATE_PENDING")) }
            }
        };

        let cancel = CancellationToken::new();
        cancel.cancel();

        let slow = PollPolicy::new(Duration::from_secs(3600));
        wait_for_active("dataset-import-job", &slow, &cancel, poll, None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_mid_wait_also_resolves_as_success() {
        let cancel = CancellationToken::new();
        let poll = {
            let cancel = cancel.clone();
            move || {
                // First poll reports in-progress and then cancels the caller.
                cancel.cancel();
                async { Ok(snapshot("CREATE_IN_PROGRESS")) }
            }
        };

        wait_for_active("forecast", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn attempt_budget_exhaustion_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(snapshot("CREATE_IN_PROGRESS")) }
            }
        };

        let cancel = CancellationToken::new();
        let policy = fast_policy().with_max_attempts(3);
        let err = wait_for_active("predictor", &policy, &cancel, poll, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::WaitTimeout { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    // --- wait_for_deleted ---

    #[tokio::test]
    async fn deleted_when_first_poll_reports_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::NotFound {
                        message: "no such forecast".to_string(),
                    })
                }
            }
        };

        let cancel = CancellationToken::new();
        wait_for_deleted("forecast", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_polls_until_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = {
            let calls = calls.clone();
            move || {
                let i = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match i {
                        0 => Ok("DELETE_PENDING".to_string()),
                        1 => Ok("DELETE_IN_PROGRESS".to_string()),
                        _ => Err(ApiError::NotFound {
                            message: "gone".to_string(),
                        }),
                    }
                }
            }
        };

        let cancel = CancellationToken::new();
        wait_for_deleted("predictor", &fast_policy(), &cancel, poll, None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn delete_failed_status_is_deletion_failure() {
        let cancel = CancellationToken::new();
        let err = wait_for_deleted(
            "dataset-import-job",
            &fast_policy(),
            &cancel,
            || async { Ok("DELETE_FAILED".to_string()) },
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::DeletionFailed { .. }));
    }

    #[tokio::test]
    async fn delete_status_outside_vocabulary_is_unexpected() {
        let cancel = CancellationToken::new();
        let err = wait_for_deleted(
            "forecast-export-job",
            &fast_policy(),
            &cancel,
            || async { Ok("ACTIVE".to_string()) },
            None,
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, CoreError::UnexpectedStatus { status, .. } if status == "ACTIVE")
        );
    }

    #[tokio::test]
    async fn delete_poll_error_propagates() {
        let cancel = CancellationToken::new();
        let err = wait_for_deleted(
            "forecast",
            &fast_policy(),
            &cancel,
            || async {
                Err(ApiError::Service {
                    code: Some("InternalServerError".to_string()),
                    message: "boom".to_string(),
                })
            },
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::Api(_)));
    }
}
