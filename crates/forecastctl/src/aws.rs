//! SDK error mapping
//!
//! Folds `SdkError` values into the engine's tagged [`ApiError`] so the
//! lifecycle helpers can branch on error kind without the engine crate ever
//! depending on the SDK.

use aws_sdk_forecast::error::{BuildError, ProvideErrorMetadata, SdkError};
use forecastctl_core::{ApiError, CoreError, classify};

/// Map a service call failure to a tagged [`ApiError`].
///
/// Classification is by the error code carried in the response metadata;
/// transport-level failures have no code and fall through to the generic
/// service kind with the debug rendering as message.
pub(crate) fn api_error<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let meta = err.meta();
    let code = meta.code().map(str::to_owned);
    let message = match meta.message() {
        Some(message) => message.to_owned(),
        None => format!("{err:?}"),
    };
    classify(code.as_deref(), Some(&message))
}

/// Map a request builder failure (missing required field) to an engine error
pub(crate) fn build_error(err: BuildError) -> CoreError {
    CoreError::InvalidRequest(err.to_string())
}
