//! Remote API error classification.
//!
//! The forecasting service reports failures through typed exception codes.
//! This module folds them into a small tagged error so callers can branch on
//! the *kind* of failure ("already exists", "not found", anything else)
//! instead of matching on message text.

use thiserror::Error;

/// Tagged error for calls against the remote forecasting API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An identically-named resource already exists (safe to adopt on create)
    #[error("resource already exists: {message}")]
    AlreadyExists { message: String },

    /// The resource does not exist (expected terminal state during delete-wait)
    #[error("resource not found: {message}")]
    NotFound { message: String },

    /// Any other service or transport error
    #[error("service error{}: {message}", code_suffix(.code))]
    Service {
        code: Option<String>,
        message: String,
    },
}

/// Result type alias for remote API calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

fn code_suffix(code: &Option<String>) -> String {
    match code {
        Some(c) => format!(" ({c})"),
        None => String::new(),
    }
}

impl ApiError {
    /// Returns true if this is an "already exists" error
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ApiError::AlreadyExists { .. })
    }

    /// Returns true if this is a "not found" error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Known service error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &["ResourceAlreadyExistsException"];

/// Known service error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];

/// Classify a remote service error using its exception code.
///
/// The code is the machine-readable exception name the service attaches to
/// the response; message text is carried for display only and never used for
/// classification.
pub fn classify(code: Option<&str>, message: Option<&str>) -> ApiError {
    let message = message.unwrap_or("unknown error").to_string();

    match code {
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => ApiError::AlreadyExists { message },
        Some(c) if NOT_FOUND_CODES.contains(&c) => ApiError::NotFound { message },
        _ => ApiError::Service {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify(Some(code), Some("msg"));
            assert!(
                err.is_already_exists(),
                "Expected AlreadyExists for code: {code}"
            );
            assert!(!err.is_not_found());
        }
    }

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify(Some(code), Some("msg"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert!(!err.is_already_exists());
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify(Some("ThrottlingException"), Some("slow down"));
        assert!(matches!(err, ApiError::Service { code: Some(_), .. }));
        assert!(!err.is_already_exists());
        assert!(!err.is_not_found());

        let err2 = classify(None, Some("connection refused"));
        assert!(matches!(err2, ApiError::Service { code: None, .. }));
    }

    #[test]
    fn classification_ignores_message_text() {
        // A misleading message must not affect the kind check.
        let err = classify(Some("ValidationException"), Some("resource already exists"));
        assert!(!err.is_already_exists());

        let err2 = classify(
            Some("ResourceAlreadyExistsException"),
            Some("nothing to see"),
        );
        assert!(err2.is_already_exists());
    }

    #[test]
    fn display_includes_code() {
        let err = classify(Some("LimitExceededException"), Some("too many predictors"));
        let text = err.to_string();
        assert!(text.contains("LimitExceededException"));
        assert!(text.contains("too many predictors"));

        let no_code = classify(None, None);
        assert_eq!(no_code.to_string(), "service error: unknown error");
    }
}
