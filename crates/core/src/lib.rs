//! Shared primitives for all Rust crates in Permeon.

#![forbid(unsafe_code)]

/// Actor identification carried by permission-checked sessions.
pub mod actor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use actor::ActorId;

/// Result type used across Permeon crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Session lacks the permission required for a securable entity.
    #[error("permission denied for '{entity_name}'{}", format_sub_action(.sub_action))]
    PermissionDenied {
        /// Name of the entity whose check failed.
        entity_name: String,
        /// Table sub-action being attempted, when the check was table-scoped.
        sub_action: Option<String>,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_sub_action(sub_action: &Option<String>) -> String {
    sub_action
        .as_deref()
        .map(|value| format!(" (sub-action '{value}')"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn permission_denied_formats_sub_action() {
        let error = AppError::PermissionDenied {
            entity_name: "orders".to_owned(),
            sub_action: Some("read".to_owned()),
        };
        assert_eq!(
            error.to_string(),
            "permission denied for 'orders' (sub-action 'read')"
        );
    }

    #[test]
    fn permission_denied_omits_missing_sub_action() {
        let error = AppError::PermissionDenied {
            entity_name: "dailyReport".to_owned(),
            sub_action: None,
        };
        assert_eq!(error.to_string(), "permission denied for 'dailyReport'");
    }
}
