//! Error types for the jotter client.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
}

/// What went wrong with the last session intent.
///
/// Every failure the controller can surface, whether a typed HTTP failure
/// or a transport fault, collapses into one of these kinds; each maps to
/// the fixed message stored in the session's `error_message`. None of them
/// is fatal: the user retries with a new intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The session-start list fetch failed.
    LoadListFailed,
    /// A note detail fetch failed (including 404).
    LoadDetailFailed,
    /// Local form validation rejected the submit; no request was issued.
    ValidationFailed,
    /// Create or update request failed.
    SaveFailed,
    /// Delete request failed.
    DeleteFailed,
}

impl SessionErrorKind {
    /// The user-facing message for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionErrorKind::LoadListFailed => "Could not load notes.",
            SessionErrorKind::LoadDetailFailed => "Failed to load note.",
            SessionErrorKind::ValidationFailed => "Title and content cannot be empty.",
            SessionErrorKind::SaveFailed => "Failed to save note.",
            SessionErrorKind::DeleteFailed => "Failed to delete note.",
        }
    }
}
