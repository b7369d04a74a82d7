//! Error types for the registrar core.

use thiserror::Error;

/// Errors raised while canonicalizing a record.
///
/// Canonicalization failures are fatal to the surrounding operation and
/// never retried.
#[derive(Debug, Error)]
pub enum CanonicalizationError {
    #[error("record is not serializable: {0}")]
    Unserializable(String),

    #[error("cannot exclude fields from a non-object value")]
    NotAnObject,
}

/// Errors reported by a signing backend.
///
/// A backend error during signing aborts the whole operation; an entry
/// is never persisted unsigned.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("signing backend unavailable: {0}")]
    Unavailable(String),

    #[error("unknown signing key: {0}")]
    UnknownKey(String),

    #[error("signing backend timed out after {0}ms")]
    Timeout(u64),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Errors from entry-level operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("signing backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("entry is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),
}
