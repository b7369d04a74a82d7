//! Error types for the registrar facade.

use thiserror::Error;

use registrar_core::{BackendError, CanonicalizationError, CoreError, Fingerprint};
use registrar_store::StoreError;

/// The first broken link found while verifying the chain.
///
/// Carries the entry index and the offending values so callers can
/// decide whether to trust the prefix before the break. The chain is
/// never auto-repaired.
#[derive(Debug, Error)]
pub enum ChainIntegrityError {
    #[error("chain hash mismatch at entry {index}: computed {computed}, stored {stored}")]
    HashMismatch {
        index: usize,
        computed: String,
        stored: String,
    },

    #[error(
        "broken link at entry {index}: prev_chain_hash is {found}, predecessor's chain hash is {expected}"
    )]
    LinkBroken {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("entry {index} is not fully chained")]
    IncompleteEntry { index: usize },
}

impl ChainIntegrityError {
    /// Index of the first entry that cannot be trusted.
    pub fn index(&self) -> usize {
        match self {
            ChainIntegrityError::HashMismatch { index, .. }
            | ChainIntegrityError::LinkBroken { index, .. }
            | ChainIntegrityError::IncompleteEntry { index } => *index,
        }
    }
}

/// Errors surfaced by registrar operations.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("signing backend error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    ChainIntegrity(#[from] ChainIntegrityError),

    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    #[error("identity {fingerprint} not verified - operation denied")]
    PermissionDenied { fingerprint: Fingerprint },
}

/// Result type for registrar operations.
pub type Result<T> = std::result::Result<T, RegistrarError>;
