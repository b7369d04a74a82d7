//! Access gating: verify-then-call protection for governance
//! operations.
//!
//! The gate is an explicit higher-order wrapper around a protected
//! operation. On denial the operation is never invoked, so a denied
//! call has no side effects; on success it runs exactly once and the
//! verifier's result is discarded.

use std::future::Future;
use std::sync::Arc;

use registrar_core::Fingerprint;
use registrar_store::Store;

use crate::error::{RegistrarError, Result};
use crate::verifier::IdentityVerifier;

/// Gates operations on a successful identity verification.
///
/// Borrows a long-lived [`IdentityVerifier`] so repeated calls share
/// its cache; constructing a fresh verifier per call would defeat it.
pub struct AccessGate<S: Store> {
    verifier: Arc<IdentityVerifier<S>>,
}

impl<S: Store> AccessGate<S> {
    /// Build a gate over a shared verifier.
    pub fn new(verifier: Arc<IdentityVerifier<S>>) -> Self {
        Self { verifier }
    }

    /// Run `operation` only if `fingerprint` verifies.
    pub async fn invoke<F, T>(&self, fingerprint: &Fingerprint, operation: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        if !self.verifier.verify(fingerprint).await {
            tracing::warn!(%fingerprint, "operation denied");
            return Err(RegistrarError::PermissionDenied {
                fingerprint: fingerprint.clone(),
            });
        }
        Ok(operation())
    }

    /// Run an async fallible `operation` only if `fingerprint` verifies.
    pub async fn invoke_async<F, Fut, T>(&self, fingerprint: &Fingerprint, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.verifier.verify(fingerprint).await {
            tracing::warn!(%fingerprint, "operation denied");
            return Err(RegistrarError::PermissionDenied {
                fingerprint: fingerprint.clone(),
            });
        }
        operation().await
    }
}
