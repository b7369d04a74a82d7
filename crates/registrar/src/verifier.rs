//! Identity verification with a positive-result cache.
//!
//! The verifier is a memoizing gate: a fingerprint that has verified
//! once stays verified for the life of the process, unless explicitly
//! invalidated. There is no negative cache and no implicit expiry;
//! callers that rotate or revoke identities must call
//! [`IdentityVerifier::invalidate`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use registrar_core::{
    validate_entry, verify_identity_signature, Fingerprint, RegistrationEntry, SignatureBackend,
};
use registrar_store::Store;

use crate::error::{RegistrarError, Result};

/// Summary of one registered member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberInfo {
    pub proof_name: String,
    pub fingerprint: Fingerprint,
    pub timestamp: i64,
    pub verified: bool,
}

/// Verifies registered identities against their detached signatures.
pub struct IdentityVerifier<S: Store> {
    store: Arc<S>,
    /// The external signature scheme entries were signed under.
    scheme: Arc<dyn SignatureBackend>,
    /// Fingerprint -> last successfully verified entry. Entries are
    /// added only on success.
    cache: RwLock<HashMap<Fingerprint, RegistrationEntry>>,
}

impl<S: Store> IdentityVerifier<S> {
    /// Create a verifier over a store and an external scheme.
    pub fn new(store: Arc<S>, scheme: Arc<dyn SignatureBackend>) -> Self {
        Self {
            store,
            scheme,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Verify an identity by fingerprint.
    ///
    /// Returns `true` on a cache hit without touching the store or the
    /// backend. Every failure mode (no registration, fingerprint
    /// mismatch, bad signature, store error) is recovered into `false`;
    /// nothing is cached on failure.
    pub async fn verify(&self, fingerprint: &Fingerprint) -> bool {
        if self.is_cached(fingerprint) {
            tracing::debug!(%fingerprint, "identity already verified (cache hit)");
            return true;
        }

        let entry = match self.store.get_registration(fingerprint).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::warn!(%fingerprint, "no registration found");
                return false;
            }
            Err(e) => {
                tracing::warn!(%fingerprint, error = %e, "registration load failed");
                return false;
            }
        };

        match entry.identity_fingerprint.as_ref() {
            Some(embedded) if embedded == fingerprint => {}
            Some(embedded) => {
                tracing::warn!(
                    %fingerprint,
                    embedded = %embedded,
                    "claimed fingerprint does not match registered entry"
                );
                return false;
            }
            None => {
                tracing::warn!(%fingerprint, "registered entry has no identity signature");
                return false;
            }
        }

        let verdict = verify_identity_signature(&entry, self.scheme.as_ref());
        if let Some(reason) = verdict.reason() {
            tracing::warn!(%fingerprint, reason, "identity verification failed");
            return false;
        }

        tracing::info!(%fingerprint, "identity verified and cached");
        self.cache
            .write()
            .unwrap()
            .insert(fingerprint.clone(), entry);
        true
    }

    /// Whether a fingerprint is in the positive cache.
    pub fn is_cached(&self, fingerprint: &Fingerprint) -> bool {
        self.cache.read().unwrap().contains_key(fingerprint)
    }

    /// Drop a fingerprint from the cache, forcing re-verification on
    /// the next call. Returns whether it was cached.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        self.cache.write().unwrap().remove(fingerprint).is_some()
    }

    /// Drop the entire cache.
    pub fn clear(&self) {
        self.cache.write().unwrap().clear();
    }

    /// Register a member's entry under its embedded fingerprint.
    ///
    /// The entry must be structurally complete and carry a valid
    /// identity signature; an unverifiable entry is never persisted.
    pub async fn register(&self, entry: &RegistrationEntry) -> Result<Fingerprint> {
        validate_entry(entry)?;

        let fingerprint = entry
            .identity_fingerprint
            .clone()
            .ok_or_else(|| {
                RegistrarError::RegistrationRejected("entry has no identity signature".into())
            })?;

        let verdict = verify_identity_signature(entry, self.scheme.as_ref());
        if let Some(reason) = verdict.reason() {
            tracing::warn!(fingerprint = %fingerprint, reason, "registration rejected");
            return Err(RegistrarError::RegistrationRejected(reason.to_string()));
        }

        self.store.put_registration(&fingerprint, entry).await?;
        tracing::info!(%fingerprint, proof_name = %entry.proof_name, "member registered");
        Ok(fingerprint)
    }

    /// List all registered members with their verification status.
    ///
    /// Each record is re-verified against its own embedded key; records
    /// with invalid signatures are reported, not hidden.
    pub async fn members(&self) -> Result<Vec<MemberInfo>> {
        let records = self.store.list_registrations().await?;

        let members = records
            .into_iter()
            .map(|(fingerprint, entry)| {
                let verified = verify_identity_signature(&entry, self.scheme.as_ref()).is_verified();
                if !verified {
                    tracing::warn!(%fingerprint, proof_name = %entry.proof_name, "member has invalid signature");
                }
                MemberInfo {
                    proof_name: entry.proof_name,
                    fingerprint,
                    timestamp: entry.timestamp,
                    verified,
                }
            })
            .collect();

        Ok(members)
    }
}
