//! Registration entries: the unit of the ledger.
//!
//! An entry is immutable once chained. Corrections are represented as
//! new entries, never as in-place edits. The only post-hoc change is
//! attaching the detached identity signature, which is excluded from
//! the chain hash.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::SigningIdentity;
use crate::canonical::canonical_record;
use crate::chain::ChainHash;
use crate::crypto::{Fingerprint, KeyMaterial, Sha256Hash, SignatureBytes};
use crate::error::{CanonicalizationError, CoreError};

/// Fields excluded from the chain-signature message.
///
/// The message covers exactly the fields present when the draft is
/// signed: `proof_name`, `payload`, `timestamp`, `prev_chain_hash`.
pub const CHAIN_SIGNATURE_EXCLUSIONS: &[&str] = &[
    "chain_signature",
    "chain_public_key",
    "chain_hash",
    "identity_signature",
    "identity_fingerprint",
    "identity_public_key",
];

/// Fields excluded from the chain-hash input.
///
/// Additionally covers `chain_public_key`, so swapping the chain key
/// invalidates the hash.
pub const CHAIN_HASH_EXCLUSIONS: &[&str] = &[
    "chain_signature",
    "chain_hash",
    "identity_signature",
    "identity_fingerprint",
    "identity_public_key",
];

/// Fields excluded from the identity-signature message.
///
/// Additionally covers `chain_hash`, binding the external identity to
/// the chained entry. The fingerprint is excluded because it is
/// attached alongside the signature itself.
pub const IDENTITY_SIGNATURE_EXCLUSIONS: &[&str] = &[
    "chain_signature",
    "identity_signature",
    "identity_fingerprint",
    "identity_public_key",
];

/// One attestation in the registration ledger.
///
/// Optional fields are omitted from serialization while unset, so the
/// canonical bytes of a draft contain only the fields that existed when
/// each signature was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    /// Human label for the registered proof. Not unique.
    pub proof_name: String,

    /// Caller-supplied content; opaque to the ledger.
    pub payload: Value,

    /// Creation time, unix seconds. Advisory: append order is the only
    /// ordering guarantee.
    pub timestamp: i64,

    /// Chain hash of the preceding entry, or the genesis sentinel.
    pub prev_chain_hash: ChainHash,

    /// Chain-identity signature over the draft's canonical bytes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_signature: Option<SignatureBytes>,

    /// Public key of the ephemeral chain identity.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_public_key: Option<KeyMaterial>,

    /// This entry's own chain hash.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_hash: Option<Sha256Hash>,

    /// Detached signature bound to a long-lived external identity.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identity_signature: Option<SignatureBytes>,

    /// Fingerprint of the external identity.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identity_fingerprint: Option<Fingerprint>,

    /// Public key exported for self-contained offline verification.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identity_public_key: Option<KeyMaterial>,
}

impl RegistrationEntry {
    /// Canonical bytes signed by the chain identity.
    pub fn chain_signature_message(&self) -> Result<Vec<u8>, CanonicalizationError> {
        canonical_record(self, CHAIN_SIGNATURE_EXCLUSIONS)
    }

    /// Canonical bytes fed to the chain hash.
    pub fn chain_hash_input(&self) -> Result<Vec<u8>, CanonicalizationError> {
        canonical_record(self, CHAIN_HASH_EXCLUSIONS)
    }

    /// Canonical bytes signed by the external identity.
    pub fn identity_signature_message(&self) -> Result<Vec<u8>, CanonicalizationError> {
        canonical_record(self, IDENTITY_SIGNATURE_EXCLUSIONS)
    }

    /// Whether the entry carries a chain signature and chain hash.
    pub fn is_chained(&self) -> bool {
        self.chain_signature.is_some()
            && self.chain_public_key.is_some()
            && self.chain_hash.is_some()
    }

    /// Whether the entry carries a detached identity signature.
    pub fn has_identity_signature(&self) -> bool {
        self.identity_signature.is_some() && self.identity_public_key.is_some()
    }

    /// Chain-sign the draft and compute its chain hash.
    ///
    /// A signing failure aborts the operation; the draft is returned to
    /// its caller unmodified in that case (by value semantics, it is
    /// simply dropped).
    pub fn seal(mut self, chain_identity: &SigningIdentity) -> Result<Self, CoreError> {
        let message = self.chain_signature_message()?;
        self.chain_signature = Some(chain_identity.sign(&message)?);
        self.chain_public_key = Some(chain_identity.export_public_key()?);

        let input = self.chain_hash_input()?;
        self.chain_hash = Some(ChainHash::compute(&self.prev_chain_hash, &input));
        Ok(self)
    }

    /// Attach the detached identity signature.
    ///
    /// Not chain-hash-affecting: every identity field is excluded from
    /// the chain-hash input.
    pub fn with_identity_signature(
        mut self,
        external_identity: &SigningIdentity,
    ) -> Result<Self, CoreError> {
        let message = self.identity_signature_message()?;
        self.identity_signature = Some(external_identity.sign(&message)?);
        self.identity_public_key = Some(external_identity.export_public_key()?);
        self.identity_fingerprint = Some(external_identity.fingerprint());
        Ok(self)
    }
}

/// Builder for drafting entries.
pub struct EntryBuilder {
    proof_name: String,
    payload: Value,
    timestamp: i64,
    prev_chain_hash: ChainHash,
}

impl EntryBuilder {
    /// Start a draft with the given label and payload.
    pub fn new(proof_name: impl Into<String>, payload: Value) -> Self {
        Self {
            proof_name: proof_name.into(),
            payload,
            timestamp: 0,
            prev_chain_hash: ChainHash::Genesis,
        }
    }

    /// Set the creation timestamp (unix seconds).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    /// Set the previous chain hash.
    pub fn prev(mut self, prev: ChainHash) -> Self {
        self.prev_chain_hash = prev;
        self
    }

    /// Build the draft. All signature and hash fields start unset.
    pub fn build(self) -> RegistrationEntry {
        RegistrationEntry {
            proof_name: self.proof_name,
            payload: self.payload,
            timestamp: self.timestamp,
            prev_chain_hash: self.prev_chain_hash,
            chain_signature: None,
            chain_public_key: None,
            chain_hash: None,
            identity_signature: None,
            identity_fingerprint: None,
            identity_public_key: None,
        }
    }
}
