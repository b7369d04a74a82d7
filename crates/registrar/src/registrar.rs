//! The Registrar: unified API over the ledger, verifier, and gate.
//!
//! One long-lived context object owns the store and every subsystem,
//! wired together once at construction. Callers pass it through the
//! call graph instead of constructing per-call instances, so the
//! verification cache actually accumulates.

use std::sync::Arc;

use serde_json::Value;

use registrar_core::{
    Fingerprint, ProposalRecord, RegistrationEntry, SignatureBackend, SigningIdentity,
};
use registrar_store::Store;

use crate::error::Result;
use crate::gate::AccessGate;
use crate::ledger::Ledger;
use crate::verifier::{IdentityVerifier, MemberInfo};

/// The registrar context: ledger, identity verifier, and access gate
/// over one shared store.
pub struct Registrar<S: Store> {
    store: Arc<S>,
    ledger: Ledger<S>,
    verifier: Arc<IdentityVerifier<S>>,
    gate: AccessGate<S>,
}

impl<S: Store> Registrar<S> {
    /// Open a registrar with a fresh ephemeral chain identity.
    ///
    /// `external_scheme` is the signature scheme registered identities
    /// are verified under.
    pub async fn open(store: S, external_scheme: Arc<dyn SignatureBackend>) -> Result<Self> {
        Self::open_shared(Arc::new(store), external_scheme).await
    }

    /// Open a registrar over an already-shared store.
    pub async fn open_shared(
        store: Arc<S>,
        external_scheme: Arc<dyn SignatureBackend>,
    ) -> Result<Self> {
        Self::with_chain_identity(store, external_scheme, SigningIdentity::ephemeral()).await
    }

    /// Open a registrar with an explicit chain identity.
    pub async fn with_chain_identity(
        store: Arc<S>,
        external_scheme: Arc<dyn SignatureBackend>,
        chain_identity: SigningIdentity,
    ) -> Result<Self> {
        let ledger = Ledger::open(Arc::clone(&store), chain_identity).await?;
        let verifier = Arc::new(IdentityVerifier::new(Arc::clone(&store), external_scheme));
        let gate = AccessGate::new(Arc::clone(&verifier));

        Ok(Self {
            store,
            ledger,
            verifier,
            gate,
        })
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// The shared identity verifier.
    pub fn verifier(&self) -> &IdentityVerifier<S> {
        &self.verifier
    }

    /// The access gate over the shared verifier.
    pub fn gate(&self) -> &AccessGate<S> {
        &self.gate
    }

    /// Register a proof on the ledger.
    pub async fn register_proof(
        &self,
        payload: Value,
        proof_name: &str,
    ) -> Result<RegistrationEntry> {
        self.ledger.append(payload, proof_name).await
    }

    /// Attach an external identity's detached signature to an entry.
    pub async fn attach_identity_signature(
        &self,
        entry: RegistrationEntry,
        external_identity: &SigningIdentity,
    ) -> Result<RegistrationEntry> {
        self.ledger
            .attach_identity_signature(entry, external_identity)
            .await
    }

    /// Verify the whole chain.
    pub async fn verify_chain(&self) -> Result<()> {
        self.ledger.verify_chain().await
    }

    /// Verify an identity by fingerprint.
    pub async fn verify_identity(&self, fingerprint: &Fingerprint) -> bool {
        self.verifier.verify(fingerprint).await
    }

    /// Register a member under the entry's embedded fingerprint.
    pub async fn register_member(&self, entry: &RegistrationEntry) -> Result<Fingerprint> {
        self.verifier.register(entry).await
    }

    /// List all registered members with verification status.
    pub async fn members(&self) -> Result<Vec<MemberInfo>> {
        self.verifier.members().await
    }

    /// Submit a governance proposal. Requires a verified identity; a
    /// denied submission leaves no trace in the store.
    pub async fn submit_proposal(
        &self,
        proposal: Value,
        fingerprint: &Fingerprint,
    ) -> Result<ProposalRecord> {
        let store = Arc::clone(&self.store);
        let submitted_by = fingerprint.clone();

        self.gate
            .invoke_async(fingerprint, || async move {
                let record = ProposalRecord::new(proposal, submitted_by, now_secs())?;
                store.put_proposal(&record).await?;
                tracing::info!(proposal_id = %record.proposal_id, "proposal submitted");
                Ok(record)
            })
            .await
    }

    /// Load a previously submitted proposal.
    pub async fn proposal(
        &self,
        id: &registrar_core::ProposalId,
    ) -> Result<Option<ProposalRecord>> {
        Ok(self.store.get_proposal(id).await?)
    }
}

/// Get current time in unix seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
