//! The append-only registration ledger.
//!
//! Each entry is chain-signed by the ledger's ephemeral chain identity,
//! chained to its predecessor by hash, and persisted before the tip
//! pointer advances. Appends are serialized by an async mutex so two
//! concurrent appenders can never observe the same tip and fork the
//! chain.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use registrar_core::{
    recompute_chain_hash, ChainHash, CoreError, EntryBuilder, RegistrationEntry, SigningIdentity,
};
use registrar_store::Store;

use crate::error::{ChainIntegrityError, RegistrarError, Result};

/// The append-only store of registration entries.
pub struct Ledger<S: Store> {
    chain_identity: SigningIdentity,
    store: Arc<S>,
    /// Chain hash of the last persisted entry. Guards the whole
    /// build-sign-hash-persist sequence.
    tip: Mutex<ChainHash>,
}

impl<S: Store> Ledger<S> {
    /// Open a ledger over a store, adopting the stored tip.
    pub async fn open(store: Arc<S>, chain_identity: SigningIdentity) -> Result<Self> {
        let tip = store.tip().await?.unwrap_or(ChainHash::Genesis);
        Ok(Self {
            chain_identity,
            store,
            tip: Mutex::new(tip),
        })
    }

    /// The ledger's chain identity.
    pub fn chain_identity(&self) -> &SigningIdentity {
        &self.chain_identity
    }

    /// Append a payload as a new chained, chain-signed entry.
    ///
    /// A signing or persistence failure aborts the whole operation: no
    /// partial entry is persisted and the tip pointer is left where it
    /// was, so the in-memory tip always agrees with storage.
    pub async fn append(&self, payload: Value, proof_name: &str) -> Result<RegistrationEntry> {
        let mut tip = self.tip.lock().await;

        let entry = EntryBuilder::new(proof_name, payload)
            .timestamp(now_secs())
            .prev(*tip)
            .build()
            .seal(&self.chain_identity)?;

        let chain_hash = entry
            .chain_hash
            .ok_or(CoreError::MissingField("chain_hash"))?;

        self.store.append_entry(&entry).await?;
        *tip = ChainHash::Link(chain_hash);

        tracing::info!(proof_name, chain_hash = %chain_hash, "entry registered");
        Ok(entry)
    }

    /// Attach the detached identity signature to a persisted entry.
    ///
    /// The stored row is replaced in place, keyed by the chain hash;
    /// the hash itself is untouched since every identity field is
    /// excluded from its input.
    pub async fn attach_identity_signature(
        &self,
        entry: RegistrationEntry,
        external_identity: &SigningIdentity,
    ) -> Result<RegistrationEntry> {
        let signed = entry.with_identity_signature(external_identity)?;
        self.store.replace_entry(&signed).await?;

        tracing::info!(
            fingerprint = %external_identity.fingerprint(),
            "identity signature attached"
        );
        Ok(signed)
    }

    /// Load all entries in append order.
    pub async fn load(&self) -> Result<Vec<RegistrationEntry>> {
        Ok(self.store.load_entries().await?)
    }

    /// Number of entries in the ledger.
    pub async fn len(&self) -> Result<u64> {
        Ok(self.store.entry_count().await?)
    }

    /// Whether the ledger is empty.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.store.entry_count().await? == 0)
    }

    /// Walk the whole chain, recomputing every hash and checking every
    /// link. Fails at the first broken link.
    pub async fn verify_chain(&self) -> Result<()> {
        let entries = self.store.load_entries().await?;
        verify_entries(&entries)
    }
}

/// Verify a sequence of entries as a hash chain.
///
/// The first entry must carry the genesis sentinel; every later entry's
/// `prev_chain_hash` must equal its predecessor's stored chain hash,
/// and every stored chain hash must recompute from the entry's own
/// fields.
pub fn verify_entries(entries: &[RegistrationEntry]) -> Result<()> {
    let mut prev = ChainHash::Genesis;

    for (index, entry) in entries.iter().enumerate() {
        let stored = match entry.chain_hash {
            Some(hash) => hash,
            None => {
                return Err(RegistrarError::ChainIntegrity(
                    ChainIntegrityError::IncompleteEntry { index },
                ))
            }
        };

        if entry.prev_chain_hash != prev {
            let err = ChainIntegrityError::LinkBroken {
                index,
                expected: prev.to_string(),
                found: entry.prev_chain_hash.to_string(),
            };
            tracing::warn!(index, %err, "chain link broken");
            return Err(RegistrarError::ChainIntegrity(err));
        }

        let computed = recompute_chain_hash(entry)?;
        if computed != stored {
            let err = ChainIntegrityError::HashMismatch {
                index,
                computed: computed.to_hex(),
                stored: stored.to_hex(),
            };
            tracing::warn!(index, %err, "chain hash mismatch");
            return Err(RegistrarError::ChainIntegrity(err));
        }

        prev = ChainHash::Link(stored);
    }

    Ok(())
}

/// Get current time in unix seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
