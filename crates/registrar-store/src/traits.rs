//! Store trait: the abstract interface for registrar persistence.
//!
//! This trait keeps the ledger storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).
//!
//! Three keyspaces are covered:
//! - the ordered ledger of registration entries (append order is the
//!   only meaningful ordering; readers must tolerate the store growing
//!   between reads);
//! - per-fingerprint registration records, directly addressable;
//! - proposals, keyed by truncated content hash.
//!
//! # Design Notes
//!
//! - **Append-only**: entries are never deleted. The one permitted
//!   update is `replace_entry`, which swaps the row for an entry whose
//!   chain hash is unchanged (attaching the identity signature).
//! - **Snapshot reads**: implementations must never expose a
//!   half-written record to a reader; writes are transactional.
//! - **No validation**: the store persists what it is given. Chain and
//!   signature checks belong to the ledger and verifier.

use async_trait::async_trait;
use registrar_core::{ChainHash, Fingerprint, ProposalId, ProposalRecord, RegistrationEntry};

use crate::error::Result;

/// Async interface for registrar persistence.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Entries
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a chained entry to the ledger.
    ///
    /// Fails with [`StoreError::Conflict`] if an entry with the same
    /// chain hash already exists, and [`StoreError::NotChained`] if the
    /// entry carries no chain hash.
    ///
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    /// [`StoreError::NotChained`]: crate::StoreError::NotChained
    async fn append_entry(&self, entry: &RegistrationEntry) -> Result<()>;

    /// Replace the stored row for an entry, keyed by its chain hash.
    ///
    /// Only used to attach the identity signature; the chain hash
    /// itself never changes.
    async fn replace_entry(&self, entry: &RegistrationEntry) -> Result<()>;

    /// Load all entries in append order.
    async fn load_entries(&self) -> Result<Vec<RegistrationEntry>>;

    /// Number of entries in the ledger.
    async fn entry_count(&self) -> Result<u64>;

    /// Chain hash of the last entry, or `None` for an empty ledger.
    async fn tip(&self) -> Result<Option<ChainHash>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Per-Fingerprint Registrations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store the registration record for a fingerprint (upsert).
    async fn put_registration(
        &self,
        fingerprint: &Fingerprint,
        entry: &RegistrationEntry,
    ) -> Result<()>;

    /// Load the registration record for a fingerprint.
    async fn get_registration(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<RegistrationEntry>>;

    /// List all registration records, ordered by fingerprint.
    async fn list_registrations(&self) -> Result<Vec<(Fingerprint, RegistrationEntry)>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Proposals
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a proposal record (upsert by proposal id).
    async fn put_proposal(&self, record: &ProposalRecord) -> Result<()>;

    /// Load a proposal by id.
    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<ProposalRecord>>;

    /// List all proposals, ordered by id.
    async fn list_proposals(&self) -> Result<Vec<ProposalRecord>>;
}
