//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use registrar_core::{ChainHash, Fingerprint, ProposalId, ProposalRecord, RegistrationEntry};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Ledger entries in append order.
    entries: Vec<RegistrationEntry>,

    /// Index: chain hash hex -> position in `entries`.
    by_chain_hash: HashMap<String, usize>,

    /// Registration records keyed by fingerprint.
    registrations: HashMap<Fingerprint, RegistrationEntry>,

    /// Proposals keyed by id.
    proposals: HashMap<ProposalId, ProposalRecord>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                entries: Vec::new(),
                by_chain_hash: HashMap::new(),
                registrations: HashMap::new(),
                proposals: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn chain_hash_hex(entry: &RegistrationEntry) -> Result<String> {
    entry
        .chain_hash
        .as_ref()
        .map(|h| h.to_hex())
        .ok_or(StoreError::NotChained)
}

#[async_trait]
impl Store for MemoryStore {
    async fn append_entry(&self, entry: &RegistrationEntry) -> Result<()> {
        let key = chain_hash_hex(entry)?;
        let mut inner = self.inner.write().unwrap();

        if inner.by_chain_hash.contains_key(&key) {
            return Err(StoreError::Conflict(key));
        }

        let position = inner.entries.len();
        inner.entries.push(entry.clone());
        inner.by_chain_hash.insert(key, position);
        Ok(())
    }

    async fn replace_entry(&self, entry: &RegistrationEntry) -> Result<()> {
        let key = chain_hash_hex(entry)?;
        let mut inner = self.inner.write().unwrap();

        let position = *inner
            .by_chain_hash
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        inner.entries[position] = entry.clone();
        Ok(())
    }

    async fn load_entries(&self) -> Result<Vec<RegistrationEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.clone())
    }

    async fn entry_count(&self) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.len() as u64)
    }

    async fn tip(&self) -> Result<Option<ChainHash>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .entries
            .last()
            .and_then(|entry| entry.chain_hash)
            .map(ChainHash::Link))
    }

    async fn put_registration(
        &self,
        fingerprint: &Fingerprint,
        entry: &RegistrationEntry,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .registrations
            .insert(fingerprint.clone(), entry.clone());
        Ok(())
    }

    async fn get_registration(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<RegistrationEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.registrations.get(fingerprint).cloned())
    }

    async fn list_registrations(&self) -> Result<Vec<(Fingerprint, RegistrationEntry)>> {
        let inner = self.inner.read().unwrap();
        let mut records: Vec<(Fingerprint, RegistrationEntry)> = inner
            .registrations
            .iter()
            .map(|(fp, entry)| (fp.clone(), entry.clone()))
            .collect();
        records.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok(records)
    }

    async fn put_proposal(&self, record: &ProposalRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .proposals
            .insert(record.proposal_id.clone(), record.clone());
        Ok(())
    }

    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<ProposalRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.proposals.get(id).cloned())
    }

    async fn list_proposals(&self) -> Result<Vec<ProposalRecord>> {
        let inner = self.inner.read().unwrap();
        let mut records: Vec<ProposalRecord> = inner.proposals.values().cloned().collect();
        records.sort_by(|a, b| a.proposal_id.cmp(&b.proposal_id));
        Ok(records)
    }
}
