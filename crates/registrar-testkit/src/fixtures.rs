//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use serde_json::Value;

use registrar::Registrar;
use registrar_core::{
    Ed25519Backend, EntryBuilder, Fingerprint, RegistrationEntry, SigningIdentity,
};
use registrar_store::MemoryStore;

/// A test fixture with a chain identity, an external identity, and a
/// shared memory store.
pub struct TestFixture {
    pub chain_identity: SigningIdentity,
    pub external_identity: SigningIdentity,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with random identities.
    pub fn new() -> Self {
        Self {
            chain_identity: SigningIdentity::ephemeral(),
            external_identity: SigningIdentity::ephemeral(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Create with deterministic identities from seeds.
    pub fn with_seeds(chain_seed: [u8; 32], external_seed: [u8; 32]) -> Self {
        Self {
            chain_identity: SigningIdentity::from_seed(&chain_seed),
            external_identity: SigningIdentity::from_seed(&external_seed),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// The external identity's fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        self.external_identity.fingerprint()
    }

    /// Open a registrar over this fixture's store and chain identity.
    pub async fn registrar(&self) -> Registrar<MemoryStore> {
        Registrar::with_chain_identity(
            Arc::clone(&self.store),
            Arc::new(Ed25519Backend::generate()),
            self.chain_identity.clone(),
        )
        .await
        .expect("open registrar")
    }

    /// Build a sealed (chain-signed, chained) entry off the given
    /// predecessor.
    pub fn sealed_entry(
        &self,
        proof_name: &str,
        payload: Value,
        prev: registrar_core::ChainHash,
    ) -> RegistrationEntry {
        EntryBuilder::new(proof_name, payload)
            .timestamp(1_736_870_400)
            .prev(prev)
            .build()
            .seal(&self.chain_identity)
            .expect("seal entry")
    }

    /// Build a dual-signed entry: sealed plus the external identity's
    /// detached signature.
    pub fn dual_signed_entry(
        &self,
        proof_name: &str,
        payload: Value,
        prev: registrar_core::ChainHash,
    ) -> RegistrationEntry {
        self.sealed_entry(proof_name, payload, prev)
            .with_identity_signature(&self.external_identity)
            .expect("attach identity signature")
    }

    /// Open a registrar with the external identity already registered
    /// as a member. Returns the registrar and the member fingerprint.
    pub async fn registrar_with_member(&self) -> (Registrar<MemoryStore>, Fingerprint) {
        let registrar = self.registrar().await;

        let entry = registrar
            .register_proof(serde_json::json!({"member": true}), "membership")
            .await
            .expect("append membership entry");
        let entry = registrar
            .attach_identity_signature(entry, &self.external_identity)
            .await
            .expect("attach identity signature");
        let fingerprint = registrar
            .register_member(&entry)
            .await
            .expect("register member");

        (registrar, fingerprint)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple fixtures with distinct deterministic identities.
pub fn multi_member_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut chain_seed = [0u8; 32];
            chain_seed[0] = i as u8;
            let mut external_seed = [0x80u8; 32];
            external_seed[0] = i as u8;
            TestFixture::with_seeds(chain_seed, external_seed)
        })
        .collect()
}
