//! Deterministic ledger vectors.
//!
//! Builds a small chain from fixed seeds and fixed timestamps. Any two
//! runs (or two implementations of the canonical codec) must produce
//! byte-identical entries, signatures, and chain hashes.

use serde_json::json;

use registrar_core::{
    ChainHash, EntryBuilder, RegistrationEntry, SigningIdentity,
};

/// Fixed seed for the vector chain identity.
pub const VECTOR_CHAIN_SEED: [u8; 32] = [0x42; 32];

/// Fixed seed for the vector external identity.
pub const VECTOR_EXTERNAL_SEED: [u8; 32] = [0x87; 32];

/// Fixed timestamp used by every vector entry.
pub const VECTOR_TIMESTAMP: i64 = 1_736_870_400;

/// Build the reference chain: three dual-signed entries with fixed
/// seeds, payloads, and timestamps.
pub fn reference_chain() -> Vec<RegistrationEntry> {
    let chain = SigningIdentity::from_seed(&VECTOR_CHAIN_SEED);
    let external = SigningIdentity::from_seed(&VECTOR_EXTERNAL_SEED);

    let payloads = [
        json!({"v": 1}),
        json!({"v": 2, "nested": {"b": true, "a": [1, 2, 3]}}),
        json!({"v": 3, "label": "final"}),
    ];

    let mut entries = Vec::with_capacity(payloads.len());
    let mut prev = ChainHash::Genesis;

    for (i, payload) in payloads.into_iter().enumerate() {
        let entry = EntryBuilder::new(format!("vector_{}", i), payload)
            .timestamp(VECTOR_TIMESTAMP)
            .prev(prev)
            .build()
            .seal(&chain)
            .expect("seal vector entry")
            .with_identity_signature(&external)
            .expect("sign vector entry");

        prev = ChainHash::Link(entry.chain_hash.expect("sealed entry has chain hash"));
        entries.push(entry);
    }

    entries
}
