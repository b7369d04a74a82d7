//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use registrar_core::{
    ChainHash, EntryBuilder, RegistrationEntry, Sha256Hash, SigningIdentity,
};

/// Generate a signing identity from a random seed.
pub fn signing_identity() -> impl Strategy<Value = SigningIdentity> {
    any::<[u8; 32]>().prop_map(|seed| SigningIdentity::from_seed(&seed))
}

/// Generate a random chain hash (genesis or a real link).
pub fn chain_hash() -> impl Strategy<Value = ChainHash> {
    prop_oneof![
        Just(ChainHash::Genesis),
        any::<[u8; 32]>().prop_map(|bytes| ChainHash::Link(Sha256Hash::from_bytes(bytes))),
    ]
}

/// Generate a proof name.
pub fn proof_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,31}".prop_map(String::from)
}

/// Generate a reasonable timestamp (unix seconds).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800i64
}

/// Generate an arbitrary JSON payload of bounded depth.
pub fn payload() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Parameters for generating a sealed entry.
#[derive(Debug, Clone)]
pub struct EntryParams {
    pub chain_seed: [u8; 32],
    pub proof_name: String,
    pub payload: Value,
    pub timestamp: i64,
    pub prev: ChainHash,
}

impl Arbitrary for EntryParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            proof_name(),
            payload(),
            timestamp(),
            chain_hash(),
        )
            .prop_map(|(chain_seed, proof_name, payload, timestamp, prev)| EntryParams {
                chain_seed,
                proof_name,
                payload,
                timestamp,
                prev,
            })
            .boxed()
    }
}

/// Build a sealed entry from parameters.
pub fn entry_from_params(params: &EntryParams) -> RegistrationEntry {
    let identity = SigningIdentity::from_seed(&params.chain_seed);
    EntryBuilder::new(params.proof_name.clone(), params.payload.clone())
        .timestamp(params.timestamp)
        .prev(params.prev)
        .build()
        .seal(&identity)
        .expect("seal generated entry")
}

/// Reinsert an object's fields in reverse order.
///
/// Semantically the identity function; used to check that field
/// insertion order never leaks into canonical bytes.
pub fn permute_object(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut reversed = Map::new();
            for (key, val) in map.iter().rev() {
                reversed.insert(key.clone(), permute_object(val));
            }
            Value::Object(reversed)
        }
        Value::Array(items) => Value::Array(items.iter().map(permute_object).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::{canonical_bytes, recompute_chain_hash, verify_chain_signature};

    proptest! {
        #[test]
        fn prop_sealed_entry_deterministic(params: EntryParams) {
            let a = entry_from_params(&params);
            let b = entry_from_params(&params);

            prop_assert_eq!(a.chain_hash, b.chain_hash);
            prop_assert_eq!(a.chain_signature, b.chain_signature);
        }

        #[test]
        fn prop_chain_hash_recomputes(params: EntryParams) {
            let entry = entry_from_params(&params);
            let recomputed = recompute_chain_hash(&entry).unwrap();
            prop_assert_eq!(Some(recomputed), entry.chain_hash);
        }

        #[test]
        fn prop_chain_signature_verifies(params: EntryParams) {
            let entry = entry_from_params(&params);
            let identity = SigningIdentity::from_seed(&params.chain_seed);
            prop_assert!(verify_chain_signature(&entry, identity.backend()).is_verified());
        }

        #[test]
        fn prop_payload_insertion_order_irrelevant(params: EntryParams) {
            let mut permuted = params.clone();
            permuted.payload = permute_object(&params.payload);

            let a = entry_from_params(&params);
            let b = entry_from_params(&permuted);
            prop_assert_eq!(a.chain_hash, b.chain_hash);
        }

        #[test]
        fn prop_canonical_permutation_invariant(value in payload()) {
            let permuted = permute_object(&value);
            let a = canonical_bytes(&value, &[]).unwrap();
            let b = canonical_bytes(&permuted, &[]).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_distinct_payloads_distinct_hashes(
            seed in any::<[u8; 32]>(),
            a in payload(),
            b in payload(),
        ) {
            prop_assume!(a != b);

            let identity = SigningIdentity::from_seed(&seed);
            let build = |p: Value| {
                EntryBuilder::new("proof", p)
                    .timestamp(1_736_870_400)
                    .build()
                    .seal(&identity)
                    .unwrap()
            };

            prop_assert_ne!(build(a).chain_hash, build(b).chain_hash);
        }
    }
}
