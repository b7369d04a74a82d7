//! End-to-end registration and governance flows: dual signatures,
//! identity verification, cache behavior, and gated proposals.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use registrar::{
    Fingerprint, MemoryStore, ProposalId, Registrar, RegistrarError, SignatureBackend,
    SigningIdentity, Store, Verdict,
};
use registrar_core::{BackendError, Ed25519Backend, KeyMaterial, SignatureBytes};

/// An Ed25519 scheme that counts verification calls, for cache tests.
struct CountingScheme {
    inner: Ed25519Backend,
    verifies: Arc<AtomicUsize>,
}

impl CountingScheme {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let verifies = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: Ed25519Backend::generate(),
                verifies: Arc::clone(&verifies),
            },
            verifies,
        )
    }
}

impl SignatureBackend for CountingScheme {
    fn sign(&self, message: &[u8]) -> Result<SignatureBytes, BackendError> {
        self.inner.sign(message)
    }

    fn verify(&self, message: &[u8], signature: &SignatureBytes, key: &KeyMaterial) -> Verdict {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(message, signature, key)
    }

    fn export_public_key(&self) -> Result<KeyMaterial, BackendError> {
        self.inner.export_public_key()
    }

    fn fingerprint(&self) -> registrar::Fingerprint {
        self.inner.fingerprint()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn open_registrar() -> Registrar<MemoryStore> {
    init_tracing();
    Registrar::open(MemoryStore::new(), Arc::new(Ed25519Backend::generate()))
        .await
        .unwrap()
}

#[tokio::test]
async fn register_and_verify_known_identity_reject_unknown() {
    let registrar = open_registrar().await;
    let member = SigningIdentity::ephemeral();

    let entry = registrar
        .register_proof(json!({"model": "resnet", "epochs": 10}), "training_proof")
        .await
        .unwrap();
    let entry = registrar
        .attach_identity_signature(entry, &member)
        .await
        .unwrap();
    let fingerprint = registrar.register_member(&entry).await.unwrap();

    assert!(registrar.verify_identity(&fingerprint).await);
    assert!(!registrar.verify_identity(&Fingerprint::new("FP2")).await);
}

#[tokio::test]
async fn chain_validity_does_not_imply_identity_validity() {
    // A chain-signed entry with no identity signature keeps the chain
    // intact but must never verify as an identity.
    let store = Arc::new(MemoryStore::new());
    let registrar = Registrar::open_shared(Arc::clone(&store), Arc::new(Ed25519Backend::generate()))
        .await
        .unwrap();

    let entry = registrar
        .register_proof(json!({"v": 1}), "chain_only")
        .await
        .unwrap();
    registrar.verify_chain().await.unwrap();

    // register_member refuses it outright.
    assert!(matches!(
        registrar.register_member(&entry).await,
        Err(RegistrarError::RegistrationRejected(_))
    ));

    // Even planted directly in the registration store it fails.
    let fingerprint = Fingerprint::new("PLANTED");
    store.put_registration(&fingerprint, &entry).await.unwrap();
    assert!(!registrar.verify_identity(&fingerprint).await);
    registrar.verify_chain().await.unwrap();
}

#[tokio::test]
async fn second_verification_is_a_pure_cache_hit() {
    let (scheme, verifies) = CountingScheme::new();
    let registrar = Registrar::open(MemoryStore::new(), Arc::new(scheme))
        .await
        .unwrap();
    let member = SigningIdentity::ephemeral();

    let entry = registrar
        .register_proof(json!({"v": 1}), "cached")
        .await
        .unwrap();
    let entry = registrar
        .attach_identity_signature(entry, &member)
        .await
        .unwrap();
    let fingerprint = registrar.register_member(&entry).await.unwrap();
    let after_register = verifies.load(Ordering::SeqCst);

    assert!(registrar.verify_identity(&fingerprint).await);
    let after_first = verifies.load(Ordering::SeqCst);
    assert_eq!(after_first, after_register + 1);

    // Second call answers from the cache, no backend verification.
    assert!(registrar.verify_identity(&fingerprint).await);
    assert_eq!(verifies.load(Ordering::SeqCst), after_first);

    // Invalidation forces exactly one re-verification.
    assert!(registrar.verifier().invalidate(&fingerprint));
    assert!(registrar.verify_identity(&fingerprint).await);
    assert_eq!(verifies.load(Ordering::SeqCst), after_first + 1);
}

#[tokio::test]
async fn proposals_require_a_verified_identity() {
    let store = Arc::new(MemoryStore::new());
    let registrar = Registrar::open_shared(Arc::clone(&store), Arc::new(Ed25519Backend::generate()))
        .await
        .unwrap();
    let member = SigningIdentity::ephemeral();

    let proposal = json!({"title": "Adopt policy", "description": "..."});

    // Unverified: denied, and nothing is persisted.
    let denied = registrar
        .submit_proposal(proposal.clone(), &Fingerprint::new("NOBODY"))
        .await;
    assert!(matches!(
        denied,
        Err(RegistrarError::PermissionDenied { .. })
    ));
    assert!(store.list_proposals().await.unwrap().is_empty());

    // Register the member, then submit.
    let entry = registrar
        .register_proof(json!({"v": 1}), "membership")
        .await
        .unwrap();
    let entry = registrar
        .attach_identity_signature(entry, &member)
        .await
        .unwrap();
    let fingerprint = registrar.register_member(&entry).await.unwrap();

    let record = registrar
        .submit_proposal(proposal.clone(), &fingerprint)
        .await
        .unwrap();
    assert_eq!(record.submitted_by, fingerprint);
    assert_eq!(record.proposal_id, ProposalId::derive(&proposal).unwrap());

    let loaded = registrar.proposal(&record.proposal_id).await.unwrap();
    assert_eq!(loaded, Some(record));
}

#[tokio::test]
async fn members_listing_reflects_registrations() {
    let registrar = open_registrar().await;
    let alice = SigningIdentity::ephemeral();
    let bob = SigningIdentity::ephemeral();

    for (identity, name) in [(&alice, "alice_proof"), (&bob, "bob_proof")] {
        let entry = registrar
            .register_proof(json!({"member": name}), name)
            .await
            .unwrap();
        let entry = registrar
            .attach_identity_signature(entry, identity)
            .await
            .unwrap();
        registrar.register_member(&entry).await.unwrap();
    }

    let members = registrar.members().await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.verified));

    let names: Vec<&str> = members.iter().map(|m| m.proof_name.as_str()).collect();
    assert!(names.contains(&"alice_proof"));
    assert!(names.contains(&"bob_proof"));
}

#[tokio::test]
async fn attach_is_the_only_post_hoc_mutation_and_keeps_the_chain() {
    let registrar = open_registrar().await;
    let member = SigningIdentity::ephemeral();

    let e1 = registrar
        .register_proof(json!({"v": 1}), "first")
        .await
        .unwrap();
    registrar
        .register_proof(json!({"v": 2}), "second")
        .await
        .unwrap();

    // Attaching to an already-chained entry later must not disturb
    // verification of entries appended in between.
    registrar
        .attach_identity_signature(e1, &member)
        .await
        .unwrap();
    registrar.verify_chain().await.unwrap();

    let entries = registrar.ledger().load().await.unwrap();
    assert!(entries[0].has_identity_signature());
    assert!(!entries[1].has_identity_signature());
}
