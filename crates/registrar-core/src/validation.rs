//! Entry validation: dual-signature checks and chain-hash recomputation.
//!
//! Signature checks return a [`Verdict`], never an error: a failed
//! verification is an expected outcome. Structural validation of a
//! stored entry returns a [`CoreError`], because a persisted entry with
//! missing fields is corrupt, not merely untrusted.

use crate::backend::{SignatureBackend, Verdict};
use crate::chain::ChainHash;
use crate::crypto::Sha256Hash;
use crate::entry::RegistrationEntry;
use crate::error::{CanonicalizationError, CoreError};

/// Verify the chain signature against the embedded chain public key.
///
/// Reconstructs the exact message signed at sealing time; any
/// canonicalization failure is reported as a rejection.
pub fn verify_chain_signature(entry: &RegistrationEntry, scheme: &dyn SignatureBackend) -> Verdict {
    let signature = match &entry.chain_signature {
        Some(sig) => sig,
        None => return Verdict::rejected("entry has no chain signature"),
    };
    let key = match &entry.chain_public_key {
        Some(key) => key,
        None => return Verdict::rejected("entry has no chain public key"),
    };
    let message = match entry.chain_signature_message() {
        Ok(bytes) => bytes,
        Err(e) => return Verdict::rejected(format!("canonicalization failed: {}", e)),
    };
    scheme.verify(&message, signature, key)
}

/// Verify the detached identity signature against the embedded key.
pub fn verify_identity_signature(
    entry: &RegistrationEntry,
    scheme: &dyn SignatureBackend,
) -> Verdict {
    let signature = match &entry.identity_signature {
        Some(sig) => sig,
        None => return Verdict::rejected("entry has no identity signature"),
    };
    let key = match &entry.identity_public_key {
        Some(key) => key,
        None => return Verdict::rejected("entry has no identity public key"),
    };
    let message = match entry.identity_signature_message() {
        Ok(bytes) => bytes,
        Err(e) => return Verdict::rejected(format!("canonicalization failed: {}", e)),
    };
    scheme.verify(&message, signature, key)
}

/// Recompute the chain hash from the entry's own fields.
pub fn recompute_chain_hash(
    entry: &RegistrationEntry,
) -> Result<Sha256Hash, CanonicalizationError> {
    let input = entry.chain_hash_input()?;
    Ok(ChainHash::compute(&entry.prev_chain_hash, &input))
}

/// Structural checks for an entry read back from storage.
///
/// A persisted entry must be fully chained; identity fields are
/// optional but must be complete when present.
pub fn validate_entry(entry: &RegistrationEntry) -> Result<(), CoreError> {
    if entry.chain_signature.is_none() {
        return Err(CoreError::MissingField("chain_signature"));
    }
    if entry.chain_public_key.is_none() {
        return Err(CoreError::MissingField("chain_public_key"));
    }
    if entry.chain_hash.is_none() {
        return Err(CoreError::MissingField("chain_hash"));
    }

    let identity_fields = [
        entry.identity_signature.is_some(),
        entry.identity_fingerprint.is_some(),
        entry.identity_public_key.is_some(),
    ];
    if identity_fields.iter().any(|&set| set) && !identity_fields.iter().all(|&set| set) {
        return Err(CoreError::MalformedEntry(
            "partial identity-signature block".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SigningIdentity;
    use crate::crypto::SignatureBytes;
    use crate::entry::EntryBuilder;
    use serde_json::json;

    fn sealed_entry(chain: &SigningIdentity) -> RegistrationEntry {
        EntryBuilder::new("proof", json!({"v": 1}))
            .timestamp(1_736_870_400)
            .build()
            .seal(chain)
            .unwrap()
    }

    #[test]
    fn test_chain_signature_verifies() {
        let chain = SigningIdentity::ephemeral();
        let entry = sealed_entry(&chain);
        assert!(verify_chain_signature(&entry, chain.backend()).is_verified());
    }

    #[test]
    fn test_chain_hash_recomputes() {
        let chain = SigningIdentity::ephemeral();
        let entry = sealed_entry(&chain);
        let recomputed = recompute_chain_hash(&entry).unwrap();
        assert_eq!(Some(recomputed), entry.chain_hash);
    }

    #[test]
    fn test_payload_tamper_breaks_signature_and_hash() {
        let chain = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain);
        entry.payload = json!({"v": 999});

        assert!(!verify_chain_signature(&entry, chain.backend()).is_verified());
        let recomputed = recompute_chain_hash(&entry).unwrap();
        assert_ne!(Some(recomputed), entry.chain_hash);
    }

    #[test]
    fn test_timestamp_tamper_breaks_hash() {
        let chain = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain);
        entry.timestamp += 1;
        let recomputed = recompute_chain_hash(&entry).unwrap();
        assert_ne!(Some(recomputed), entry.chain_hash);
    }

    #[test]
    fn test_chain_key_tamper_breaks_hash_but_not_sign_message() {
        // The chain key is outside the signature message but inside the
        // hash input.
        let chain = SigningIdentity::ephemeral();
        let other = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain);
        entry.chain_public_key = Some(other.export_public_key().unwrap());

        let recomputed = recompute_chain_hash(&entry).unwrap();
        assert_ne!(Some(recomputed), entry.chain_hash);
        // Swapped key also breaks verification, since the signature was
        // not produced by it.
        assert!(!verify_chain_signature(&entry, chain.backend()).is_verified());
    }

    #[test]
    fn test_identity_signature_verifies() {
        let chain = SigningIdentity::ephemeral();
        let external = SigningIdentity::ephemeral();
        let entry = sealed_entry(&chain)
            .with_identity_signature(&external)
            .unwrap();
        assert!(verify_identity_signature(&entry, external.backend()).is_verified());
    }

    #[test]
    fn test_identity_signature_covers_chain_hash() {
        let chain = SigningIdentity::ephemeral();
        let external = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain)
            .with_identity_signature(&external)
            .unwrap();

        entry.chain_hash = Some(Sha256Hash::hash(b"forged"));
        assert!(!verify_identity_signature(&entry, external.backend()).is_verified());
    }

    #[test]
    fn test_missing_identity_signature_rejected_with_reason() {
        let chain = SigningIdentity::ephemeral();
        let entry = sealed_entry(&chain);
        let verdict = verify_identity_signature(&entry, chain.backend());
        assert_eq!(
            verdict.reason(),
            Some("entry has no identity signature")
        );
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let chain = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain);
        entry.chain_signature = Some(SignatureBytes::from_bytes(vec![0xff; 64]));
        assert!(!verify_chain_signature(&entry, chain.backend()).is_verified());
    }

    #[test]
    fn test_validate_entry_rejects_draft() {
        let draft = EntryBuilder::new("p", json!(null)).build();
        assert!(matches!(
            validate_entry(&draft),
            Err(CoreError::MissingField("chain_signature"))
        ));
    }

    #[test]
    fn test_validate_entry_rejects_partial_identity_block() {
        let chain = SigningIdentity::ephemeral();
        let external = SigningIdentity::ephemeral();
        let mut entry = sealed_entry(&chain)
            .with_identity_signature(&external)
            .unwrap();
        entry.identity_public_key = None;

        assert!(matches!(
            validate_entry(&entry),
            Err(CoreError::MalformedEntry(_))
        ));
    }

    #[test]
    fn test_validate_entry_accepts_sealed() {
        let chain = SigningIdentity::ephemeral();
        let entry = sealed_entry(&chain);
        assert!(validate_entry(&entry).is_ok());
    }
}
