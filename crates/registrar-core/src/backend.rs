//! Signing backends: the black-box signature service seam.
//!
//! Two independently configured identities exist in the system: the
//! ephemeral chain identity, generated per ledger instance and used
//! only for chain signatures, and the long-lived external identity
//! representing a real-world registrant.
//!
//! Backends that perform real I/O must bound their calls with a timeout
//! and surface it as [`BackendError::Timeout`]; a verification call
//! never hangs and never panics on malformed input.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::crypto::{Fingerprint, KeyMaterial, Keypair, SignatureBytes};
use crate::error::BackendError;

/// Outcome of a signature verification.
///
/// Verification failure is an expected, common result (e.g. checking an
/// untrusted third-party entry), so it is a value with a diagnostic
/// reason, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The signature is valid for the given message and key.
    Verified,
    /// The signature did not verify.
    Rejected { reason: String },
}

impl Verdict {
    /// Build a rejection with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Verdict::Rejected {
            reason: reason.into(),
        }
    }

    /// Whether the signature verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Verified => None,
            Verdict::Rejected { reason } => Some(reason),
        }
    }
}

/// A signature scheme the ledger can delegate to.
///
/// The core never inspects key material; it stores whatever
/// `export_public_key` returns and passes it back to `verify`.
pub trait SignatureBackend: Send + Sync {
    /// Sign a message with the backend's own key.
    ///
    /// Fails if the backend is unavailable or the key is unknown; never
    /// silently returns invalid output.
    fn sign(&self, message: &[u8]) -> Result<SignatureBytes, BackendError>;

    /// Verify a signature over a message against the given key.
    ///
    /// Total: malformed input yields a [`Verdict::Rejected`], never a
    /// panic or an error.
    fn verify(&self, message: &[u8], signature: &SignatureBytes, key: &KeyMaterial) -> Verdict;

    /// Export the backend's public key as an opaque blob.
    fn export_public_key(&self) -> Result<KeyMaterial, BackendError>;

    /// The stable identifier of the backend's key.
    fn fingerprint(&self) -> Fingerprint;
}

/// A key holder bound to one signing backend.
#[derive(Clone)]
pub struct SigningIdentity {
    backend: Arc<dyn SignatureBackend>,
}

impl SigningIdentity {
    /// Wrap an already-configured backend.
    pub fn new(backend: Arc<dyn SignatureBackend>) -> Self {
        Self { backend }
    }

    /// A fresh ephemeral Ed25519 identity, suitable as a chain identity.
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(Ed25519Backend::generate()))
    }

    /// A deterministic Ed25519 identity from a seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(Arc::new(Ed25519Backend::from_seed(seed)))
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Result<SignatureBytes, BackendError> {
        self.backend.sign(message)
    }

    /// Verify a signature against the given key material.
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes, key: &KeyMaterial) -> Verdict {
        self.backend.verify(message, signature, key)
    }

    /// Export this identity's public key.
    pub fn export_public_key(&self) -> Result<KeyMaterial, BackendError> {
        self.backend.export_public_key()
    }

    /// This identity's fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        self.backend.fingerprint()
    }

    /// Access the underlying scheme, e.g. for verifying third-party
    /// entries.
    pub fn backend(&self) -> &dyn SignatureBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningIdentity({:?})", self.backend.fingerprint())
    }
}

/// In-process Ed25519 backend.
///
/// Key material is the raw 32-byte verifying key; signatures are the
/// raw 64 bytes. The fingerprint is the uppercase hex of the first 20
/// bytes of SHA-256 over the public key.
pub struct Ed25519Backend {
    keypair: Keypair,
}

impl Ed25519Backend {
    /// Generate a backend with a fresh random key.
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// Build a backend from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(seed),
        }
    }

    /// The fingerprint of any Ed25519 public key in this scheme.
    pub fn fingerprint_of(key: &KeyMaterial) -> Fingerprint {
        let digest = Sha256::digest(key.as_bytes());
        Fingerprint::new(hex::encode_upper(&digest[..20]))
    }
}

impl SignatureBackend for Ed25519Backend {
    fn sign(&self, message: &[u8]) -> Result<SignatureBytes, BackendError> {
        Ok(self.keypair.sign(message))
    }

    fn verify(&self, message: &[u8], signature: &SignatureBytes, key: &KeyMaterial) -> Verdict {
        let key_bytes: [u8; 32] = match key.as_bytes().try_into() {
            Ok(bytes) => bytes,
            Err(_) => {
                return Verdict::rejected(format!(
                    "key material has {} bytes, expected 32",
                    key.as_bytes().len()
                ))
            }
        };

        let verifying_key = match VerifyingKey::from_bytes(&key_bytes) {
            Ok(vk) => vk,
            Err(_) => return Verdict::rejected("key material is not a valid Ed25519 point"),
        };

        let sig_bytes: [u8; 64] = match signature.as_bytes().try_into() {
            Ok(bytes) => bytes,
            Err(_) => {
                return Verdict::rejected(format!(
                    "signature has {} bytes, expected 64",
                    signature.as_bytes().len()
                ))
            }
        };

        match verifying_key.verify(message, &Signature::from_bytes(&sig_bytes)) {
            Ok(()) => Verdict::Verified,
            Err(_) => Verdict::rejected("signature does not verify"),
        }
    }

    fn export_public_key(&self) -> Result<KeyMaterial, BackendError> {
        Ok(self.keypair.public_key())
    }

    fn fingerprint(&self) -> Fingerprint {
        Self::fingerprint_of(&self.keypair.public_key())
    }
}

impl fmt::Debug for Ed25519Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Backend({:?})", self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let backend = Ed25519Backend::generate();
        let message = b"attestation bytes";
        let signature = backend.sign(message).unwrap();
        let key = backend.export_public_key().unwrap();

        assert!(backend.verify(message, &signature, &key).is_verified());
    }

    #[test]
    fn test_tampered_message_rejected() {
        let backend = Ed25519Backend::generate();
        let signature = backend.sign(b"original").unwrap();
        let key = backend.export_public_key().unwrap();

        let verdict = backend.verify(b"tampered", &signature, &key);
        assert!(!verdict.is_verified());
        assert!(verdict.reason().is_some());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = Ed25519Backend::generate();
        let other = Ed25519Backend::generate();
        let signature = signer.sign(b"message").unwrap();
        let wrong_key = other.export_public_key().unwrap();

        assert!(!signer.verify(b"message", &signature, &wrong_key).is_verified());
    }

    #[test]
    fn test_malformed_inputs_never_panic() {
        let backend = Ed25519Backend::generate();
        let key = backend.export_public_key().unwrap();
        let signature = backend.sign(b"m").unwrap();

        let short_key = KeyMaterial::from_bytes(vec![1, 2, 3]);
        assert!(!backend.verify(b"m", &signature, &short_key).is_verified());

        let short_sig = SignatureBytes::from_bytes(vec![0u8; 10]);
        assert!(!backend.verify(b"m", &short_sig, &key).is_verified());

        let empty = SignatureBytes::from_bytes(Vec::new());
        assert!(!backend.verify(b"", &empty, &KeyMaterial::from_bytes(Vec::new())).is_verified());
    }

    #[test]
    fn test_fingerprint_shape() {
        let backend = Ed25519Backend::from_seed(&[7u8; 32]);
        let fp = backend.fingerprint();
        assert_eq!(fp.as_str().len(), 40);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp.as_str(), fp.as_str().to_uppercase());
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = Ed25519Backend::from_seed(&[9u8; 32]);
        let b = Ed25519Backend::from_seed(&[9u8; 32]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_identity_wrapper_delegates() {
        let identity = SigningIdentity::from_seed(&[3u8; 32]);
        let message = b"wrapped";
        let signature = identity.sign(message).unwrap();
        let key = identity.export_public_key().unwrap();
        assert!(identity.verify(message, &signature, &key).is_verified());
    }
}
