//! # Registrar Core
//!
//! Pure primitives for the registration ledger: entries, canonical
//! JSON, chain hashing, and signing backends.
//!
//! This crate contains no I/O, no storage, no runtime. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`RegistrationEntry`] - One attestation in the ledger
//! - [`ChainHash`] - Digest binding an entry to its predecessor
//! - [`SignatureBackend`] - The black-box signing seam
//! - [`SigningIdentity`] - A key holder bound to one backend
//!
//! ## Canonicalization
//!
//! Every hash and signature is computed over canonical JSON bytes. See
//! the [`canonical`] module; the exclusion-set constants live next to
//! [`RegistrationEntry`].

pub mod backend;
pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod proposal;
pub mod validation;

pub use backend::{Ed25519Backend, SignatureBackend, SigningIdentity, Verdict};
pub use canonical::{canonical_bytes, canonical_record};
pub use chain::{ChainHash, GENESIS_SENTINEL};
pub use crypto::{Fingerprint, KeyMaterial, Keypair, Sha256Hash, SignatureBytes};
pub use entry::{
    EntryBuilder, RegistrationEntry, CHAIN_HASH_EXCLUSIONS, CHAIN_SIGNATURE_EXCLUSIONS,
    IDENTITY_SIGNATURE_EXCLUSIONS,
};
pub use error::{BackendError, CanonicalizationError, CoreError};
pub use proposal::{ProposalId, ProposalRecord, PROPOSAL_ID_HEX_LEN};
pub use validation::{
    recompute_chain_hash, validate_entry, verify_chain_signature, verify_identity_signature,
};
