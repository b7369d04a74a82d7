//! # Registrar
//!
//! The unified registrar API: an append-only, dual-signed registration
//! ledger with identity verification and access gating.
//!
//! - [`Ledger`] appends chain-signed, hash-chained entries and can
//!   replay and verify the whole chain.
//! - [`IdentityVerifier`] checks a registered entry's detached identity
//!   signature and memoizes successes.
//! - [`AccessGate`] wraps protected operations so they only run for a
//!   verified fingerprint.
//! - [`Registrar`] wires the three together over one shared store.
//!
//! ```no_run
//! use std::sync::Arc;
//! use registrar::{Registrar, MemoryStore};
//! use registrar_core::{Ed25519Backend, SigningIdentity};
//! use serde_json::json;
//!
//! # async fn demo() -> registrar::Result<()> {
//! let registrar = Registrar::open(
//!     MemoryStore::new(),
//!     Arc::new(Ed25519Backend::generate()),
//! )
//! .await?;
//!
//! let entry = registrar
//!     .register_proof(json!({"epochs": 10}), "training_proof")
//!     .await?;
//!
//! let me = SigningIdentity::ephemeral();
//! let entry = registrar.attach_identity_signature(entry, &me).await?;
//! registrar.register_member(&entry).await?;
//! registrar.verify_chain().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod gate;
mod ledger;
mod registrar;
mod verifier;

pub use error::{ChainIntegrityError, RegistrarError, Result};
pub use gate::AccessGate;
pub use ledger::{verify_entries, Ledger};
pub use registrar::Registrar;
pub use verifier::{IdentityVerifier, MemberInfo};

// Re-export the commonly needed building blocks.
pub use registrar_core::{
    ChainHash, Fingerprint, ProposalId, ProposalRecord, RegistrationEntry, SignatureBackend,
    SigningIdentity, Verdict,
};
pub use registrar_store::{MemoryStore, SqliteStore, Store};
