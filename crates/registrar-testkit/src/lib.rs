//! # Registrar Testkit
//!
//! Shared fixtures, proptest generators, and deterministic vectors for
//! testing the registrar crates.

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_member_fixtures, TestFixture};
pub use generators::{entry_from_params, EntryParams};
pub use vectors::reference_chain;
