//! Governance proposals: gated, content-addressed records.
//!
//! Proposals are not part of the hash chain. Each one is identified by
//! a truncated content hash of its canonical bytes and persisted
//! write-once.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::canonical::canonical_bytes;
use crate::crypto::{Fingerprint, Sha256Hash};
use crate::error::CanonicalizationError;

/// Hex length of a proposal identifier.
pub const PROPOSAL_ID_HEX_LEN: usize = 16;

/// Truncated content hash identifying a proposal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    /// Derive the identifier from the proposal's canonical bytes.
    pub fn derive(proposal: &Value) -> Result<Self, CanonicalizationError> {
        let canonical = canonical_bytes(proposal, &[])?;
        let digest = Sha256Hash::hash(&canonical);
        Ok(Self(digest.to_hex()[..PROPOSAL_ID_HEX_LEN].to_string()))
    }

    /// Get the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId({})", self.0)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A submitted proposal with its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Truncated content hash of `proposal`.
    pub proposal_id: ProposalId,

    /// Fingerprint of the verified submitter.
    pub submitted_by: Fingerprint,

    /// Submission time, unix seconds.
    pub timestamp: i64,

    /// The proposal content itself.
    pub proposal: Value,
}

impl ProposalRecord {
    /// Wrap a proposal for a verified submitter.
    pub fn new(
        proposal: Value,
        submitted_by: Fingerprint,
        timestamp: i64,
    ) -> Result<Self, CanonicalizationError> {
        let proposal_id = ProposalId::derive(&proposal)?;
        Ok(Self {
            proposal_id,
            submitted_by,
            timestamp,
            proposal,
        })
    }
}
