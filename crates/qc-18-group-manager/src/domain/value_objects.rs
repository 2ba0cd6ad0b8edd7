//! # Domain Value Objects
//!
//! Group lifecycle state, node identities and merkle proof shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ledger::Hash;

/// Length of a node identity in bytes (uncompressed secp256k1 key without prefix).
pub const NODE_ID_BYTES: usize = 64;

/// Length of a hex-encoded node identity.
pub const NODE_ID_HEX_LEN: usize = NODE_ID_BYTES * 2;

/// Group lifecycle state.
///
/// `NotFound` is never stored; it is what the registry reports when it has
/// no entry for a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupState {
    /// No such group.
    NotFound,
    /// Configured, ledger not running.
    Stopped,
    /// Ledger and consensus running.
    Running,
    /// Stop in progress.
    Stopping,
    /// Soft-deleted; configuration retained for recovery.
    Deleted,
}

impl GroupState {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: GroupState) -> bool {
        matches!(
            (self, next),
            (Self::NotFound, Self::Stopped)
                | (Self::Stopped, Self::Running)
                | (Self::Running, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
                // Stop failed; the ledger is still live.
                | (Self::Stopping, Self::Running)
                | (Self::Stopped, Self::Deleted)
                | (Self::Deleted, Self::Stopped)
        )
    }

    /// Can group-scoped queries be served in this state?
    pub fn is_servable(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Name used in status markers and RPC responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NOT_FOUND" => Ok(Self::NotFound),
            "STOPPED" => Ok(Self::Stopped),
            "RUNNING" => Ok(Self::Running),
            "STOPPING" => Ok(Self::Stopping),
            "DELETED" => Ok(Self::Deleted),
            other => Err(format!("unknown group state '{}'", other)),
        }
    }
}

/// Why a string is not a node identity.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeIdError {
    /// Wrong number of hex characters.
    #[error("expected {NODE_ID_HEX_LEN} hex characters, got {0}")]
    Length(usize),
    /// Not valid hex.
    #[error("not a hex string")]
    Encoding,
}

/// Hex-encoded node public key, normalized to lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Parse and normalize a node identity.
    pub fn parse(raw: &str) -> Result<Self, NodeIdError> {
        if raw.len() != NODE_ID_HEX_LEN {
            return Err(NodeIdError::Length(raw.len()));
        }
        if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(NodeIdError::Encoding);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Build from the raw public key bytes.
    pub fn from_bytes(bytes: &[u8; NODE_ID_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Hex string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NodeId::parse(&value).map_err(|e| format!("invalid node id: {}", e))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Side of a sibling in a merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Sibling is on the left.
    Left,
    /// Sibling is on the right.
    Right,
}

/// One step of a merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling hash.
    pub hash: Hash,
    /// Side the sibling sits on.
    pub position: Position,
}

impl ProofNode {
    /// Sibling on the left.
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    /// Sibling on the right.
    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// Which leaf set of a block a proof is built over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeafKind {
    /// Leaves over transaction hashes; root is `transactionsRoot`.
    Transactions,
    /// Leaves over receipt digests; root is `receiptsRoot`.
    Receipts,
}

/// Inclusion proof of one transaction or receipt in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionProof {
    /// Proven transaction.
    pub transaction_hash: Hash,
    /// Containing block height.
    pub block_number: u64,
    /// Containing block hash.
    pub block_hash: Hash,
    /// Position of the leaf in the block.
    pub index: u64,
    /// Root the path recomputes to.
    pub root: Hash,
    /// Sibling path from leaf to root.
    pub path: Vec<ProofNode>,
}
