//! # Domain Errors
//!
//! Status codes and error types for group lifecycle management.
//!
//! Every `GroupError` maps onto exactly one [`StatusCode`]. Infrastructure
//! failures (storage, ledger start/stop) all collapse onto `INTERNAL_ERROR`
//! and never expose their detail through [`GroupError::public_message`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::value_objects::{GroupState, NodeId};

/// Group identifier.
pub type GroupId = u16;

/// Smallest valid group id.
pub const MIN_GROUP_ID: GroupId = 1;

/// Largest valid group id.
pub const MAX_GROUP_ID: GroupId = 32767;

/// Result code returned by every group-management operation.
///
/// Serialized verbatim as the hex strings `"0x0"` .. `"0xe"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Operation succeeded.
    Success,
    /// Infrastructure failure; detail is only logged.
    InternalError,
    /// A group with this id already exists.
    GroupAlreadyExists,
    /// The group is already running.
    GroupAlreadyRunning,
    /// The group is already stopped.
    GroupAlreadyStopped,
    /// The group has been deleted.
    GroupAlreadyDeleted,
    /// No group with this id.
    GroupNotFound,
    /// Malformed or rejected parameters.
    InvalidParams,
    /// One or more sealers are not connected.
    PeersNotConnected,
    /// Genesis configuration already on disk.
    GenesisConfAlreadyExists,
    /// Group configuration already on disk.
    GroupConfAlreadyExist,
    /// Genesis configuration missing on disk.
    GenesisConfNotFound,
    /// Group configuration missing on disk.
    GroupConfNotFound,
    /// The group is being stopped.
    GroupIsStopping,
    /// Recover requested for a group that was not removed.
    GroupHasNotDeleted,
}

impl StatusCode {
    /// All codes, in numeric order.
    pub const ALL: [StatusCode; 15] = [
        StatusCode::Success,
        StatusCode::InternalError,
        StatusCode::GroupAlreadyExists,
        StatusCode::GroupAlreadyRunning,
        StatusCode::GroupAlreadyStopped,
        StatusCode::GroupAlreadyDeleted,
        StatusCode::GroupNotFound,
        StatusCode::InvalidParams,
        StatusCode::PeersNotConnected,
        StatusCode::GenesisConfAlreadyExists,
        StatusCode::GroupConfAlreadyExist,
        StatusCode::GenesisConfNotFound,
        StatusCode::GroupConfNotFound,
        StatusCode::GroupIsStopping,
        StatusCode::GroupHasNotDeleted,
    ];

    /// Hex string used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Success => "0x0",
            StatusCode::InternalError => "0x1",
            StatusCode::GroupAlreadyExists => "0x2",
            StatusCode::GroupAlreadyRunning => "0x3",
            StatusCode::GroupAlreadyStopped => "0x4",
            StatusCode::GroupAlreadyDeleted => "0x5",
            StatusCode::GroupNotFound => "0x6",
            StatusCode::InvalidParams => "0x7",
            StatusCode::PeersNotConnected => "0x8",
            StatusCode::GenesisConfAlreadyExists => "0x9",
            StatusCode::GroupConfAlreadyExist => "0xa",
            StatusCode::GenesisConfNotFound => "0xb",
            StatusCode::GroupConfNotFound => "0xc",
            StatusCode::GroupIsStopping => "0xd",
            StatusCode::GroupHasNotDeleted => "0xe",
        }
    }

    /// Parse a wire code back into a `StatusCode`.
    pub fn from_hex(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }

    /// Is this the success code?
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StatusCode::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {}", s)))
    }
}

/// Errors from the external ledger/consensus module.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The ledger instance failed to start.
    #[error("ledger start failed: {0}")]
    StartFailed(String),

    /// The ledger instance failed to stop.
    #[error("ledger stop failed: {0}")]
    StopFailed(String),

    /// A raw transaction could not be decoded.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The transaction pool refused a transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Execution of a read-only call failed.
    #[error("call failed: {0}")]
    CallFailed(String),

    /// Any other internal failure.
    #[error("ledger internal error: {0}")]
    Internal(String),
}

/// Errors from the group configuration store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O error on {path}: {error}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error text
        error: String,
    },

    /// A stored file could not be parsed.
    #[error("failed to parse {path}: {error}")]
    Parse {
        /// File involved
        path: String,
        /// Parser error text
        error: String,
    },

    /// A value could not be serialized.
    #[error("failed to serialize: {0}")]
    Serialize(String),

    /// Exclusive create found the file already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

/// Group lifecycle error.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Group id outside `MIN_GROUP_ID..=MAX_GROUP_ID`.
    #[error("invalid group id {0}, expected 1..=32767")]
    InvalidGroupId(i64),

    /// Parameter validation failed.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Sealers not connected over P2P.
    #[error("sealers not connected: {}", format_node_ids(.0))]
    PeersNotConnected(Vec<NodeId>),

    /// Group already exists.
    #[error("group {0} already exists")]
    AlreadyExists(GroupId),

    /// Group already running.
    #[error("group {0} is already running")]
    AlreadyRunning(GroupId),

    /// Group already stopped.
    #[error("group {0} is already stopped")]
    AlreadyStopped(GroupId),

    /// Group deleted.
    #[error("group {0} has been deleted")]
    AlreadyDeleted(GroupId),

    /// Group unknown.
    #[error("group {0} not found")]
    NotFound(GroupId),

    /// Group is stopping.
    #[error("group {0} is stopping")]
    IsStopping(GroupId),

    /// Recover on a group that is not deleted.
    #[error("group {0} has not been deleted")]
    HasNotDeleted(GroupId),

    /// Genesis file already on disk.
    #[error("genesis config of group {0} already exists")]
    GenesisConfAlreadyExists(GroupId),

    /// Group config file already on disk.
    #[error("group config of group {0} already exists")]
    GroupConfAlreadyExists(GroupId),

    /// Genesis file missing.
    #[error("genesis config of group {0} not found")]
    GenesisConfNotFound(GroupId),

    /// Group config file missing.
    #[error("group config of group {0} not found")]
    GroupConfNotFound(GroupId),

    /// State machine edge not allowed.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: GroupState,
        /// Attempted state
        to: GroupState,
    },

    /// Configuration store failure.
    #[error("config store: {0}")]
    Storage(#[from] StoreError),

    /// External ledger failure.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

impl GroupError {
    /// The wire status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GroupError::InvalidGroupId(_) | GroupError::InvalidParams(_) => {
                StatusCode::InvalidParams
            }
            GroupError::PeersNotConnected(_) => StatusCode::PeersNotConnected,
            GroupError::AlreadyExists(_) => StatusCode::GroupAlreadyExists,
            GroupError::AlreadyRunning(_) => StatusCode::GroupAlreadyRunning,
            GroupError::AlreadyStopped(_) => StatusCode::GroupAlreadyStopped,
            GroupError::AlreadyDeleted(_) => StatusCode::GroupAlreadyDeleted,
            GroupError::NotFound(_) => StatusCode::GroupNotFound,
            GroupError::IsStopping(_) => StatusCode::GroupIsStopping,
            GroupError::HasNotDeleted(_) => StatusCode::GroupHasNotDeleted,
            GroupError::GenesisConfAlreadyExists(_) => StatusCode::GenesisConfAlreadyExists,
            GroupError::GroupConfAlreadyExists(_) => StatusCode::GroupConfAlreadyExist,
            GroupError::GenesisConfNotFound(_) => StatusCode::GenesisConfNotFound,
            GroupError::GroupConfNotFound(_) => StatusCode::GroupConfNotFound,
            GroupError::InvalidTransition { .. }
            | GroupError::Storage(_)
            | GroupError::Ledger(_) => StatusCode::InternalError,
        }
    }

    /// Is this an infrastructure failure?
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::InternalError
    }

    /// Message safe to return to RPC callers.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Result alias for lifecycle operations.
pub type GroupResult<T> = Result<T, GroupError>;

fn format_node_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
