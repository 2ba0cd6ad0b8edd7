//! Group RPC error types with JSON-RPC 2.0 error codes.
//!
//! Standard codes follow JSON-RPC 2.0; group-scoped codes live in the
//! `-400xx` range.

use serde::{Deserialize, Serialize};
use std::fmt;

use qc_18_group_manager::GroupId;

/// JSON-RPC error codes
pub mod codes {
    // JSON-RPC 2.0 standard errors (-32700 to -32600)
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server errors (-32000 to -32099)
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    pub const LIMIT_EXCEEDED: i32 = -32005;

    // Group-scoped errors
    pub const GROUP_ID_NOT_EXIST: i32 = -40001;
    pub const BLOCK_HASH_NOT_EXIST: i32 = -40003;
    pub const BLOCK_NUMBER_NOT_EXIST: i32 = -40004;
    pub const TRANSACTION_INDEX_OUT_OF_RANGE: i32 = -40005;
    pub const CALL_FROM_MISSING: i32 = -40006;
    pub const NO_VIEW: i32 = -40007;
    pub const INVALID_SYSTEM_CONFIG: i32 = -40008;
    pub const INVALID_REQUEST_GROUP: i32 = -40009;
    pub const INCOMPLETE_INITIALIZATION: i32 = -40010;
    pub const NODE_SYNCING: i32 = -40013;
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional additional data
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Create a new RPC error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    // Standard JSON-RPC errors

    /// Parse error - invalid JSON
    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(
            codes::PARSE_ERROR,
            format!("Parse error: {}", details.into()),
        )
    }

    /// Invalid request - not a valid JSON-RPC request
    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_REQUEST,
            format!("Invalid request: {}", details.into()),
        )
    }

    /// Method not found
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// Invalid parameters
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            format!("Invalid params: {}", details.into()),
        )
    }

    /// Internal error. Never carries detail; log before constructing.
    pub fn internal() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal error")
    }

    /// Resource not found (transaction, receipt)
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::new(
            codes::RESOURCE_NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
        )
    }

    /// Limit exceeded (batch size)
    pub fn limit_exceeded(limit: impl Into<String>) -> Self {
        Self::new(
            codes::LIMIT_EXCEEDED,
            format!("Limit exceeded: {}", limit.into()),
        )
    }

    // Group-scoped errors

    /// Group unknown to this node; also used for ids outside the valid range
    pub fn group_not_exist(group_id: impl Into<i64>) -> Self {
        Self::with_data(
            codes::GROUP_ID_NOT_EXIST,
            "GroupID does not exist",
            serde_json::json!({ "groupId": group_id.into() }),
        )
    }

    /// No block with this hash
    pub fn block_hash_not_exist() -> Self {
        Self::new(codes::BLOCK_HASH_NOT_EXIST, "BlockHash does not exist")
    }

    /// No block at this height
    pub fn block_number_not_exist() -> Self {
        Self::new(codes::BLOCK_NUMBER_NOT_EXIST, "BlockNumber does not exist")
    }

    /// Index past the end of the block
    pub fn transaction_index_out_of_range() -> Self {
        Self::new(
            codes::TRANSACTION_INDEX_OUT_OF_RANGE,
            "TransactionIndex is out of range",
        )
    }

    /// `call` without `from`
    pub fn call_from_missing() -> Self {
        Self::new(codes::CALL_FROM_MISSING, "Call needs a 'from' field")
    }

    /// View requested from a consensus without one
    pub fn no_view() -> Self {
        Self::new(
            codes::NO_VIEW,
            "Only pbft consensus supports the view property",
        )
    }

    /// Key outside the system config whitelist
    pub fn invalid_system_config() -> Self {
        Self::new(codes::INVALID_SYSTEM_CONFIG, "Invalid System Config")
    }

    /// Local node is neither sealer nor observer
    pub fn invalid_request_group() -> Self {
        Self::new(
            codes::INVALID_REQUEST_GROUP,
            "the node doesn't belong to the group",
        )
    }

    /// Group exists but its modules are not running
    pub fn incomplete_initialization(group_id: GroupId) -> Self {
        Self::with_data(
            codes::INCOMPLETE_INITIALIZATION,
            "RPC module initialization is incomplete",
            serde_json::json!({ "groupId": group_id }),
        )
    }

    /// Local head too far behind
    pub fn node_syncing() -> Self {
        Self::new(codes::NODE_SYNCING, "node is syncing, transaction rejected")
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl Serialize for RpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("RpcError", 3)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        if let Some(ref data) = self.data {
            state.serialize_field("data", data)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for RpcError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ErrorHelper {
            code: i32,
            message: String,
            data: Option<serde_json::Value>,
        }

        let helper = ErrorHelper::deserialize(deserializer)?;
        Ok(RpcError {
            code: helper.code,
            message: helper.message,
            data: helper.data,
        })
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_eof() {
            RpcError::parse_error(e.to_string())
        } else {
            RpcError::invalid_params(e.to_string())
        }
    }
}

impl From<hex::FromHexError> for RpcError {
    fn from(e: hex::FromHexError) -> Self {
        RpcError::invalid_params(format!("invalid hex: {}", e))
    }
}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Server-level errors (not JSON-RPC)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server terminated abnormally
    #[error("server error: {0}")]
    Server(String),
}
