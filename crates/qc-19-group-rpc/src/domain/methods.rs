//! Method registry.
//!
//! Every supported method with its scope and kind. Group-scoped methods take
//! the numeric group id as their first positional parameter.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Whether a method addresses one group or the whole node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodScope {
    /// Node-wide; no group id parameter
    Node,
    /// First parameter is the group id
    Group,
}

/// What a method does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Read-only lookup
    Query,
    /// Submits a transaction
    Write,
    /// Group lifecycle management; answers with a `{code, message}` object
    Lifecycle,
}

/// Method metadata
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method name (e.g., "getBlockNumber")
    pub name: &'static str,
    /// Node-wide or group-scoped
    pub scope: MethodScope,
    /// Query, write or lifecycle
    pub kind: MethodKind,
    /// Brief description
    pub description: &'static str,
}

impl MethodInfo {
    const fn group_query(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            scope: MethodScope::Group,
            kind: MethodKind::Query,
            description,
        }
    }

    const fn node_query(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            scope: MethodScope::Node,
            kind: MethodKind::Query,
            description,
        }
    }

    const fn lifecycle(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            scope: MethodScope::Group,
            kind: MethodKind::Lifecycle,
            description,
        }
    }

    /// Does the method take a group id first?
    pub const fn is_group_scoped(&self) -> bool {
        matches!(self.scope, MethodScope::Group)
    }
}

/// Method registry - all supported methods with metadata
pub static METHOD_REGISTRY: LazyLock<HashMap<&'static str, MethodInfo>> = LazyLock::new(|| {
    let methods = [
        // --- Node ---
        MethodInfo::node_query("getClientVersion", "Returns node software version and identity"),
        MethodInfo::node_query("getPeers", "Returns connected P2P peers"),
        MethodInfo::node_query("getGroupList", "Returns ids of running groups"),
        // --- System config / consensus ---
        MethodInfo::group_query("getSystemConfigByKey", "Returns a whitelisted system config value"),
        MethodInfo::group_query("getBlockNumber", "Returns current block number"),
        MethodInfo::group_query("getPbftView", "Returns the PBFT view"),
        MethodInfo::group_query("getSealerList", "Returns sealer node ids"),
        MethodInfo::group_query("getEpochSealersList", "Returns sealers of the current epoch"),
        MethodInfo::group_query("getObserverList", "Returns observer node ids"),
        MethodInfo::group_query("getConsensusStatus", "Returns consensus status"),
        // --- Sync / P2P ---
        MethodInfo::group_query("getSyncStatus", "Returns block sync status"),
        MethodInfo::group_query("getGroupPeers", "Returns connected members of the group"),
        MethodInfo::group_query("getNodeIDList", "Returns this node and its connected peers"),
        // --- Blocks ---
        MethodInfo::group_query("getBlockByHash", "Returns block by hash"),
        MethodInfo::group_query("getBlockByNumber", "Returns block by number"),
        MethodInfo::group_query("getBlockHashByNumber", "Returns block hash by number"),
        // --- Transactions ---
        MethodInfo::group_query("getTransactionByHash", "Returns transaction by hash"),
        MethodInfo::group_query(
            "getTransactionByBlockHashAndIndex",
            "Returns tx by block hash and index",
        ),
        MethodInfo::group_query(
            "getTransactionByBlockNumberAndIndex",
            "Returns tx by block number and index",
        ),
        MethodInfo::group_query("getTransactionReceipt", "Returns transaction receipt"),
        MethodInfo::group_query("getPendingTransactions", "Returns transactions in the pool"),
        MethodInfo::group_query("getPendingTxSize", "Returns pool size"),
        MethodInfo::group_query("getCode", "Returns contract code"),
        MethodInfo::group_query("getTotalTransactionCount", "Returns transaction counters"),
        MethodInfo::group_query("call", "Executes a read-only call"),
        MethodInfo {
            name: "sendRawTransaction",
            scope: MethodScope::Group,
            kind: MethodKind::Write,
            description: "Submits a signed transaction",
        },
        // --- Proofs ---
        MethodInfo::group_query(
            "getTransactionByHashWithProof",
            "Returns transaction with merkle proof",
        ),
        MethodInfo::group_query(
            "getTransactionReceiptByHashWithProof",
            "Returns receipt with merkle proof",
        ),
        // --- Group management ---
        MethodInfo::lifecycle("generateGroup", "Creates a group"),
        MethodInfo::lifecycle("startGroup", "Starts a stopped group"),
        MethodInfo::lifecycle("stopGroup", "Stops a running group"),
        MethodInfo::lifecycle("removeGroup", "Soft-deletes a stopped group"),
        MethodInfo::lifecycle("recoverGroup", "Restores a deleted group"),
        MethodInfo::lifecycle("queryGroupStatus", "Returns group lifecycle state"),
    ];

    methods.into_iter().map(|m| (m.name, m)).collect()
});

/// Get method info by name
pub fn get_method_info(method: &str) -> Option<&'static MethodInfo> {
    METHOD_REGISTRY.get(method)
}

/// Check if method is supported
pub fn is_method_supported(method: &str) -> bool {
    METHOD_REGISTRY.contains_key(method)
}

/// Get all methods of a kind
pub fn get_methods_by_kind(kind: MethodKind) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = METHOD_REGISTRY
        .values()
        .filter(|m| m.kind == kind)
        .map(|m| m.name)
        .collect();
    names.sort_unstable();
    names
}
