//! # Outbound Ports
//!
//! Traits for the collaborators this subsystem drives but does not
//! implement: the per-group ledger/consensus instance, the P2P service,
//! durable configuration storage and the wall clock.
//!
//! All ports are synchronous. Lifecycle calls block until the collaborator
//! confirms completion.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::domain::{
    Address, Block, BlockNumber, CallOutput, CallRequest, GenesisConfig, GroupConfig,
    GroupDescriptor, GroupId, GroupState, Hash, LedgerError, NodeId, PeerInfo, StoreError,
    SyncStatus, TotalTransactionCount, Transaction, TransactionLocation, TransactionReceipt,
};

/// Result alias for ledger calls.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// One-shot hook fired when a submitted transaction's receipt is available.
pub type ReceiptNotifier = Box<dyn FnOnce(TransactionReceipt) + Send + 'static>;

/// A live ledger + consensus + sync instance for one group.
///
/// Handed out by [`LedgerLauncher::launch`] and held by the registry while
/// the group is Running.
pub trait GroupLedger: Send + Sync {
    /// Group this instance serves.
    fn group_id(&self) -> GroupId;

    /// Consensus algorithm name (`pbft`, `rpbft`, `raft`).
    fn consensus_type(&self) -> String;

    /// Current chain height.
    fn block_number(&self) -> LedgerResult<BlockNumber>;

    /// PBFT view, `None` when the consensus has no view.
    fn pbft_view(&self) -> LedgerResult<Option<u64>>;

    /// Current sealers.
    fn sealer_list(&self) -> LedgerResult<Vec<NodeId>>;

    /// Sealers of the current epoch (rPBFT); all sealers otherwise.
    fn epoch_sealer_list(&self) -> LedgerResult<Vec<NodeId>>;

    /// Current observers.
    fn observer_list(&self) -> LedgerResult<Vec<NodeId>>;

    /// Free-form consensus status document.
    fn consensus_status(&self) -> LedgerResult<serde_json::Value>;

    /// Block sync progress.
    fn sync_status(&self) -> LedgerResult<SyncStatus>;

    /// Value of a system configuration key.
    fn system_config(&self, key: &str) -> LedgerResult<Option<String>>;

    /// Block by hash.
    fn block_by_hash(&self, hash: &Hash) -> LedgerResult<Option<Block>>;

    /// Block by height.
    fn block_by_number(&self, number: BlockNumber) -> LedgerResult<Option<Block>>;

    /// Hash of the block at `number`.
    fn block_hash_by_number(&self, number: BlockNumber) -> LedgerResult<Option<Hash>>;

    /// Index entry for a committed transaction.
    fn transaction_location(&self, hash: &Hash) -> LedgerResult<Option<TransactionLocation>>;

    /// Receipt of a committed transaction.
    fn transaction_receipt(&self, hash: &Hash) -> LedgerResult<Option<TransactionReceipt>>;

    /// All receipts of a block, in transaction order.
    fn block_receipts(&self, block_hash: &Hash) -> LedgerResult<Option<Vec<TransactionReceipt>>>;

    /// Transactions waiting in the pool.
    fn pending_transactions(&self) -> LedgerResult<Vec<Transaction>>;

    /// Number of transactions waiting in the pool.
    fn pending_tx_size(&self) -> LedgerResult<u64>;

    /// Contract code at `address`.
    fn code(&self, address: &Address) -> LedgerResult<Vec<u8>>;

    /// Transaction counters.
    fn total_transaction_count(&self) -> LedgerResult<TotalTransactionCount>;

    /// Execute a read-only call.
    fn call(&self, request: &CallRequest) -> LedgerResult<CallOutput>;

    /// Decode a signed raw transaction.
    fn decode_transaction(&self, raw: &[u8]) -> LedgerResult<Transaction>;

    /// Submit a decoded transaction to the pool.
    fn submit_transaction(
        &self,
        tx: Transaction,
        notifier: Option<ReceiptNotifier>,
    ) -> LedgerResult<Hash>;

    /// Stop the instance; blocks until its threads have exited.
    fn stop(&self) -> LedgerResult<()>;
}

/// Builds ledger instances for groups.
pub trait LedgerLauncher: Send + Sync {
    /// Start a ledger for `descriptor`; blocks until ready or failed.
    fn launch(&self, descriptor: &GroupDescriptor) -> LedgerResult<Arc<dyn GroupLedger>>;
}

/// Node-wide P2P view.
pub trait P2pService: Send + Sync {
    /// Peers with an established session.
    fn peers(&self) -> Vec<PeerInfo>;

    /// Identities of connected peers.
    fn connected_node_ids(&self) -> HashSet<NodeId> {
        self.peers().into_iter().map(|p| p.node_id).collect()
    }
}

/// One of the files a group owns on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupFile {
    /// `group.<id>.genesis`
    Genesis,
    /// `group.<id>.ini`
    GroupConfig,
    /// `group<id>/.group_status`
    Status,
}

/// Durable per-group configuration and status markers.
pub trait ConfigStore: Send + Sync {
    /// Is a genesis file present?
    fn genesis_exists(&self, group_id: GroupId) -> bool;

    /// Is a group config file present?
    fn group_config_exists(&self, group_id: GroupId) -> bool;

    /// Create the genesis file; fails if it already exists.
    fn write_genesis(&self, group_id: GroupId, genesis: &GenesisConfig) -> Result<(), StoreError>;

    /// Create the group config file; fails if it already exists.
    fn write_group_config(&self, group_id: GroupId, config: &GroupConfig)
        -> Result<(), StoreError>;

    /// Read the genesis file.
    fn read_genesis(&self, group_id: GroupId) -> Result<Option<GenesisConfig>, StoreError>;

    /// Read the group config file.
    fn read_group_config(&self, group_id: GroupId) -> Result<Option<GroupConfig>, StoreError>;

    /// Delete the listed files; missing ones are ignored (generate rollback).
    fn remove_group_files(&self, group_id: GroupId, files: &[GroupFile])
        -> Result<(), StoreError>;

    /// Persist the lifecycle marker.
    fn write_status(&self, group_id: GroupId, state: GroupState) -> Result<(), StoreError>;

    /// Read the lifecycle marker.
    fn read_status(&self, group_id: GroupId) -> Result<Option<GroupState>, StoreError>;

    /// Groups that have a genesis file, ascending.
    fn list_groups(&self) -> Result<Vec<GroupId>, StoreError>;
}

/// Wall clock.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// System time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

// =============================================================================
// Test Doubles
// =============================================================================

/// Settable clock.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    /// Clock frozen at `now` seconds.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move the clock.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// P2P service with a manually managed peer table.
#[derive(Default)]
pub struct StaticP2pService {
    peers: RwLock<Vec<PeerInfo>>,
}

impl StaticP2pService {
    /// No peers connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `node_id` connected.
    pub fn connect(&self, node_id: NodeId, ip_and_port: &str) {
        let mut peers = self.peers.write();
        if peers.iter().any(|p| p.node_id == node_id) {
            return;
        }
        peers.push(PeerInfo {
            node_id,
            ip_and_port: ip_and_port.to_string(),
            groups: Vec::new(),
        });
    }

    /// Drop the session with `node_id`.
    pub fn disconnect(&self, node_id: &NodeId) {
        self.peers.write().retain(|p| &p.node_id != node_id);
    }
}

impl P2pService for StaticP2pService {
    fn peers(&self) -> Vec<PeerInfo> {
        self.peers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(10);
        assert_eq!(clock.now_secs(), 10);
        clock.set(20);
        assert_eq!(clock.now_secs(), 20);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_secs() > 1_577_836_800);
    }

    #[test]
    fn test_static_p2p_connect_disconnect() {
        let p2p = StaticP2pService::new();
        let node = NodeId::parse(&"cd".repeat(64)).unwrap();
        p2p.connect(node.clone(), "127.0.0.1:30300");
        p2p.connect(node.clone(), "127.0.0.1:30300");
        assert_eq!(p2p.peers().len(), 1);
        assert!(p2p.connected_node_ids().contains(&node));

        p2p.disconnect(&node);
        assert!(p2p.connected_node_ids().is_empty());
    }
}
