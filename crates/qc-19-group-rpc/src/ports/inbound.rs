//! # Inbound Ports
//!
//! The enumerated JSON-RPC method set as one trait. Group ids arrive as raw
//! integers; the implementation decides how out-of-range ids are reported.

use qc_18_group_manager::domain::{
    Address, BlockNumber, CallOutput, CallRequest, Hash, PeerInfo, SyncStatus,
    TotalTransactionCount, Transaction, TransactionReceipt,
};
use qc_18_group_manager::{GenerateGroupRequest, GroupId, NodeId};

use crate::domain::{
    BlockView, CallContext, ClientVersion, GroupOpResponse, ReceiptWithProof, RpcResult,
    TransactionView, TransactionWithProof,
};

/// Group RPC API - inbound port.
///
/// Every method runs synchronously on the calling worker thread.
pub trait GroupRpcApi: Send + Sync {
    // --- Node ---

    /// Software version and node identity.
    fn client_version(&self) -> RpcResult<ClientVersion>;

    /// Connected P2P peers.
    fn peers(&self) -> RpcResult<Vec<PeerInfo>>;

    /// Running groups, ascending.
    fn group_list(&self) -> RpcResult<Vec<GroupId>>;

    // --- System config / consensus ---

    /// Whitelisted system configuration value.
    fn system_config_by_key(&self, group_id: i64, key: &str) -> RpcResult<String>;

    /// Current chain height.
    fn block_number(&self, group_id: i64) -> RpcResult<BlockNumber>;

    /// PBFT view.
    fn pbft_view(&self, group_id: i64) -> RpcResult<u64>;

    /// Sealer node ids.
    fn sealer_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>>;

    /// Sealers of the current epoch.
    fn epoch_sealers_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>>;

    /// Observer node ids.
    fn observer_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>>;

    /// Consensus status document.
    fn consensus_status(&self, group_id: i64) -> RpcResult<serde_json::Value>;

    // --- Sync / P2P ---

    /// Block sync progress.
    fn sync_status(&self, group_id: i64) -> RpcResult<SyncStatus>;

    /// Group members reachable from this node, including itself.
    fn group_peers(&self, group_id: i64) -> RpcResult<Vec<NodeId>>;

    /// This node followed by its connected peers.
    fn node_id_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>>;

    // --- Blocks ---

    /// Block by hash.
    fn block_by_hash(&self, group_id: i64, hash: Hash, include_transactions: bool)
        -> RpcResult<BlockView>;

    /// Block by height.
    fn block_by_number(
        &self,
        group_id: i64,
        number: BlockNumber,
        include_transactions: bool,
    ) -> RpcResult<BlockView>;

    /// Hash of the block at `number`.
    fn block_hash_by_number(&self, group_id: i64, number: BlockNumber) -> RpcResult<Hash>;

    // --- Transactions ---

    /// Committed transaction; `None` when unknown.
    fn transaction_by_hash(&self, group_id: i64, hash: Hash) -> RpcResult<Option<TransactionView>>;

    /// Transaction at `index` of the block with `block_hash`.
    fn transaction_by_block_hash_and_index(
        &self,
        group_id: i64,
        block_hash: Hash,
        index: u64,
    ) -> RpcResult<TransactionView>;

    /// Transaction at `index` of the block at `number`.
    fn transaction_by_block_number_and_index(
        &self,
        group_id: i64,
        number: BlockNumber,
        index: u64,
    ) -> RpcResult<TransactionView>;

    /// Receipt; `None` when unknown.
    fn transaction_receipt(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<Option<TransactionReceipt>>;

    /// Transactions waiting in the pool.
    fn pending_transactions(&self, group_id: i64) -> RpcResult<Vec<Transaction>>;

    /// Pool size.
    fn pending_tx_size(&self, group_id: i64) -> RpcResult<u64>;

    /// Contract code.
    fn code(&self, group_id: i64, address: Address) -> RpcResult<Vec<u8>>;

    /// Transaction counters.
    fn total_transaction_count(&self, group_id: i64) -> RpcResult<TotalTransactionCount>;

    /// Read-only call.
    fn call(&self, group_id: i64, request: CallRequest) -> RpcResult<CallOutput>;

    /// Submit a signed transaction. Consumes the receipt callback of `ctx`.
    fn send_raw_transaction(
        &self,
        group_id: i64,
        raw: &[u8],
        ctx: &mut CallContext,
    ) -> RpcResult<Hash>;

    // --- Proofs ---

    /// Transaction with its inclusion proof.
    fn transaction_by_hash_with_proof(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<TransactionWithProof>;

    /// Receipt with its inclusion proof.
    fn transaction_receipt_by_hash_with_proof(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<ReceiptWithProof>;

    // --- Group management ---

    /// Create a group.
    fn generate_group(&self, group_id: i64, request: &GenerateGroupRequest) -> GroupOpResponse;

    /// Start a Stopped group.
    fn start_group(&self, group_id: i64) -> GroupOpResponse;

    /// Stop a Running group.
    fn stop_group(&self, group_id: i64) -> GroupOpResponse;

    /// Soft-delete a Stopped group.
    fn remove_group(&self, group_id: i64) -> GroupOpResponse;

    /// Restore a Deleted group.
    fn recover_group(&self, group_id: i64) -> GroupOpResponse;

    /// Lifecycle state of a group.
    fn query_group_status(&self, group_id: i64) -> GroupOpResponse;
}
