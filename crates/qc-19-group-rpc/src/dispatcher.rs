//! # RPC Dispatcher
//!
//! Resolves every group-scoped call to the live ledger of a Running group
//! and translates failures into JSON-RPC errors. Lifecycle methods are
//! forwarded to the [`GroupLifecycleController`] and always answer with a
//! `{code, message}` object.
//!
//! ## Resolution
//!
//! ```text
//! group id ──► registry ──► Running? ──► local node sealer/observer? ──► ledger
//!               │             │                │
//!               └ -40001      └ -40010         └ -40009
//! ```
//!
//! No ledger call is made for a group that fails resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use qc_18_group_manager::algorithms::{
    is_valid_node_id, is_valid_system_config, node_id_call_arguments,
};
use qc_18_group_manager::domain::{
    Address, Block, BlockNumber, CallOutput, CallRequest, Hash, PeerInfo, SyncStatus,
    TotalTransactionCount, Transaction, TransactionReceipt,
};
use qc_18_group_manager::{
    GenerateGroupRequest, GroupId, GroupLedger, GroupLifecycleApi, GroupLifecycleController,
    NodeId, P2pService, MAX_GROUP_ID, MIN_GROUP_ID,
};

use crate::adapters::unservable_error;
use crate::domain::{
    BlockView, CallContext, ClientVersion, GroupOpResponse, ReceiptWithProof, RpcConfig,
    RpcError, RpcResult, TransactionView, TransactionWithProof,
};
use crate::ports::GroupRpcApi;
use crate::proof::ProofQueryService;

/// Name reported by `getClientVersion`.
pub const CLIENT_NAME: &str = "quantum-chain-group-node";

/// The concrete [`GroupRpcApi`].
pub struct RpcDispatcher {
    controller: Arc<GroupLifecycleController>,
    p2p: Arc<dyn P2pService>,
    proofs: ProofQueryService,
    max_sync_lag: u64,
}

impl RpcDispatcher {
    /// Dispatcher over `controller`'s registry.
    pub fn new(
        controller: Arc<GroupLifecycleController>,
        p2p: Arc<dyn P2pService>,
        config: &RpcConfig,
    ) -> Self {
        Self {
            controller,
            p2p,
            proofs: ProofQueryService::new(config.proof_cache_size),
            max_sync_lag: config.max_sync_lag,
        }
    }

    /// Lifecycle controller behind the group-management methods.
    pub fn controller(&self) -> &Arc<GroupLifecycleController> {
        &self.controller
    }

    fn node_id(&self) -> &NodeId {
        self.controller.node_id()
    }

    /// Ledger of a Running group, without the membership check.
    fn resolve(&self, raw: i64) -> RpcResult<(GroupId, Arc<dyn GroupLedger>)> {
        let group_id = GroupId::try_from(raw)
            .ok()
            .filter(|id| (MIN_GROUP_ID..=MAX_GROUP_ID).contains(id))
            .ok_or_else(|| RpcError::group_not_exist(raw))?;
        let ledger = self
            .controller
            .registry()
            .running_ledger(group_id)
            .map_err(|reason| unservable_error(group_id, reason))?;
        Ok((group_id, ledger))
    }

    /// Ledger of a Running group this node is a member of.
    fn serving(&self, raw: i64) -> RpcResult<(GroupId, Arc<dyn GroupLedger>)> {
        let (group_id, ledger) = self.resolve(raw)?;
        let me = self.node_id();
        if ledger.sealer_list()?.contains(me) || ledger.observer_list()?.contains(me) {
            return Ok((group_id, ledger));
        }
        debug!("[qc-19] node is not a member of group {}", group_id);
        Err(RpcError::invalid_request_group())
    }

    fn ledger(&self, raw: i64) -> RpcResult<Arc<dyn GroupLedger>> {
        self.serving(raw).map(|(_, ledger)| ledger)
    }

    fn check_sync_status(&self, group_id: GroupId, ledger: &dyn GroupLedger) -> RpcResult<()> {
        let status = ledger.sync_status()?;
        if status.lag() > self.max_sync_lag {
            warn!(
                "[qc-19] group {} is {} blocks behind (limit {}), rejecting transaction",
                group_id,
                status.lag(),
                self.max_sync_lag
            );
            return Err(RpcError::node_syncing());
        }
        Ok(())
    }

    fn block_at(ledger: &dyn GroupLedger, number: BlockNumber) -> RpcResult<Block> {
        ledger
            .block_by_number(number)?
            .ok_or_else(RpcError::block_number_not_exist)
    }

    fn transaction_at(block: &Block, index: u64) -> RpcResult<TransactionView> {
        usize::try_from(index)
            .ok()
            .and_then(|i| TransactionView::in_block(block, i))
            .ok_or_else(RpcError::transaction_index_out_of_range)
    }
}

impl GroupRpcApi for RpcDispatcher {
    fn client_version(&self) -> RpcResult<ClientVersion> {
        Ok(ClientVersion {
            client: CLIENT_NAME.to_string(),
            version: crate::VERSION.to_string(),
            group_manager_version: qc_18_group_manager::VERSION.to_string(),
            node_id: self.node_id().to_string(),
        })
    }

    fn peers(&self) -> RpcResult<Vec<PeerInfo>> {
        Ok(self.p2p.peers())
    }

    fn group_list(&self) -> RpcResult<Vec<GroupId>> {
        Ok(self.controller.registry().running_group_ids())
    }

    #[instrument(skip(self))]
    fn system_config_by_key(&self, group_id: i64, key: &str) -> RpcResult<String> {
        let ledger = self.ledger(group_id)?;
        if !is_valid_system_config(key) {
            return Err(RpcError::invalid_system_config());
        }
        Ok(ledger.system_config(key)?.unwrap_or_default())
    }

    fn block_number(&self, group_id: i64) -> RpcResult<BlockNumber> {
        Ok(self.ledger(group_id)?.block_number()?)
    }

    fn pbft_view(&self, group_id: i64) -> RpcResult<u64> {
        self.ledger(group_id)?
            .pbft_view()?
            .ok_or_else(RpcError::no_view)
    }

    fn sealer_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>> {
        Ok(self.ledger(group_id)?.sealer_list()?)
    }

    fn epoch_sealers_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>> {
        Ok(self.ledger(group_id)?.epoch_sealer_list()?)
    }

    fn observer_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>> {
        Ok(self.ledger(group_id)?.observer_list()?)
    }

    fn consensus_status(&self, group_id: i64) -> RpcResult<serde_json::Value> {
        Ok(self.ledger(group_id)?.consensus_status()?)
    }

    fn sync_status(&self, group_id: i64) -> RpcResult<SyncStatus> {
        Ok(self.ledger(group_id)?.sync_status()?)
    }

    fn group_peers(&self, group_id: i64) -> RpcResult<Vec<NodeId>> {
        let ledger = self.ledger(group_id)?;
        let members: BTreeSet<NodeId> = ledger
            .sealer_list()?
            .into_iter()
            .chain(ledger.observer_list()?)
            .collect();

        let mut reachable = self.p2p.connected_node_ids();
        reachable.insert(self.node_id().clone());
        Ok(members
            .into_iter()
            .filter(|member| reachable.contains(member))
            .collect())
    }

    fn node_id_list(&self, group_id: i64) -> RpcResult<Vec<NodeId>> {
        self.serving(group_id)?;
        let mut ids = vec![self.node_id().clone()];
        ids.extend(
            self.p2p
                .peers()
                .into_iter()
                .map(|p| p.node_id)
                .filter(|id| id != self.node_id()),
        );
        Ok(ids)
    }

    #[instrument(skip(self))]
    fn block_by_hash(
        &self,
        group_id: i64,
        hash: Hash,
        include_transactions: bool,
    ) -> RpcResult<BlockView> {
        let block = self
            .ledger(group_id)?
            .block_by_hash(&hash)?
            .ok_or_else(RpcError::block_hash_not_exist)?;
        Ok(BlockView::new(&block, include_transactions))
    }

    #[instrument(skip(self))]
    fn block_by_number(
        &self,
        group_id: i64,
        number: BlockNumber,
        include_transactions: bool,
    ) -> RpcResult<BlockView> {
        let ledger = self.ledger(group_id)?;
        let block = Self::block_at(ledger.as_ref(), number)?;
        Ok(BlockView::new(&block, include_transactions))
    }

    fn block_hash_by_number(&self, group_id: i64, number: BlockNumber) -> RpcResult<Hash> {
        self.ledger(group_id)?
            .block_hash_by_number(number)?
            .ok_or_else(RpcError::block_number_not_exist)
    }

    #[instrument(skip(self))]
    fn transaction_by_hash(&self, group_id: i64, hash: Hash) -> RpcResult<Option<TransactionView>> {
        let (group, ledger) = self.serving(group_id)?;
        let Some(location) = ledger.transaction_location(&hash)? else {
            return Ok(None);
        };
        let view = ledger
            .block_by_hash(&location.block_hash)?
            .and_then(|block| TransactionView::in_block(&block, location.index as usize))
            .filter(|view| view.transaction.hash == hash);
        match view {
            Some(view) => Ok(Some(view)),
            None => {
                error!(
                    "[qc-19] group {} index for {:?} points at a missing transaction",
                    group, hash
                );
                Err(RpcError::internal())
            }
        }
    }

    fn transaction_by_block_hash_and_index(
        &self,
        group_id: i64,
        block_hash: Hash,
        index: u64,
    ) -> RpcResult<TransactionView> {
        let block = self
            .ledger(group_id)?
            .block_by_hash(&block_hash)?
            .ok_or_else(RpcError::block_hash_not_exist)?;
        Self::transaction_at(&block, index)
    }

    fn transaction_by_block_number_and_index(
        &self,
        group_id: i64,
        number: BlockNumber,
        index: u64,
    ) -> RpcResult<TransactionView> {
        let ledger = self.ledger(group_id)?;
        let block = Self::block_at(ledger.as_ref(), number)?;
        Self::transaction_at(&block, index)
    }

    fn transaction_receipt(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<Option<TransactionReceipt>> {
        Ok(self.ledger(group_id)?.transaction_receipt(&hash)?)
    }

    fn pending_transactions(&self, group_id: i64) -> RpcResult<Vec<Transaction>> {
        Ok(self.ledger(group_id)?.pending_transactions()?)
    }

    fn pending_tx_size(&self, group_id: i64) -> RpcResult<u64> {
        Ok(self.ledger(group_id)?.pending_tx_size()?)
    }

    fn code(&self, group_id: i64, address: Address) -> RpcResult<Vec<u8>> {
        Ok(self.ledger(group_id)?.code(&address)?)
    }

    fn total_transaction_count(&self, group_id: i64) -> RpcResult<TotalTransactionCount> {
        Ok(self.ledger(group_id)?.total_transaction_count()?)
    }

    #[instrument(skip(self))]
    fn call(&self, group_id: i64, request: CallRequest) -> RpcResult<CallOutput> {
        let ledger = self.ledger(group_id)?;
        if request.from.is_none() {
            return Err(RpcError::call_from_missing());
        }
        Ok(ledger.call(&request)?)
    }

    #[instrument(skip(self, raw, ctx), fields(len = raw.len()))]
    fn send_raw_transaction(
        &self,
        group_id: i64,
        raw: &[u8],
        ctx: &mut CallContext,
    ) -> RpcResult<Hash> {
        let (group, ledger) = self.serving(group_id)?;
        self.check_sync_status(group, ledger.as_ref())?;

        let tx = ledger.decode_transaction(raw)?;
        if let Some(args) = node_id_call_arguments(tx.to.as_ref(), &tx.input) {
            if !is_valid_node_id(args) {
                return Err(RpcError::invalid_params(
                    "consensus call carries a malformed node id",
                ));
            }
        }

        let notifier = ctx.take_notifier(group);
        let hash = ledger.submit_transaction(tx, notifier)?;
        debug!("[qc-19] group {} accepted transaction {:?}", group, hash);
        Ok(hash)
    }

    #[instrument(skip(self))]
    fn transaction_by_hash_with_proof(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<TransactionWithProof> {
        let (group, ledger) = self.serving(group_id)?;
        self.proofs.transaction_proof(group, ledger.as_ref(), hash)
    }

    #[instrument(skip(self))]
    fn transaction_receipt_by_hash_with_proof(
        &self,
        group_id: i64,
        hash: Hash,
    ) -> RpcResult<ReceiptWithProof> {
        let (group, ledger) = self.serving(group_id)?;
        self.proofs.receipt_proof(group, ledger.as_ref(), hash)
    }

    #[instrument(skip(self, request))]
    fn generate_group(&self, group_id: i64, request: &GenerateGroupRequest) -> GroupOpResponse {
        GroupOpResponse::from_result(self.controller.generate_group(group_id, request))
    }

    #[instrument(skip(self))]
    fn start_group(&self, group_id: i64) -> GroupOpResponse {
        GroupOpResponse::from_result(self.controller.start_group(group_id))
    }

    #[instrument(skip(self))]
    fn stop_group(&self, group_id: i64) -> GroupOpResponse {
        GroupOpResponse::from_result(self.controller.stop_group(group_id))
    }

    #[instrument(skip(self))]
    fn remove_group(&self, group_id: i64) -> GroupOpResponse {
        GroupOpResponse::from_result(self.controller.remove_group(group_id))
    }

    #[instrument(skip(self))]
    fn recover_group(&self, group_id: i64) -> GroupOpResponse {
        GroupOpResponse::from_result(self.controller.recover_group(group_id))
    }

    fn query_group_status(&self, group_id: i64) -> GroupOpResponse {
        GroupOpResponse::from_status(self.controller.query_group_status(group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codes;
    use parking_lot::Mutex;
    use qc_18_group_manager::algorithms::{encode_abi_string, selector, CONSENSUS_PRECOMPILE_ADDRESS};
    use qc_18_group_manager::domain::U256;
    use qc_18_group_manager::ports::FixedClock;
    use qc_18_group_manager::{
        GroupRegistry, GroupState, InMemoryConfigStore, InMemoryLedger, InMemoryLedgerLauncher,
        LifecycleConfig, RawTransaction, StaticP2pService, StatusCode,
    };

    const NOW: u64 = 1_600_000_000;

    fn node(p: &str) -> NodeId {
        NodeId::parse(&p.repeat(64)).unwrap()
    }

    struct Harness {
        launcher: Arc<InMemoryLedgerLauncher>,
        p2p: Arc<StaticP2pService>,
        dispatcher: RpcDispatcher,
    }

    fn harness_with(config: RpcConfig) -> Harness {
        let launcher = Arc::new(InMemoryLedgerLauncher::new(node("aa")));
        let p2p = Arc::new(StaticP2pService::new());
        let controller = Arc::new(GroupLifecycleController::new(
            LifecycleConfig::new(node("aa"), "/unused"),
            Arc::new(GroupRegistry::new()),
            Arc::new(InMemoryConfigStore::new()),
            launcher.clone(),
            p2p.clone(),
            Arc::new(FixedClock::new(NOW)),
        ));
        let dispatcher = RpcDispatcher::new(controller, p2p.clone(), &config);
        Harness {
            launcher,
            p2p,
            dispatcher,
        }
    }

    fn harness() -> Harness {
        harness_with(RpcConfig::default())
    }

    fn request(sealers: &[&str]) -> GenerateGroupRequest {
        GenerateGroupRequest::new(
            NOW.to_string(),
            sealers.iter().map(|s| s.repeat(64)).collect(),
        )
    }

    impl Harness {
        /// Group 2 Running with sealers aa (local) and bb.
        fn running(&self) -> Arc<InMemoryLedger> {
            self.p2p.connect(node("bb"), "10.0.0.2:30300");
            assert!(self.dispatcher.generate_group(2, &request(&["aa", "bb"])).code.is_success());
            assert!(self.dispatcher.start_group(2).code.is_success());
            self.launcher.ledger(2).unwrap()
        }

        fn submit(&self, nonce: u64) -> Hash {
            let raw = RawTransaction {
                from: Address::repeat_byte(1),
                to: Some(Address::repeat_byte(2)),
                nonce: U256::from(nonce),
                input: Vec::new(),
                block_limit: 1_000,
            }
            .encode();
            self.dispatcher
                .send_raw_transaction(2, &raw, &mut CallContext::new())
                .unwrap()
        }
    }

    #[test]
    fn test_unknown_group_is_group_not_exist() {
        let h = harness();
        assert_eq!(
            h.dispatcher.block_number(9).unwrap_err().code,
            codes::GROUP_ID_NOT_EXIST
        );
        assert_eq!(
            h.dispatcher.block_number(0).unwrap_err().code,
            codes::GROUP_ID_NOT_EXIST
        );
        assert_eq!(
            h.dispatcher.block_number(100_000).unwrap_err().code,
            codes::GROUP_ID_NOT_EXIST
        );
    }

    #[test]
    fn test_non_running_groups_never_reach_ledger() {
        let h = harness();
        let ledger = h.running();
        assert!(h.dispatcher.stop_group(2).code.is_success());
        let before = ledger.query_count();

        let err = h.dispatcher.block_number(2).unwrap_err();
        assert_eq!(err.code, codes::INCOMPLETE_INITIALIZATION);

        assert!(h.dispatcher.remove_group(2).code.is_success());
        let err = h
            .dispatcher
            .transaction_by_hash_with_proof(2, Hash::zero())
            .unwrap_err();
        assert_eq!(err.code, codes::INCOMPLETE_INITIALIZATION);
        assert_eq!(ledger.query_count(), before);
    }

    #[test]
    fn test_non_member_is_rejected() {
        let h = harness();
        h.p2p.connect(node("bb"), "10.0.0.2:30300");
        h.p2p.connect(node("cc"), "10.0.0.3:30300");
        assert!(h.dispatcher.generate_group(3, &request(&["bb", "cc"])).code.is_success());
        assert!(h.dispatcher.start_group(3).code.is_success());

        let err = h.dispatcher.block_number(3).unwrap_err();
        assert_eq!(err.code, codes::INVALID_REQUEST_GROUP);

        // Becoming an observer makes the group servable.
        h.launcher.ledger(3).unwrap().add_observer(node("aa"));
        assert_eq!(h.dispatcher.block_number(3).unwrap(), 0);
    }

    #[test]
    fn test_system_config_whitelist() {
        let h = harness();
        h.running();
        assert_eq!(
            h.dispatcher.system_config_by_key(2, "tx_count_limit").unwrap(),
            "1000"
        );
        assert_eq!(
            h.dispatcher
                .system_config_by_key(2, "node_private_key")
                .unwrap_err()
                .code,
            codes::INVALID_SYSTEM_CONFIG
        );
    }

    #[test]
    fn test_pbft_view_and_lists() {
        let h = harness();
        h.running();
        assert_eq!(h.dispatcher.pbft_view(2).unwrap(), 0);
        assert_eq!(h.dispatcher.sealer_list(2).unwrap(), vec![node("aa"), node("bb")]);
        assert!(h.dispatcher.observer_list(2).unwrap().is_empty());
        assert_eq!(h.dispatcher.group_list().unwrap(), vec![2]);
    }

    #[test]
    fn test_group_peers_and_node_id_list() {
        let h = harness();
        h.running();
        h.p2p.connect(node("dd"), "10.0.0.4:30300");
        assert_eq!(h.dispatcher.group_peers(2).unwrap(), vec![node("aa"), node("bb")]);

        h.p2p.disconnect(&node("bb"));
        assert_eq!(h.dispatcher.group_peers(2).unwrap(), vec![node("aa")]);
        assert_eq!(
            h.dispatcher.node_id_list(2).unwrap(),
            vec![node("aa"), node("dd")]
        );
    }

    #[test]
    fn test_block_queries() {
        let h = harness();
        let ledger = h.running();
        let tx_hash = h.submit(1);
        ledger.seal_block();

        let view = h.dispatcher.block_by_number(2, 1, false).unwrap();
        assert_eq!(view.header.number, 1);
        let hash = h.dispatcher.block_hash_by_number(2, 1).unwrap();
        let by_hash = h.dispatcher.block_by_hash(2, hash, true).unwrap();
        assert_eq!(by_hash.header, view.header);

        assert_eq!(
            h.dispatcher.block_by_number(2, 7, false).unwrap_err().code,
            codes::BLOCK_NUMBER_NOT_EXIST
        );
        assert_eq!(
            h.dispatcher
                .block_by_hash(2, Hash::repeat_byte(3), false)
                .unwrap_err()
                .code,
            codes::BLOCK_HASH_NOT_EXIST
        );

        let tx = h.dispatcher.transaction_by_block_number_and_index(2, 1, 0).unwrap();
        assert_eq!(tx.transaction.hash, tx_hash);
        assert_eq!(
            h.dispatcher
                .transaction_by_block_hash_and_index(2, hash, 1)
                .unwrap_err()
                .code,
            codes::TRANSACTION_INDEX_OUT_OF_RANGE
        );
        assert_eq!(
            h.dispatcher.transaction_by_hash(2, tx_hash).unwrap().unwrap().block_number,
            1
        );
        assert!(h.dispatcher.transaction_by_hash(2, Hash::zero()).unwrap().is_none());
    }

    #[test]
    fn test_call_requires_from() {
        let h = harness();
        let ledger = h.running();
        ledger.set_code(Address::repeat_byte(9), vec![0x60, 0x00]);

        let mut request = CallRequest {
            from: None,
            to: Address::repeat_byte(9),
            data: vec![1],
            value: None,
        };
        assert_eq!(
            h.dispatcher.call(2, request.clone()).unwrap_err().code,
            codes::CALL_FROM_MISSING
        );
        request.from = Some(Address::repeat_byte(1));
        assert_eq!(h.dispatcher.call(2, request).unwrap().status, 0);
    }

    #[test]
    fn test_send_rejected_while_syncing() {
        let h = harness_with(RpcConfig {
            max_sync_lag: 3,
            ..RpcConfig::default()
        });
        let ledger = h.running();
        ledger.set_known_highest(10);

        let raw = RawTransaction {
            from: Address::repeat_byte(1),
            to: None,
            nonce: U256::one(),
            input: Vec::new(),
            block_limit: 1_000,
        }
        .encode();
        let err = h
            .dispatcher
            .send_raw_transaction(2, &raw, &mut CallContext::new())
            .unwrap_err();
        assert_eq!(err.code, codes::NODE_SYNCING);
        assert_eq!(ledger.pending_tx_size().unwrap(), 0);
    }

    #[test]
    fn test_send_validates_consensus_node_id() {
        let h = harness();
        let ledger = h.running();
        let raw_for = |node_id: &str, nonce: u64| {
            let mut input = selector("addSealer(string)").to_vec();
            input.extend(encode_abi_string(node_id));
            RawTransaction {
                from: Address::repeat_byte(1),
                to: Some(CONSENSUS_PRECOMPILE_ADDRESS),
                nonce: U256::from(nonce),
                input,
                block_limit: 1_000,
            }
            .encode()
        };

        let err = h
            .dispatcher
            .send_raw_transaction(2, &raw_for("not-a-node", 1), &mut CallContext::new())
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);

        h.dispatcher
            .send_raw_transaction(2, &raw_for(&"cc".repeat(64), 2), &mut CallContext::new())
            .unwrap();
        assert_eq!(ledger.pending_tx_size().unwrap(), 1);
    }

    #[test]
    fn test_send_fires_callback_once_on_commit() {
        let h = harness();
        let ledger = h.running();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut ctx = CallContext::with_callback(
            move |payload, group| sink.lock().push((payload, group)),
            1,
        );

        let raw = RawTransaction {
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            nonce: U256::from(5u64),
            input: Vec::new(),
            block_limit: 1_000,
        }
        .encode();
        let hash = h.dispatcher.send_raw_transaction(2, &raw, &mut ctx).unwrap();
        assert!(!ctx.has_callback());
        assert!(seen.lock().is_empty());

        ledger.seal_block();
        ledger.seal_block();
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 2);
        let payload: serde_json::Value = serde_json::from_str(&seen[0].0).unwrap();
        assert_eq!(payload["receipt"]["transactionHash"], serde_json::to_value(hash).unwrap());
    }

    #[test]
    fn test_send_rejects_undecodable_transaction() {
        let h = harness();
        h.running();
        let mut ctx = CallContext::with_callback(|_, _| {}, 1);
        let err = h
            .dispatcher
            .send_raw_transaction(2, b"garbage", &mut ctx)
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);
    }

    #[test]
    fn test_proofs_through_dispatcher() {
        let h = harness();
        let ledger = h.running();
        let hashes: Vec<Hash> = (0..3).map(|n| h.submit(n)).collect();
        let block = ledger.seal_block();

        let proof = h.dispatcher.transaction_by_hash_with_proof(2, hashes[1]).unwrap();
        assert_eq!(proof.tx_proof.root, block.header.transactions_root);
        let receipt = h
            .dispatcher
            .transaction_receipt_by_hash_with_proof(2, hashes[1])
            .unwrap();
        assert_eq!(receipt.receipt_proof.root, block.header.receipts_root);
        assert_eq!(
            h.dispatcher
                .transaction_by_hash_with_proof(2, Hash::repeat_byte(0x42))
                .unwrap_err()
                .code,
            codes::RESOURCE_NOT_FOUND
        );
    }

    #[test]
    fn test_lifecycle_answers_with_codes() {
        let h = harness();
        let response = h.dispatcher.start_group(2);
        assert_eq!(response.code, StatusCode::GroupNotFound);

        h.dispatcher.generate_group(2, &request(&["aa"]));
        let response = h.dispatcher.query_group_status(2);
        assert_eq!(response.status, Some(GroupState::Stopped));

        let response = h.dispatcher.generate_group(2, &request(&["aa"]));
        assert_eq!(response.code, StatusCode::GroupAlreadyExists);
        assert_eq!(h.dispatcher.recover_group(2).code, StatusCode::GroupHasNotDeleted);
    }

    #[test]
    fn test_client_version() {
        let h = harness();
        let version = h.dispatcher.client_version().unwrap();
        assert_eq!(version.node_id, "aa".repeat(64));
        assert_eq!(version.client, CLIENT_NAME);
    }
}
