//! # In-Memory Ledger
//!
//! A single-process stand-in for the ledger, consensus and sync modules of
//! one group. Blocks are sealed on demand; roots use the same merkle
//! construction the proof service verifies against.
//!
//! Raw transactions use a development encoding: the JSON form of
//! [`RawTransaction`]. The transaction hash is the Keccak-256 of the raw
//! bytes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::algorithms::{compute_merkle_root, receipt_leaves, transaction_leaves};
use crate::domain::{
    keccak, Address, Block, BlockHeader, BlockNumber, CallOutput, CallRequest, GroupDescriptor,
    GroupId, Hash, LedgerError, NodeId, SyncStatus, TotalTransactionCount, Transaction,
    TransactionLocation, TransactionReceipt, U256,
};
use crate::ports::{GroupLedger, LedgerLauncher, LedgerResult, ReceiptNotifier};

/// Gas charged per transaction.
pub const TX_GAS: u64 = 21_000;

/// Unsigned body of a development transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub to: Option<Address>,
    /// Nonce; makes otherwise identical transactions distinct.
    pub nonce: U256,
    /// Call data.
    #[serde(with = "crate::domain::ledger::serde_hex::bytes", default)]
    pub input: Vec<u8>,
    /// Last block at which the transaction may be included.
    pub block_limit: u64,
}

impl RawTransaction {
    /// Encode for `sendRawTransaction`.
    pub fn encode(&self) -> Vec<u8> {
        // Plain data; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[derive(Default)]
struct Chain {
    blocks: Vec<Block>,
    by_hash: HashMap<Hash, BlockNumber>,
    receipts: HashMap<Hash, Vec<TransactionReceipt>>,
    tx_index: HashMap<Hash, TransactionLocation>,
    pending: Vec<Transaction>,
    // Notifiers are `Send` but not `Sync`; the mutex keeps `Chain: Sync`.
    notifiers: Mutex<HashMap<Hash, ReceiptNotifier>>,
    code: HashMap<Address, Vec<u8>>,
    failed_tx: u64,
    known_highest: BlockNumber,
    view: u64,
}

/// In-memory ledger of one group.
pub struct InMemoryLedger {
    group_id: GroupId,
    node_id: NodeId,
    consensus_type: String,
    sealers: Vec<NodeId>,
    epoch_sealer_num: usize,
    observers: RwLock<Vec<NodeId>>,
    system_config: HashMap<String, String>,
    chain: RwLock<Chain>,
    running: AtomicBool,
    fail_stop: AtomicBool,
    query_count: AtomicUsize,
}

impl InMemoryLedger {
    /// Ledger with a genesis block built from `descriptor`.
    pub fn new(node_id: NodeId, descriptor: &GroupDescriptor) -> Self {
        let genesis = &descriptor.genesis;
        let system_config = [
            ("tx_count_limit", genesis.consensus.max_trans_num.to_string()),
            ("tx_gas_limit", genesis.tx.gas_limit.to_string()),
            ("rpbft_epoch_sealer_num", genesis.consensus.epoch_sealer_num.to_string()),
            ("rpbft_epoch_block_num", genesis.consensus.epoch_block_num.to_string()),
            ("consensus_timeout", genesis.consensus.consensus_timeout.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let ledger = Self {
            group_id: descriptor.group_id,
            node_id,
            consensus_type: genesis.consensus.consensus_type.clone(),
            sealers: descriptor.sealers.iter().cloned().collect(),
            epoch_sealer_num: genesis.consensus.epoch_sealer_num as usize,
            observers: RwLock::new(Vec::new()),
            system_config,
            chain: RwLock::new(Chain::default()),
            running: AtomicBool::new(true),
            fail_stop: AtomicBool::new(false),
            query_count: AtomicUsize::new(0),
        };
        ledger.commit(Vec::new(), descriptor.created_at.saturating_mul(1000));
        ledger
    }

    /// Is the instance running?
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn restart(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Number of query calls served; lets tests prove a call never arrived.
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.query_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Make the next `stop` fail.
    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Register an observer node.
    pub fn add_observer(&self, node_id: NodeId) {
        self.observers.write().push(node_id);
    }

    /// Pretend peers announced a head at `number`.
    pub fn set_known_highest(&self, number: BlockNumber) {
        self.chain.write().known_highest = number;
    }

    /// Install contract code.
    pub fn set_code(&self, address: Address, code: Vec<u8>) {
        self.chain.write().code.insert(address, code);
    }

    /// Seal every pending transaction into a new block.
    pub fn seal_block(&self) -> Block {
        let pending = std::mem::take(&mut self.chain.write().pending);
        let timestamp = self
            .chain
            .read()
            .blocks
            .last()
            .map(|b| b.header.timestamp + 1000)
            .unwrap_or(0);
        self.commit(pending, timestamp)
    }

    /// Seal blocks until the chain reaches `height`.
    pub fn advance_to(&self, height: BlockNumber) {
        while self.chain.read().blocks.len() as u64 <= height {
            self.seal_block();
        }
    }

    /// Commit `transactions` directly as the next block.
    pub fn commit(&self, transactions: Vec<Transaction>, timestamp: u64) -> Block {
        let mut chain = self.chain.write();
        let number = chain.blocks.len() as BlockNumber;
        let parent_hash = chain
            .blocks
            .last()
            .map(|b| b.header.hash)
            .unwrap_or_else(Hash::zero);

        let receipts: Vec<TransactionReceipt> = transactions
            .iter()
            .enumerate()
            .map(|(i, tx)| TransactionReceipt {
                transaction_hash: tx.hash,
                block_number: number,
                transaction_index: i as u64,
                from: tx.from,
                to: tx.to,
                gas_used: TX_GAS,
                contract_address: match tx.to {
                    Some(_) => None,
                    None => Some(Address::from_slice(&tx.hash.as_bytes()[12..])),
                },
                status: 0,
                output: Vec::new(),
            })
            .collect();

        let mut block = Block {
            header: BlockHeader {
                number,
                hash: Hash::zero(),
                parent_hash,
                timestamp,
                sealer: number % self.sealers.len().max(1) as u64,
                transactions_root: Hash::zero(),
                receipts_root: compute_merkle_root(&receipt_leaves(&receipts)),
                state_root: Hash::zero(),
                gas_used: TX_GAS * transactions.len() as u64,
            },
            transactions,
        };
        block.header.transactions_root = compute_merkle_root(&transaction_leaves(&block));
        block.header.state_root = keccak(block.header.transactions_root.as_bytes());
        block.header.hash = header_hash(&block.header);

        let block_hash = block.header.hash;
        for (i, tx) in block.transactions.iter().enumerate() {
            chain.tx_index.insert(
                tx.hash,
                TransactionLocation {
                    block_hash,
                    block_number: number,
                    index: i as u64,
                },
            );
        }
        chain.by_hash.insert(block_hash, number);
        chain.known_highest = chain.known_highest.max(number);

        let fired: Vec<(ReceiptNotifier, TransactionReceipt)> = receipts
            .iter()
            .filter_map(|r| {
                chain
                    .notifiers
                    .get_mut()
                    .remove(&r.transaction_hash)
                    .map(|n| (n, r.clone()))
            })
            .collect();
        chain.receipts.insert(block_hash, receipts);
        chain.blocks.push(block.clone());
        drop(chain);

        for (notify, receipt) in fired {
            notify(receipt);
        }
        debug!(
            "[qc-18] group {} sealed block {} with {} txs",
            self.group_id,
            number,
            block.transactions.len()
        );
        block
    }

    /// Mutate a stored block (consistency tests).
    pub fn tamper_block(&self, number: BlockNumber, f: impl FnOnce(&mut Block)) {
        if let Some(block) = self.chain.write().blocks.get_mut(number as usize) {
            f(block);
        }
    }

    /// Mutate the stored receipts of a block (consistency tests).
    pub fn tamper_receipts(&self, block_hash: &Hash, f: impl FnOnce(&mut Vec<TransactionReceipt>)) {
        if let Some(receipts) = self.chain.write().receipts.get_mut(block_hash) {
            f(receipts);
        }
    }

    /// Overwrite the index entry of a transaction (consistency tests).
    pub fn tamper_index(&self, tx_hash: Hash, location: TransactionLocation) {
        self.chain.write().tx_index.insert(tx_hash, location);
    }
}

fn header_hash(header: &BlockHeader) -> Hash {
    let mut bytes = Vec::with_capacity(8 + 32 * 3 + 8);
    bytes.extend_from_slice(&header.number.to_be_bytes());
    bytes.extend_from_slice(header.parent_hash.as_bytes());
    bytes.extend_from_slice(header.transactions_root.as_bytes());
    bytes.extend_from_slice(header.receipts_root.as_bytes());
    bytes.extend_from_slice(&header.timestamp.to_be_bytes());
    keccak(&bytes)
}

fn is_view_consensus(consensus_type: &str) -> bool {
    matches!(consensus_type, "pbft" | "rpbft")
}

impl GroupLedger for InMemoryLedger {
    fn group_id(&self) -> GroupId {
        self.group_id
    }

    fn consensus_type(&self) -> String {
        self.consensus_type.clone()
    }

    fn block_number(&self) -> LedgerResult<BlockNumber> {
        self.touch();
        Ok(self.chain.read().blocks.len().saturating_sub(1) as BlockNumber)
    }

    fn pbft_view(&self) -> LedgerResult<Option<u64>> {
        self.touch();
        if is_view_consensus(&self.consensus_type) {
            Ok(Some(self.chain.read().view))
        } else {
            Ok(None)
        }
    }

    fn sealer_list(&self) -> LedgerResult<Vec<NodeId>> {
        self.touch();
        Ok(self.sealers.clone())
    }

    fn epoch_sealer_list(&self) -> LedgerResult<Vec<NodeId>> {
        self.touch();
        if self.consensus_type == "rpbft" {
            Ok(self.sealers.iter().take(self.epoch_sealer_num).cloned().collect())
        } else {
            Ok(self.sealers.clone())
        }
    }

    fn observer_list(&self) -> LedgerResult<Vec<NodeId>> {
        self.touch();
        Ok(self.observers.read().clone())
    }

    fn consensus_status(&self) -> LedgerResult<serde_json::Value> {
        self.touch();
        let chain = self.chain.read();
        Ok(json!({
            "consensusType": self.consensus_type,
            "nodeId": self.node_id,
            "sealerNum": self.sealers.len(),
            "blockNumber": chain.blocks.len().saturating_sub(1),
            "view": chain.view,
        }))
    }

    fn sync_status(&self) -> LedgerResult<SyncStatus> {
        self.touch();
        let chain = self.chain.read();
        let head = chain.blocks.last().map(|b| b.header.hash).unwrap_or_else(Hash::zero);
        let number = chain.blocks.len().saturating_sub(1) as BlockNumber;
        let known_latest_hash = chain
            .blocks
            .get(chain.known_highest as usize)
            .map(|b| b.header.hash)
            .unwrap_or_else(Hash::zero);
        Ok(SyncStatus {
            is_syncing: chain.known_highest > number,
            block_number: number,
            latest_hash: head,
            known_highest_number: chain.known_highest,
            known_latest_hash,
            node_id: self.node_id.clone(),
        })
    }

    fn system_config(&self, key: &str) -> LedgerResult<Option<String>> {
        self.touch();
        Ok(self.system_config.get(key).cloned())
    }

    fn block_by_hash(&self, hash: &Hash) -> LedgerResult<Option<Block>> {
        self.touch();
        let chain = self.chain.read();
        Ok(chain
            .by_hash
            .get(hash)
            .and_then(|n| chain.blocks.get(*n as usize))
            .cloned())
    }

    fn block_by_number(&self, number: BlockNumber) -> LedgerResult<Option<Block>> {
        self.touch();
        Ok(self.chain.read().blocks.get(number as usize).cloned())
    }

    fn block_hash_by_number(&self, number: BlockNumber) -> LedgerResult<Option<Hash>> {
        self.touch();
        Ok(self
            .chain
            .read()
            .blocks
            .get(number as usize)
            .map(|b| b.header.hash))
    }

    fn transaction_location(&self, hash: &Hash) -> LedgerResult<Option<TransactionLocation>> {
        self.touch();
        Ok(self.chain.read().tx_index.get(hash).copied())
    }

    fn transaction_receipt(&self, hash: &Hash) -> LedgerResult<Option<TransactionReceipt>> {
        self.touch();
        let chain = self.chain.read();
        Ok(chain.tx_index.get(hash).and_then(|loc| {
            chain
                .receipts
                .get(&loc.block_hash)
                .and_then(|r| r.get(loc.index as usize))
                .cloned()
        }))
    }

    fn block_receipts(&self, block_hash: &Hash) -> LedgerResult<Option<Vec<TransactionReceipt>>> {
        self.touch();
        Ok(self.chain.read().receipts.get(block_hash).cloned())
    }

    fn pending_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        self.touch();
        Ok(self.chain.read().pending.clone())
    }

    fn pending_tx_size(&self) -> LedgerResult<u64> {
        self.touch();
        Ok(self.chain.read().pending.len() as u64)
    }

    fn code(&self, address: &Address) -> LedgerResult<Vec<u8>> {
        self.touch();
        Ok(self.chain.read().code.get(address).cloned().unwrap_or_default())
    }

    fn total_transaction_count(&self) -> LedgerResult<TotalTransactionCount> {
        self.touch();
        let chain = self.chain.read();
        Ok(TotalTransactionCount {
            tx_sum: chain.tx_index.len() as u64,
            failed_tx_sum: chain.failed_tx,
            block_number: chain.blocks.len().saturating_sub(1) as BlockNumber,
        })
    }

    fn call(&self, request: &CallRequest) -> LedgerResult<CallOutput> {
        self.touch();
        let chain = self.chain.read();
        let code = chain
            .code
            .get(&request.to)
            .ok_or_else(|| LedgerError::CallFailed(format!("no code at {:?}", request.to)))?;
        // Output is keccak(code || data).
        let mut payload = code.clone();
        payload.extend_from_slice(&request.data);
        Ok(CallOutput {
            current_block_number: chain.blocks.len().saturating_sub(1) as BlockNumber,
            output: keccak(&payload).as_bytes().to_vec(),
            status: 0,
        })
    }

    fn decode_transaction(&self, raw: &[u8]) -> LedgerResult<Transaction> {
        let body: RawTransaction = serde_json::from_slice(raw)
            .map_err(|e| LedgerError::InvalidTransaction(e.to_string()))?;
        Ok(Transaction {
            hash: keccak(raw),
            from: body.from,
            to: body.to,
            nonce: body.nonce,
            gas: TX_GAS,
            gas_price: U256::zero(),
            value: U256::zero(),
            input: body.input,
            block_limit: body.block_limit,
        })
    }

    fn submit_transaction(
        &self,
        tx: Transaction,
        notifier: Option<ReceiptNotifier>,
    ) -> LedgerResult<Hash> {
        if !self.is_running() {
            return Err(LedgerError::Rejected("ledger stopped".to_string()));
        }
        let mut chain = self.chain.write();
        let height = chain.blocks.len().saturating_sub(1) as u64;
        if tx.block_limit <= height {
            return Err(LedgerError::Rejected(format!(
                "block limit {} already passed",
                tx.block_limit
            )));
        }
        if chain.tx_index.contains_key(&tx.hash) || chain.pending.iter().any(|p| p.hash == tx.hash)
        {
            return Err(LedgerError::Rejected("duplicate transaction".to_string()));
        }
        let hash = tx.hash;
        if let Some(notify) = notifier {
            chain.notifiers.get_mut().insert(hash, notify);
        }
        chain.pending.push(tx);
        Ok(hash)
    }

    fn stop(&self) -> LedgerResult<()> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(LedgerError::StopFailed("injected failure".to_string()));
        }
        self.running.store(false, Ordering::SeqCst);
        // Pending notifiers are dropped with the pool.
        self.chain.write().notifiers.get_mut().clear();
        info!("[qc-18] group {} ledger stopped", self.group_id);
        Ok(())
    }
}

/// Launcher keeping one [`InMemoryLedger`] per group across restarts.
pub struct InMemoryLedgerLauncher {
    node_id: NodeId,
    ledgers: Mutex<HashMap<GroupId, Arc<InMemoryLedger>>>,
    failing: Mutex<HashSet<GroupId>>,
    launches: AtomicUsize,
}

impl InMemoryLedgerLauncher {
    /// Launcher for the node `node_id`.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            ledgers: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            launches: AtomicUsize::new(0),
        }
    }

    /// Ledger instance of a group, once launched.
    pub fn ledger(&self, group_id: GroupId) -> Option<Arc<InMemoryLedger>> {
        self.ledgers.lock().get(&group_id).cloned()
    }

    /// Make launches of `group_id` fail.
    pub fn fail_launch(&self, group_id: GroupId, fail: bool) {
        let mut failing = self.failing.lock();
        if fail {
            failing.insert(group_id);
        } else {
            failing.remove(&group_id);
        }
    }

    /// Successful launches so far.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl LedgerLauncher for InMemoryLedgerLauncher {
    fn launch(&self, descriptor: &GroupDescriptor) -> LedgerResult<Arc<dyn GroupLedger>> {
        let group_id = descriptor.group_id;
        if self.failing.lock().contains(&group_id) {
            return Err(LedgerError::StartFailed(format!(
                "group {} storage unavailable",
                group_id
            )));
        }

        let mut ledgers = self.ledgers.lock();
        let ledger = ledgers
            .entry(group_id)
            .or_insert_with(|| Arc::new(InMemoryLedger::new(self.node_id.clone(), descriptor)));
        ledger.restart();
        self.launches.fetch_add(1, Ordering::SeqCst);
        let ledger: Arc<dyn GroupLedger> = Arc::clone(ledger) as Arc<dyn GroupLedger>;
        Ok(ledger)
    }
}
