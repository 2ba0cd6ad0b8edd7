//! # Proof Query Service
//!
//! Merkle inclusion proofs for committed transactions and receipts.
//!
//! A proof is only returned after it has been recomputed against the root
//! stored in the block header. Any disagreement between the ledger's index,
//! its blocks and its receipts is reported as an internal error, never as a
//! proof.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, error};

use qc_18_group_manager::algorithms::leaf_hash;
use qc_18_group_manager::domain::{Block, Hash, TransactionLocation, TransactionReceipt};
use qc_18_group_manager::{
    build_merkle_proof, receipt_leaves, transaction_leaves, verify_merkle_proof, GroupId,
    GroupLedger, LeafKind, TransactionProof,
};

use crate::domain::{ReceiptWithProof, RpcError, RpcResult, TransactionView, TransactionWithProof};

type LeafKey = (GroupId, Hash, LeafKind);

const DEFAULT_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => unreachable!(),
};

/// Builds and verifies inclusion proofs on top of a group's ledger.
pub struct ProofQueryService {
    leaves: Mutex<LruCache<LeafKey, Arc<Vec<Hash>>>>,
}

impl ProofQueryService {
    /// Service caching up to `cache_size` leaf sets.
    pub fn new(cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(DEFAULT_CACHE_SIZE);
        Self {
            leaves: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Leaf sets currently cached.
    pub fn cached_leaf_sets(&self) -> usize {
        self.leaves.lock().len()
    }

    /// Transaction `tx_hash` with its proof against `transactionsRoot`.
    pub fn transaction_proof(
        &self,
        group_id: GroupId,
        ledger: &dyn GroupLedger,
        tx_hash: Hash,
    ) -> RpcResult<TransactionWithProof> {
        let (location, block) = self.locate(group_id, ledger, &tx_hash)?;
        let index = location.index as usize;

        let transaction = TransactionView::in_block(&block, index)
            .ok_or_else(|| inconsistent(group_id, &tx_hash, "index past end of block"))?;
        if transaction.transaction.hash != tx_hash {
            return Err(inconsistent(group_id, &tx_hash, "indexed slot holds another transaction"));
        }

        let key = (group_id, block.header.hash, LeafKind::Transactions);
        let leaves = self.leaf_set(key, || transaction_leaves(&block));
        let tx_proof = self.prove(
            key,
            &tx_hash,
            &block,
            &leaves,
            index,
            &tx_hash,
            block.header.transactions_root,
        )?;

        Ok(TransactionWithProof {
            transaction,
            tx_proof,
        })
    }

    /// Receipt of `tx_hash` with its proof against `receiptsRoot`.
    pub fn receipt_proof(
        &self,
        group_id: GroupId,
        ledger: &dyn GroupLedger,
        tx_hash: Hash,
    ) -> RpcResult<ReceiptWithProof> {
        let (location, block) = self.locate(group_id, ledger, &tx_hash)?;
        let index = location.index as usize;

        let receipts: Vec<TransactionReceipt> = ledger
            .block_receipts(&block.header.hash)?
            .ok_or_else(|| inconsistent(group_id, &tx_hash, "block has no receipts"))?;
        if receipts.len() != block.transactions.len() {
            return Err(inconsistent(
                group_id,
                &tx_hash,
                "receipt count differs from transaction count",
            ));
        }
        let receipt = receipts
            .get(index)
            .cloned()
            .ok_or_else(|| inconsistent(group_id, &tx_hash, "index past end of receipts"))?;
        if receipt.transaction_hash != tx_hash {
            return Err(inconsistent(group_id, &tx_hash, "indexed receipt is for another transaction"));
        }

        let key = (group_id, block.header.hash, LeafKind::Receipts);
        let leaves = self.leaf_set(key, || receipt_leaves(&receipts));
        let receipt_proof = self.prove(
            key,
            &tx_hash,
            &block,
            &leaves,
            index,
            &receipt.digest(),
            block.header.receipts_root,
        )?;

        Ok(ReceiptWithProof {
            transaction_receipt: receipt,
            receipt_proof,
        })
    }

    fn locate(
        &self,
        group_id: GroupId,
        ledger: &dyn GroupLedger,
        tx_hash: &Hash,
    ) -> RpcResult<(TransactionLocation, Block)> {
        let location = ledger
            .transaction_location(tx_hash)?
            .ok_or_else(|| RpcError::resource_not_found(format!("transaction {:?}", tx_hash)))?;

        let head = ledger.block_number()?;
        if location.block_number > head {
            return Err(inconsistent(group_id, tx_hash, "indexed block above current height"));
        }

        let block = ledger
            .block_by_hash(&location.block_hash)?
            .ok_or_else(|| inconsistent(group_id, tx_hash, "indexed block missing"))?;
        if block.header.number != location.block_number {
            return Err(inconsistent(group_id, tx_hash, "indexed block height mismatch"));
        }

        Ok((location, block))
    }

    fn leaf_set(&self, key: LeafKey, build: impl FnOnce() -> Vec<Hash>) -> Arc<Vec<Hash>> {
        if let Some(hit) = self.leaves.lock().get(&key) {
            return Arc::clone(hit);
        }
        // Built outside the lock; a concurrent miss builds the same set.
        let leaves = Arc::new(build());
        self.leaves.lock().put(key, Arc::clone(&leaves));
        leaves
    }

    /// Proof for the leaf at `index`, which must commit to `payload`.
    ///
    /// A cached leaf set that no longer matches the payload is evicted and
    /// the query refused; the returned object always verifies against the
    /// returned path.
    #[allow(clippy::too_many_arguments)]
    fn prove(
        &self,
        key: LeafKey,
        tx_hash: &Hash,
        block: &Block,
        leaves: &[Hash],
        index: usize,
        payload: &Hash,
        root: Hash,
    ) -> RpcResult<TransactionProof> {
        let group_id = key.0;
        let leaf = leaves
            .get(index)
            .ok_or_else(|| inconsistent(group_id, tx_hash, "leaf index out of range"))?;
        if *leaf != leaf_hash(index as u64, payload) {
            self.leaves.lock().pop(&key);
            return Err(inconsistent(group_id, tx_hash, "leaf does not commit to returned object"));
        }
        let path = build_merkle_proof(leaves, index)
            .ok_or_else(|| inconsistent(group_id, tx_hash, "leaf index out of range"))?;
        if !verify_merkle_proof(leaf, &path, &root) {
            return Err(inconsistent(group_id, tx_hash, "recomputed root differs from header"));
        }
        debug!(
            "[qc-19] group {} proof for {:?} at block {} ({} siblings)",
            group_id,
            tx_hash,
            block.header.number,
            path.len()
        );
        Ok(TransactionProof {
            transaction_hash: *tx_hash,
            block_number: block.header.number,
            block_hash: block.header.hash,
            index: index as u64,
            root,
            path,
        })
    }
}

impl Default for ProofQueryService {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE.get())
    }
}

fn inconsistent(group_id: GroupId, tx_hash: &Hash, reason: &str) -> RpcError {
    error!(
        "[qc-19] group {} proof for {:?} refused: {}",
        group_id, tx_hash, reason
    );
    RpcError::internal()
}
