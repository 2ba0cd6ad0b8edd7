//! # Merkle Proofs
//!
//! Binary Keccak-256 tree over the ordered transactions (or receipts) of a
//! block. The same construction produces the roots stored in block headers
//! and the inclusion proofs served over RPC.
//!
//! # Construction
//!
//! - Leaf `i` = `keccak(u64_be(i) || payload_hash)`
//! - Parent = `keccak(left || right)`
//! - An odd node at any level is paired with itself
//! - Empty set hashes to zero; a single leaf is its own root

use sha3::{Digest, Keccak256};

use crate::domain::{Block, Hash, Position, ProofNode, TransactionReceipt};

/// Hash of leaf `index` committing to `payload`.
pub fn leaf_hash(index: u64, payload: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(index.to_be_bytes());
    hasher.update(payload.as_bytes());
    Hash::from_slice(&hasher.finalize())
}

/// Leaves over a block's transaction hashes.
pub fn transaction_leaves(block: &Block) -> Vec<Hash> {
    block
        .transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| leaf_hash(i as u64, &tx.hash))
        .collect()
}

/// Leaves over a block's receipt digests.
pub fn receipt_leaves(receipts: &[TransactionReceipt]) -> Vec<Hash> {
    receipts
        .iter()
        .enumerate()
        .map(|(i, receipt)| leaf_hash(i as u64, &receipt.digest()))
        .collect()
}

fn hash_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash::from_slice(&hasher.finalize())
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_concat(left, right)
        })
        .collect()
}

/// Root over `leaves`.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    match leaves.len() {
        0 => Hash::zero(),
        1 => leaves[0],
        _ => {
            let mut level = leaves.to_vec();
            while level.len() > 1 {
                level = next_level(&level);
            }
            level[0]
        }
    }
}

/// Sibling path for the leaf at `index`, or `None` if out of range.
pub fn build_merkle_proof(leaves: &[Hash], index: usize) -> Option<Vec<ProofNode>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = index;

    while level.len() > 1 {
        let node = if index % 2 == 0 {
            // Odd tail pairs with itself.
            let sibling = level.get(index + 1).unwrap_or(&level[index]);
            ProofNode::right(*sibling)
        } else {
            ProofNode::left(level[index - 1])
        };
        path.push(node);
        level = next_level(&level);
        index /= 2;
    }

    Some(path)
}

/// Recompute the root from `leaf` along `path`.
pub fn root_from_path(leaf: &Hash, path: &[ProofNode]) -> Hash {
    path.iter().fold(*leaf, |current, node| match node.position {
        Position::Left => hash_concat(&node.hash, &current),
        Position::Right => hash_concat(&current, &node.hash),
    })
}

/// Does `path` lead from `leaf` to `expected_root`?
pub fn verify_merkle_proof(leaf: &Hash, path: &[ProofNode], expected_root: &Hash) -> bool {
    root_from_path(leaf, path) == *expected_root
}
