//! Wire types for the group RPC surface.
//!
//! Ledger data is rendered in camelCase with `0x` hex quantities, the same
//! encoding the ledger types already use.

use serde::{Deserialize, Deserializer, Serialize};

use qc_18_group_manager::domain::ledger::serde_hex;
use qc_18_group_manager::domain::{
    Block, BlockHeader, BlockNumber, Hash, Transaction, TransactionReceipt,
};
use qc_18_group_manager::{GroupError, GroupState, StatusCode, TransactionProof};

/// Block height or index parameter.
///
/// Accepts `0x` hex strings, decimal strings and JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(pub u64);

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(Quantity(n)),
            Raw::Str(s) => serde_hex::parse_quantity(&s)
                .map(Quantity)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Hex byte string parameter (`0x` prefix optional).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        serde_hex::decode_bytes(&s)
            .map(Bytes)
            .map_err(serde::de::Error::custom)
    }
}

/// Transaction together with where it was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Transaction body.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Containing block hash.
    pub block_hash: Hash,
    /// Containing block height.
    #[serde(with = "serde_hex::u64")]
    pub block_number: BlockNumber,
    /// Position within the block.
    #[serde(with = "serde_hex::u64")]
    pub transaction_index: u64,
}

impl TransactionView {
    /// View of the transaction at `index` of `block`.
    pub fn in_block(block: &Block, index: usize) -> Option<Self> {
        block.transactions.get(index).map(|tx| Self {
            transaction: tx.clone(),
            block_hash: block.header.hash,
            block_number: block.header.number,
            transaction_index: index as u64,
        })
    }
}

/// Transactions of a block, as hashes or full bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Full transactions
    Full(Vec<TransactionView>),
    /// Hashes only
    Hashes(Vec<Hash>),
}

/// Block as returned by `getBlockByHash` / `getBlockByNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    /// Header fields.
    #[serde(flatten)]
    pub header: BlockHeader,
    /// Transactions.
    pub transactions: BlockTransactions,
}

impl BlockView {
    /// Render `block`, with full transactions when `include_transactions`.
    pub fn new(block: &Block, include_transactions: bool) -> Self {
        let transactions = if include_transactions {
            BlockTransactions::Full(
                (0..block.transactions.len())
                    .filter_map(|i| TransactionView::in_block(block, i))
                    .collect(),
            )
        } else {
            BlockTransactions::Hashes(block.transactions.iter().map(|tx| tx.hash).collect())
        };
        Self {
            header: block.header.clone(),
            transactions,
        }
    }
}

/// `getTransactionByHashWithProof` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithProof {
    /// The transaction.
    pub transaction: TransactionView,
    /// Inclusion proof against `transactionsRoot`.
    pub tx_proof: TransactionProof,
}

/// `getTransactionReceiptByHashWithProof` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptWithProof {
    /// The receipt.
    pub transaction_receipt: TransactionReceipt,
    /// Inclusion proof against `receiptsRoot`.
    pub receipt_proof: TransactionProof,
}

/// `getClientVersion` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientVersion {
    /// Software name.
    pub client: String,
    /// Crate version.
    pub version: String,
    /// Group manager crate version.
    pub group_manager_version: String,
    /// This node's identity.
    pub node_id: String,
}

/// Answer of every group-management method.
///
/// Failures are reported through `code`, never as a JSON-RPC error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOpResponse {
    /// Status code (`0x0` on success).
    pub code: StatusCode,
    /// Human-readable outcome.
    pub message: String,
    /// Group state; only for `queryGroupStatus`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<GroupState>,
}

impl GroupOpResponse {
    /// Successful operation.
    pub fn success() -> Self {
        Self {
            code: StatusCode::Success,
            message: "success".to_string(),
            status: None,
        }
    }

    /// Successful status query.
    pub fn with_status(status: GroupState) -> Self {
        Self {
            status: Some(status),
            ..Self::success()
        }
    }
}

impl From<&GroupError> for GroupOpResponse {
    fn from(e: &GroupError) -> Self {
        Self {
            code: e.status_code(),
            message: e.public_message(),
            status: None,
        }
    }
}

impl GroupOpResponse {
    /// Answer of a state-changing operation.
    pub fn from_result(result: Result<(), GroupError>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::from(&e),
        }
    }

    /// Answer of `queryGroupStatus`.
    pub fn from_status(result: Result<GroupState, GroupError>) -> Self {
        match result {
            Ok(state) => Self::with_status(state),
            Err(e) => Self::from(&e),
        }
    }
}
