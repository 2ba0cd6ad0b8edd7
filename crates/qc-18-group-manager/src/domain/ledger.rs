//! # Ledger Types
//!
//! Data carried across the ledger port. The ledger module owns these; this
//! subsystem only routes them and builds proofs over them.
//!
//! Numbers and byte strings serialize as `0x`-prefixed hex, matching the
//! JSON-RPC surface.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::value_objects::NodeId;

pub use primitive_types::{H160 as Address, H256 as Hash, U256};

/// Block height.
pub type BlockNumber = u64;

/// Keccak-256 of arbitrary bytes.
pub fn keccak(data: &[u8]) -> Hash {
    Hash::from_slice(&Keccak256::digest(data))
}

/// Serde helpers for `0x` hex encodings.
pub mod serde_hex {
    /// `u64` as `"0x1a"`; accepts hex strings, decimal strings and numbers.
    pub mod u64 {
        use serde::{de, Deserialize, Deserializer, Serializer};

        /// Serialize as hex quantity.
        pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("0x{:x}", value))
        }

        /// Deserialize from hex/decimal string or number.
        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Raw {
                Num(u64),
                Str(String),
            }
            match Raw::deserialize(deserializer)? {
                Raw::Num(n) => Ok(n),
                Raw::Str(s) => super::parse_quantity(&s).map_err(de::Error::custom),
            }
        }
    }

    /// `Vec<u8>` as `"0xdeadbeef"`.
    pub mod bytes {
        use serde::{de, Deserialize, Deserializer, Serializer};

        /// Serialize as 0x-prefixed hex.
        pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("0x{}", hex::encode(value)))
        }

        /// Deserialize from hex with or without the prefix.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<u8>, D::Error> {
            let s = String::deserialize(deserializer)?;
            super::decode_bytes(&s).map_err(de::Error::custom)
        }
    }

    /// Parse a quantity given as `0x` hex or decimal.
    pub fn parse_quantity(s: &str) -> Result<u64, String> {
        let s = s.trim();
        if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if hex_str.is_empty() {
                return Err("empty hex quantity".to_string());
            }
            u64::from_str_radix(hex_str, 16).map_err(|e| format!("invalid hex quantity '{}': {}", s, e))
        } else {
            s.parse::<u64>()
                .map_err(|e| format!("invalid quantity '{}': {}", s, e))
        }
    }

    /// Decode hex bytes with optional `0x` prefix.
    pub fn decode_bytes(s: &str) -> Result<Vec<u8>, String> {
        let body = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        hex::decode(body).map_err(|e| format!("invalid hex bytes: {}", e))
    }
}

/// Block header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Height.
    #[serde(with = "serde_hex::u64")]
    pub number: BlockNumber,
    /// Block hash.
    pub hash: Hash,
    /// Parent block hash.
    pub parent_hash: Hash,
    /// Seal time (Unix milliseconds).
    #[serde(with = "serde_hex::u64")]
    pub timestamp: u64,
    /// Index of the sealing node in the sealer list.
    #[serde(with = "serde_hex::u64")]
    pub sealer: u64,
    /// Merkle root over the block's transactions.
    pub transactions_root: Hash,
    /// Merkle root over the block's receipts.
    pub receipts_root: Hash,
    /// World-state root after execution.
    pub state_root: Hash,
    /// Gas consumed by the block.
    #[serde(with = "serde_hex::u64")]
    pub gas_used: u64,
}

/// Signed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction hash.
    pub hash: Hash,
    /// Sender.
    pub from: Address,
    /// Recipient; `None` for contract creation.
    pub to: Option<Address>,
    /// Random nonce.
    pub nonce: U256,
    /// Gas limit.
    #[serde(with = "serde_hex::u64")]
    pub gas: u64,
    /// Gas price.
    pub gas_price: U256,
    /// Transferred value.
    pub value: U256,
    /// Call data.
    #[serde(with = "serde_hex::bytes")]
    pub input: Vec<u8>,
    /// Last block at which the transaction is still valid.
    #[serde(with = "serde_hex::u64")]
    pub block_limit: u64,
}

/// Block with full transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Header.
    pub header: BlockHeader,
    /// Ordered transactions.
    pub transactions: Vec<Transaction>,
}

/// Execution receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Hash of the executed transaction.
    pub transaction_hash: Hash,
    /// Containing block.
    #[serde(with = "serde_hex::u64")]
    pub block_number: BlockNumber,
    /// Position within the block.
    #[serde(with = "serde_hex::u64")]
    pub transaction_index: u64,
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub to: Option<Address>,
    /// Gas consumed.
    #[serde(with = "serde_hex::u64")]
    pub gas_used: u64,
    /// Address of a created contract.
    pub contract_address: Option<Address>,
    /// Execution status, `0` on success.
    #[serde(with = "serde_hex::u64")]
    pub status: u64,
    /// Return data.
    #[serde(with = "serde_hex::bytes")]
    pub output: Vec<u8>,
}

impl TransactionReceipt {
    /// Digest over the receipt's canonical field encoding.
    ///
    /// Fields are concatenated in declaration order; optional addresses are
    /// preceded by a presence byte and `output` by its big-endian length.
    pub fn digest(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.transaction_hash.as_bytes());
        hasher.update(self.block_number.to_be_bytes());
        hasher.update(self.transaction_index.to_be_bytes());
        hasher.update(self.from.as_bytes());
        update_optional_address(&mut hasher, self.to.as_ref());
        hasher.update(self.gas_used.to_be_bytes());
        update_optional_address(&mut hasher, self.contract_address.as_ref());
        hasher.update(self.status.to_be_bytes());
        hasher.update((self.output.len() as u64).to_be_bytes());
        hasher.update(&self.output);
        Hash::from_slice(&hasher.finalize())
    }
}

fn update_optional_address(hasher: &mut Keccak256, address: Option<&Address>) {
    match address {
        Some(addr) => {
            hasher.update([1u8]);
            hasher.update(addr.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Where a transaction sits in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLocation {
    /// Containing block hash.
    pub block_hash: Hash,
    /// Containing block height.
    #[serde(with = "serde_hex::u64")]
    pub block_number: BlockNumber,
    /// Position within the block.
    #[serde(with = "serde_hex::u64")]
    pub index: u64,
}

/// Block sync progress of one group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Actively downloading blocks.
    pub is_syncing: bool,
    /// Local head.
    pub block_number: BlockNumber,
    /// Local head hash.
    pub latest_hash: Hash,
    /// Highest head announced by peers.
    pub known_highest_number: BlockNumber,
    /// Hash of that head.
    pub known_latest_hash: Hash,
    /// This node.
    pub node_id: NodeId,
}

impl SyncStatus {
    /// How far the local head is behind the best known head.
    pub fn lag(&self) -> u64 {
        self.known_highest_number.saturating_sub(self.block_number)
    }
}

/// Transaction counters of one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalTransactionCount {
    /// Transactions committed.
    #[serde(with = "serde_hex::u64")]
    pub tx_sum: u64,
    /// Failed transactions committed.
    #[serde(with = "serde_hex::u64")]
    pub failed_tx_sum: u64,
    /// Current height.
    #[serde(with = "serde_hex::u64")]
    pub block_number: BlockNumber,
}

/// A connected P2P peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// Peer identity.
    pub node_id: NodeId,
    /// `host:port` of the session.
    pub ip_and_port: String,
    /// Groups the peer participates in.
    pub groups: Vec<u16>,
}

/// Read-only contract call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Caller; required.
    pub from: Option<Address>,
    /// Contract address.
    pub to: Address,
    /// ABI-encoded call data.
    #[serde(with = "serde_hex::bytes", default)]
    pub data: Vec<u8>,
    /// Value; ignored by read-only calls.
    #[serde(default)]
    pub value: Option<U256>,
}

/// Result of a read-only call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutput {
    /// Height the call executed against.
    #[serde(with = "serde_hex::u64")]
    pub current_block_number: BlockNumber,
    /// Return data.
    #[serde(with = "serde_hex::bytes")]
    pub output: Vec<u8>,
    /// Execution status, `0` on success.
    #[serde(with = "serde_hex::u64")]
    pub status: u64,
}
