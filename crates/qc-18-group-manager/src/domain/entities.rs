//! # Domain Entities
//!
//! Group descriptor plus the genesis and group configuration persisted for
//! every group.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::errors::GroupId;
use super::value_objects::{GroupState, NodeId};

/// Genesis configuration: the group's initial membership and chain rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Group identity.
    pub group: GenesisGroupSection,
    /// Consensus parameters.
    pub consensus: GenesisConsensusSection,
    /// Storage backend.
    pub storage: GenesisStorageSection,
    /// Transaction limits.
    pub tx: GenesisTxSection,
}

/// `[group]` section of the genesis file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisGroupSection {
    /// Group id.
    pub id: GroupId,
    /// Creation timestamp (Unix seconds).
    pub timestamp: u64,
}

/// `[consensus]` section of the genesis file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisConsensusSection {
    /// Consensus algorithm name.
    pub consensus_type: String,
    /// Max transactions per block.
    pub max_trans_num: u64,
    /// View change timeout in seconds.
    pub consensus_timeout: u64,
    /// Sealers per epoch (rPBFT).
    pub epoch_sealer_num: u64,
    /// Blocks per epoch (rPBFT).
    pub epoch_block_num: u64,
    /// Initial sealer set.
    pub sealers: Vec<NodeId>,
}

/// `[storage]` section of the genesis file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisStorageSection {
    /// Storage backend name.
    pub storage_type: String,
}

/// `[tx]` section of the genesis file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisTxSection {
    /// Per-transaction gas limit.
    pub gas_limit: u64,
}

impl GenesisConfig {
    /// Template used when generating new groups. Group id, timestamp and
    /// sealers are filled in by [`GenesisConfig::for_group`].
    pub fn template() -> Self {
        Self {
            group: GenesisGroupSection { id: 0, timestamp: 0 },
            consensus: GenesisConsensusSection {
                consensus_type: "pbft".to_string(),
                max_trans_num: 1000,
                consensus_timeout: 3,
                epoch_sealer_num: 4,
                epoch_block_num: 1000,
                sealers: Vec::new(),
            },
            storage: GenesisStorageSection {
                storage_type: "rocksdb".to_string(),
            },
            tx: GenesisTxSection {
                gas_limit: 300_000_000,
            },
        }
    }

    /// Instantiate this template for a concrete group.
    pub fn for_group(&self, group_id: GroupId, timestamp: u64, sealers: &BTreeSet<NodeId>) -> Self {
        let mut genesis = self.clone();
        genesis.group.id = group_id;
        genesis.group.timestamp = timestamp;
        genesis.consensus.sealers = sealers.iter().cloned().collect();
        genesis
    }

    /// Sealer set as declared in this genesis.
    pub fn sealer_set(&self) -> BTreeSet<NodeId> {
        self.consensus.sealers.iter().cloned().collect()
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self::template()
    }
}

/// Group configuration: tunables that may differ per node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Consensus tunables.
    pub consensus: GroupConsensusSection,
    /// Transaction pool tunables.
    pub tx_pool: GroupTxPoolSection,
    /// Block sync tunables.
    pub sync: GroupSyncSection,
}

/// `[consensus]` section of the group config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupConsensusSection {
    /// Max hops for consensus message forwarding.
    pub ttl: u8,
    /// Minimum block interval in milliseconds.
    pub min_block_generation_time: u64,
    /// Adapt block size to load.
    pub enable_dynamic_block_size: bool,
    /// Growth ratio when dynamic sizing is on.
    pub block_size_increase_ratio: f64,
}

/// `[tx_pool]` section of the group config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupTxPoolSection {
    /// Maximum pending transactions.
    pub limit: u64,
    /// Memory cap in MiB.
    pub memory_limit_mb: u64,
}

/// `[sync]` section of the group config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSyncSection {
    /// Idle wait between sync rounds in milliseconds.
    pub idle_wait_ms: u64,
    /// Status gossip interval in milliseconds.
    pub gossip_interval_ms: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            consensus: GroupConsensusSection {
                ttl: 2,
                min_block_generation_time: 500,
                enable_dynamic_block_size: true,
                block_size_increase_ratio: 0.5,
            },
            tx_pool: GroupTxPoolSection {
                limit: 150_000,
                memory_limit_mb: 512,
            },
            sync: GroupSyncSection {
                idle_wait_ms: 200,
                gossip_interval_ms: 1000,
            },
        }
    }
}

/// Authoritative record for one group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupDescriptor {
    /// Group id.
    pub group_id: GroupId,
    /// Persisted genesis configuration.
    pub genesis: GenesisConfig,
    /// Persisted group configuration.
    pub config: GroupConfig,
    /// Validated, non-empty sealer set.
    pub sealers: BTreeSet<NodeId>,
    /// Creation timestamp (Unix seconds).
    pub created_at: u64,
    /// Current lifecycle state.
    pub state: GroupState,
}

impl GroupDescriptor {
    /// Create a descriptor for a freshly generated group.
    pub fn new(group_id: GroupId, genesis: GenesisConfig, config: GroupConfig) -> Self {
        let sealers = genesis.sealer_set();
        let created_at = genesis.group.timestamp;
        Self {
            group_id,
            genesis,
            config,
            sealers,
            created_at,
            state: GroupState::Stopped,
        }
    }
}
