//! # Validation Chain
//!
//! Stateless predicates applied to operator input before a group is created
//! or started, and to precompiled-contract calls before they reach the
//! transaction pool.

use std::collections::{BTreeSet, HashSet};

use crate::domain::{
    invariant_group_id_in_range, keccak, Address, GroupError, GroupId, GroupResult, NodeId,
};

/// System configuration keys that may be queried.
pub const SYSTEM_CONFIG_KEYS: [&str; 5] = [
    "tx_count_limit",
    "tx_gas_limit",
    "rpbft_epoch_sealer_num",
    "rpbft_epoch_block_num",
    "consensus_timeout",
];

/// Address of the consensus (sealer/observer management) precompile.
pub const CONSENSUS_PRECOMPILE_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x03,
]);

/// Consensus precompile methods whose only argument is a node id.
pub const NODE_ID_METHODS: [&str; 3] = ["addSealer(string)", "addObserver(string)", "remove(string)"];

/// Group id from a raw RPC integer.
pub fn check_group_id(raw: i64) -> GroupResult<GroupId> {
    invariant_group_id_in_range(raw)
}

/// Parse the sealer list: non-empty, well-formed, no duplicates.
///
/// Duplicates are detected after case normalization, so `AB..` and `ab..`
/// collide.
pub fn check_sealer_id<S: AsRef<str>>(raw: &[S]) -> GroupResult<BTreeSet<NodeId>> {
    if raw.is_empty() {
        return Err(GroupError::InvalidParams("sealer list is empty".to_string()));
    }

    let mut sealers = BTreeSet::new();
    for entry in raw {
        let entry = entry.as_ref();
        let node_id = NodeId::parse(entry).map_err(|e| {
            GroupError::InvalidParams(format!("invalid sealer id '{}': {}", entry, e))
        })?;
        if !sealers.insert(node_id) {
            return Err(GroupError::InvalidParams(format!(
                "duplicate sealer id '{}'",
                entry
            )));
        }
    }
    Ok(sealers)
}

/// Parse a creation timestamp given as decimal Unix seconds.
///
/// With `max_skew_secs` set, the value must lie within that distance of
/// `now_secs` in either direction.
pub fn check_timestamp(raw: &str, now_secs: u64, max_skew_secs: Option<u64>) -> GroupResult<u64> {
    let timestamp: u64 = raw
        .trim()
        .parse()
        .map_err(|_| GroupError::InvalidParams(format!("invalid timestamp '{}'", raw)))?;
    if timestamp == 0 {
        return Err(GroupError::InvalidParams("timestamp must be positive".to_string()));
    }
    if let Some(skew) = max_skew_secs {
        if timestamp.abs_diff(now_secs) > skew {
            return Err(GroupError::InvalidParams(format!(
                "timestamp {} is more than {}s away from local time {}",
                timestamp, skew, now_secs
            )));
        }
    }
    Ok(timestamp)
}

/// Every sealer other than this node must be a connected peer.
pub fn check_connection(
    sealers: &BTreeSet<NodeId>,
    self_id: &NodeId,
    connected: &HashSet<NodeId>,
) -> GroupResult<()> {
    let missing: Vec<NodeId> = sealers
        .iter()
        .filter(|id| *id != self_id && !connected.contains(*id))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GroupError::PeersNotConnected(missing))
    }
}

/// Is `key` a queryable system configuration key?
pub fn is_valid_system_config(key: &str) -> bool {
    SYSTEM_CONFIG_KEYS.contains(&key)
}

/// 4-byte ABI selector of a method signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

/// If a call targets the consensus precompile with a node-id method, return
/// the ABI-encoded arguments (call data after the selector).
pub fn node_id_call_arguments<'a>(to: Option<&Address>, input: &'a [u8]) -> Option<&'a [u8]> {
    if to != Some(&CONSENSUS_PRECOMPILE_ADDRESS) || input.len() < 4 {
        return None;
    }
    let (head, args) = input.split_at(4);
    NODE_ID_METHODS
        .iter()
        .any(|sig| selector(sig) == head)
        .then_some(args)
}

/// Decode a single ABI `string` argument.
pub fn decode_abi_string(args: &[u8]) -> Option<String> {
    let offset = read_word_usize(args, 0)?;
    let len = read_word_usize(args, offset)?;
    let start = offset.checked_add(32)?;
    let end = start.checked_add(len)?;
    let bytes = args.get(start..end)?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn read_word_usize(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at.checked_add(32)?)?;
    // Values above usize range cannot index the buffer anyway.
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}

/// ABI-encode a single `string` argument.
pub fn encode_abi_string(value: &str) -> Vec<u8> {
    let mut out = vec![0u8; 32];
    out[31] = 32;
    let mut len = [0u8; 32];
    len[24..].copy_from_slice(&(value.len() as u64).to_be_bytes());
    out.extend_from_slice(&len);
    let mut body = value.as_bytes().to_vec();
    body.resize(value.len().div_ceil(32) * 32, 0);
    out.extend(body);
    out
}

/// Do the ABI-encoded arguments carry a well-formed node id?
pub fn is_valid_node_id(args: &[u8]) -> bool {
    decode_abi_string(args)
        .map(|s| NodeId::parse(&s).is_ok())
        .unwrap_or(false)
}
