//! # Algorithms Module
//!
//! Merkle proofs and input validation for group management.

pub mod merkle;
pub mod validation;

pub use merkle::{
    build_merkle_proof, compute_merkle_root, leaf_hash, receipt_leaves, root_from_path,
    transaction_leaves, verify_merkle_proof,
};
pub use validation::{
    check_connection, check_group_id, check_sealer_id, check_timestamp, decode_abi_string,
    encode_abi_string, is_valid_node_id, is_valid_system_config, node_id_call_arguments, selector,
    CONSENSUS_PRECOMPILE_ADDRESS, NODE_ID_METHODS, SYSTEM_CONFIG_KEYS,
};
