//! # Group Lifecycle and Proof Scenarios
//!
//! Walkthroughs of the documented node behaviour, driven through the RPC
//! dispatcher exactly as a JSON-RPC client would reach it.

use qc_18_group_manager::algorithms::leaf_hash;
use qc_18_group_manager::domain::Hash;
use qc_18_group_manager::{verify_merkle_proof, GroupState, StatusCode};
use qc_19_group_rpc::{codes, GroupRpcApi};

use super::fixtures::{generate_request, node_id, TestNode};

const GROUP: i64 = 2;

fn state_of(node: &TestNode, group_id: i64) -> GroupState {
    node.dispatcher
        .query_group_status(group_id)
        .status
        .unwrap_or(GroupState::NotFound)
}

// =============================================================================
// SCENARIOS 1-4: LIFECYCLE
// =============================================================================

#[test]
fn test_generate_on_fresh_node_leaves_group_stopped() {
    let node = TestNode::in_memory();
    let response = node
        .dispatcher
        .generate_group(GROUP, &generate_request(&["aa", "bb"]));
    assert_eq!(response.code, StatusCode::Success);
    assert_eq!(state_of(&node, GROUP), GroupState::Stopped);
}

#[test]
fn test_start_with_unreachable_sealers_keeps_group_stopped() {
    let node = TestNode::in_memory();
    node.dispatcher
        .generate_group(GROUP, &generate_request(&["aa", "bb"]));

    let response = node.dispatcher.start_group(GROUP);
    assert_eq!(response.code, StatusCode::PeersNotConnected);
    assert_eq!(state_of(&node, GROUP), GroupState::Stopped);
    assert_eq!(node.launcher.launch_count(), 0);
}

#[test]
fn test_start_with_reachable_sealers_runs_group() {
    let node = TestNode::in_memory();
    node.dispatcher
        .generate_group(GROUP, &generate_request(&["aa", "bb"]));
    node.connect("bb");

    let response = node.dispatcher.start_group(GROUP);
    assert_eq!(response.code, StatusCode::Success);
    assert_eq!(state_of(&node, GROUP), GroupState::Running);
    assert_eq!(node.dispatcher.group_list().unwrap(), vec![2]);
}

#[test]
fn test_stop_twice() {
    let node = TestNode::in_memory();
    node.running_group(2);

    assert_eq!(node.dispatcher.stop_group(GROUP).code, StatusCode::Success);
    assert_eq!(
        node.dispatcher.stop_group(GROUP).code,
        StatusCode::GroupAlreadyStopped
    );
    assert_eq!(state_of(&node, GROUP), GroupState::Stopped);
}

// =============================================================================
// OPERATION x STATE TABLE
// =============================================================================

#[derive(Clone, Copy, Debug)]
enum Op {
    Generate,
    Start,
    Stop,
    Remove,
    Recover,
}

fn apply(node: &TestNode, op: Op, group_id: i64) -> StatusCode {
    let d = &node.dispatcher;
    let response = match op {
        Op::Generate => d.generate_group(group_id, &generate_request(&["aa", "bb"])),
        Op::Start => d.start_group(group_id),
        Op::Stop => d.stop_group(group_id),
        Op::Remove => d.remove_group(group_id),
        Op::Recover => d.recover_group(group_id),
    };
    response.code
}

/// Bring `group_id` into `state`.
fn drive(node: &TestNode, group_id: i64, state: GroupState) {
    let steps: &[Op] = match state {
        GroupState::NotFound => &[],
        GroupState::Stopped => &[Op::Generate],
        GroupState::Running => &[Op::Generate, Op::Start],
        GroupState::Deleted => &[Op::Generate, Op::Remove],
        GroupState::Stopping => unreachable!("transient"),
    };
    for op in steps {
        assert!(apply(node, *op, group_id).is_success());
    }
    assert_eq!(state_of(node, group_id), state);
}

#[test]
fn test_operation_state_table() {
    use GroupState::*;
    use StatusCode::*;

    let table: &[(Op, GroupState, StatusCode, GroupState)] = &[
        (Op::Generate, NotFound, Success, Stopped),
        (Op::Generate, Stopped, GroupAlreadyExists, Stopped),
        (Op::Generate, Running, GroupAlreadyExists, Running),
        (Op::Generate, Deleted, GroupAlreadyExists, Deleted),
        (Op::Start, NotFound, GroupNotFound, NotFound),
        (Op::Start, Stopped, Success, Running),
        (Op::Start, Running, GroupAlreadyRunning, Running),
        (Op::Start, Deleted, GroupAlreadyDeleted, Deleted),
        (Op::Stop, NotFound, GroupNotFound, NotFound),
        (Op::Stop, Stopped, GroupAlreadyStopped, Stopped),
        (Op::Stop, Running, Success, Stopped),
        (Op::Stop, Deleted, GroupAlreadyDeleted, Deleted),
        (Op::Remove, NotFound, GroupNotFound, NotFound),
        (Op::Remove, Stopped, Success, Deleted),
        (Op::Remove, Running, GroupAlreadyRunning, Running),
        (Op::Remove, Deleted, GroupAlreadyDeleted, Deleted),
        (Op::Recover, NotFound, GroupNotFound, NotFound),
        (Op::Recover, Stopped, GroupHasNotDeleted, Stopped),
        (Op::Recover, Running, GroupHasNotDeleted, Running),
        (Op::Recover, Deleted, Success, Stopped),
    ];

    let node = TestNode::in_memory();
    node.connect("bb");
    for (i, (op, from, code, to)) in table.iter().enumerate() {
        // A fresh group per row keeps rows independent.
        let group_id = 10 + i as i64;
        drive(&node, group_id, *from);
        assert_eq!(
            apply(&node, *op, group_id),
            *code,
            "{:?} on {:?}",
            op,
            from
        );
        assert_eq!(state_of(&node, group_id), *to, "{:?} on {:?}", op, from);
    }
}

#[test]
fn test_recover_restores_configuration() {
    let node = TestNode::in_memory();
    node.running_group(2);
    let sealers = node.dispatcher.sealer_list(GROUP).unwrap();
    let block_limit = node
        .dispatcher
        .system_config_by_key(GROUP, "tx_count_limit")
        .unwrap();

    assert!(node.dispatcher.stop_group(GROUP).code.is_success());
    assert!(node.dispatcher.remove_group(GROUP).code.is_success());
    assert!(node.dispatcher.recover_group(GROUP).code.is_success());
    assert!(node.dispatcher.start_group(GROUP).code.is_success());

    assert_eq!(node.dispatcher.sealer_list(GROUP).unwrap(), sealers);
    assert_eq!(
        node.dispatcher
            .system_config_by_key(GROUP, "tx_count_limit")
            .unwrap(),
        block_limit
    );
    assert_eq!(sealers, vec![node_id("aa"), node_id("bb")]);
}

// =============================================================================
// SCENARIO 5: PROOFS
// =============================================================================

#[test]
fn test_transaction_proof_in_block_ten() {
    let node = TestNode::in_memory();
    let ledger = node.running_group(2);
    ledger.advance_to(9);

    let hashes: Vec<_> = (0..5).map(|n| node.submit(GROUP, n)).collect();
    let block = ledger.seal_block();
    assert_eq!(block.header.number, 10);

    let answer = node
        .dispatcher
        .transaction_by_hash_with_proof(GROUP, hashes[3])
        .unwrap();
    assert_eq!(answer.transaction.transaction.hash, hashes[3]);
    assert_eq!(answer.transaction.block_number, 10);

    let proof = answer.tx_proof;
    assert_eq!(proof.block_number, 10);
    assert_eq!(proof.index, 3);
    assert_eq!(proof.root, block.header.transactions_root);
    let leaf = leaf_hash(proof.index, &hashes[3]);
    assert!(verify_merkle_proof(&leaf, &proof.path, &block.header.transactions_root));

    // Any altered sibling breaks the path.
    let mut tampered = proof.path.clone();
    tampered[0].hash = Hash::repeat_byte(0x42);
    assert!(!verify_merkle_proof(&leaf, &tampered, &block.header.transactions_root));

    let fetched = node.dispatcher.block_by_number(GROUP, 10, false).unwrap();
    assert_eq!(fetched.header.transactions_root, proof.root);
}

#[test]
fn test_receipt_proof_matches_receipts_root() {
    let node = TestNode::in_memory();
    let ledger = node.running_group(2);
    let hashes: Vec<_> = (0..3).map(|n| node.submit(GROUP, n)).collect();
    let block = ledger.seal_block();

    for hash in &hashes {
        let answer = node
            .dispatcher
            .transaction_receipt_by_hash_with_proof(GROUP, *hash)
            .unwrap();
        let receipt = &answer.transaction_receipt;
        assert_eq!(receipt.transaction_hash, *hash);
        let leaf = leaf_hash(receipt.transaction_index, &receipt.digest());
        assert!(verify_merkle_proof(
            &leaf,
            &answer.receipt_proof.path,
            &block.header.receipts_root
        ));
    }
}

// =============================================================================
// DISPATCH AGAINST NON-RUNNING GROUPS
// =============================================================================

#[test]
fn test_queries_follow_group_state() {
    let node = TestNode::in_memory();
    assert_eq!(
        node.dispatcher.block_number(GROUP).unwrap_err().code,
        codes::GROUP_ID_NOT_EXIST
    );

    let ledger = node.running_group(2);
    assert_eq!(node.dispatcher.block_number(GROUP).unwrap(), 0);

    node.dispatcher.stop_group(GROUP);
    let seen = ledger.query_count();
    for code in [
        node.dispatcher.block_number(GROUP).unwrap_err().code,
        node.dispatcher.sealer_list(GROUP).unwrap_err().code,
        node.dispatcher.pending_tx_size(GROUP).unwrap_err().code,
    ] {
        assert_eq!(code, codes::INCOMPLETE_INITIALIZATION);
    }
    assert_eq!(ledger.query_count(), seen);
    assert!(node.dispatcher.group_list().unwrap().is_empty());
}
