//! # Boot Recovery From Persisted Group Files
//!
//! A second node over the same directory rebuilds its registry from the
//! genesis, group config and status marker files the first one wrote.

use qc_18_group_manager::GroupState;
use qc_19_group_rpc::GroupRpcApi;
use tempfile::TempDir;

use super::fixtures::{generate_request, node_id, TestNode};

fn state_of(node: &TestNode, group_id: i64) -> GroupState {
    node.dispatcher
        .query_group_status(group_id)
        .status
        .unwrap_or(GroupState::NotFound)
}

/// Groups 2 (Running), 3 (Stopped) and 4 (Deleted) under `dir`.
fn populate(dir: &TempDir) -> TestNode {
    let node = TestNode::on_disk(dir.path());
    node.running_group(2);
    for id in [3i64, 4] {
        assert!(node
            .dispatcher
            .generate_group(id, &generate_request(&["aa", "cc"]))
            .code
            .is_success());
    }
    assert!(node.dispatcher.remove_group(4).code.is_success());
    node
}

#[test]
fn test_boot_restores_every_group() {
    let dir = TempDir::new().unwrap();
    drop(populate(&dir));

    let node = TestNode::on_disk(dir.path());
    node.connect("bb");
    let summary = node.controller.load_persisted_groups().unwrap();
    assert_eq!(summary.restored, vec![2, 3, 4]);
    assert_eq!(summary.started, vec![2]);
    assert!(summary.skipped.is_empty());

    assert_eq!(state_of(&node, 2), GroupState::Running);
    assert_eq!(state_of(&node, 3), GroupState::Stopped);
    assert_eq!(state_of(&node, 4), GroupState::Deleted);
    assert_eq!(
        node.dispatcher.sealer_list(2).unwrap(),
        vec![node_id("aa"), node_id("bb")]
    );
}

#[test]
fn test_boot_leaves_group_stopped_when_sealers_unreachable() {
    let dir = TempDir::new().unwrap();
    drop(populate(&dir));

    let node = TestNode::on_disk(dir.path());
    let summary = node.controller.load_persisted_groups().unwrap();
    assert!(summary.started.is_empty());
    assert_eq!(state_of(&node, 2), GroupState::Stopped);

    node.connect("bb");
    assert!(node.dispatcher.start_group(2).code.is_success());
}

#[test]
fn test_shutdown_keeps_running_marker() {
    let dir = TempDir::new().unwrap();
    let first = populate(&dir);
    first.controller.shutdown();
    assert!(first.dispatcher.group_list().unwrap().is_empty());
    drop(first);

    let node = TestNode::on_disk(dir.path());
    node.connect("bb");
    node.controller.load_persisted_groups().unwrap();
    assert_eq!(node.dispatcher.group_list().unwrap(), vec![2]);
}

#[test]
fn test_recover_after_reboot_uses_stored_configuration() {
    let dir = TempDir::new().unwrap();
    drop(populate(&dir));

    let node = TestNode::on_disk(dir.path());
    node.connect("cc");
    node.controller.load_persisted_groups().unwrap();

    assert!(node.dispatcher.recover_group(4).code.is_success());
    assert!(node.dispatcher.start_group(4).code.is_success());
    assert_eq!(
        node.dispatcher.sealer_list(4).unwrap(),
        vec![node_id("aa"), node_id("cc")]
    );

    // Files of a recovered group cannot be generated over.
    let response = node
        .dispatcher
        .generate_group(4, &generate_request(&["aa"]));
    assert_eq!(response.code, qc_18_group_manager::StatusCode::GroupAlreadyExists);
}
