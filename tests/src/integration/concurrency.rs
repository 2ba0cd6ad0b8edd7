//! # Concurrent Lifecycle and Query Tests
//!
//! Lifecycle calls on one group are serialized; calls on different groups
//! and queries against running groups proceed in parallel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use qc_18_group_manager::StatusCode;
use qc_19_group_rpc::{codes, GroupRpcApi};

use super::fixtures::{generate_request, TestNode};

#[test]
fn test_concurrent_generate_same_group() {
    let node = TestNode::in_memory();

    for group_id in 1..=40i64 {
        let barrier = Barrier::new(2);
        let codes: Vec<StatusCode> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        node.dispatcher
                            .generate_group(group_id, &generate_request(&["aa", "bb"]))
                            .code
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = codes.iter().filter(|c| c.is_success()).count();
        assert_eq!(successes, 1, "group {}: {:?}", group_id, codes);
        assert!(codes.contains(&StatusCode::GroupAlreadyExists));
    }
    assert_eq!(node.controller.registry().len(), 40);
}

#[test]
fn test_distinct_groups_start_in_parallel() {
    let node = TestNode::in_memory();
    node.connect("bb");
    let barrier = Barrier::new(8);

    thread::scope(|s| {
        for group_id in 1..=8i64 {
            let node = &node;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                let d = &node.dispatcher;
                assert!(d
                    .generate_group(group_id, &generate_request(&["aa", "bb"]))
                    .code
                    .is_success());
                assert!(d.start_group(group_id).code.is_success());
            });
        }
    });

    assert_eq!(
        node.dispatcher.group_list().unwrap(),
        (1..=8).collect::<Vec<u16>>()
    );
}

#[test]
fn test_queries_during_stop_never_see_partial_state() {
    let node = Arc::new(TestNode::in_memory());
    node.running_group(3);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let node = Arc::clone(&node);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut answered = 0usize;
                while !done.load(Ordering::Acquire) {
                    match node.dispatcher.block_number(3) {
                        Ok(_) => answered += 1,
                        Err(e) => assert_eq!(e.code, codes::INCOMPLETE_INITIALIZATION),
                    }
                }
                answered
            })
        })
        .collect();

    for _ in 0..20 {
        assert!(node.dispatcher.stop_group(3).code.is_success());
        assert!(node.dispatcher.start_group(3).code.is_success());
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }
    assert!(node.dispatcher.block_number(3).is_ok());
}

#[test]
fn test_submissions_on_separate_groups() {
    let node = TestNode::in_memory();
    node.running_group(4);
    assert!(node
        .dispatcher
        .generate_group(5, &generate_request(&["aa", "bb"]))
        .code
        .is_success());
    assert!(node.dispatcher.start_group(5).code.is_success());

    thread::scope(|s| {
        for group_id in [4i64, 5] {
            let node = &node;
            s.spawn(move || {
                for nonce in 0..25 {
                    node.submit(group_id, nonce);
                }
            });
        }
    });

    assert_eq!(node.dispatcher.pending_tx_size(4).unwrap(), 25);
    assert_eq!(node.dispatcher.pending_tx_size(5).unwrap(), 25);
}
