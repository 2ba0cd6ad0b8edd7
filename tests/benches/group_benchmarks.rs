//! # Group Node Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | qc-18 merkle | Proof construction over one block's leaves |
//! | qc-19 proofs | Proof query, cold and with a cached leaf set |
//! | qc-19 dispatch | JSON-RPC routing of a group-scoped query |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use qc_18_group_manager::domain::{Address, Hash, U256};
use qc_18_group_manager::ports::FixedClock;
use qc_18_group_manager::{
    build_merkle_proof, compute_merkle_root, GenerateGroupRequest, GroupLifecycleController,
    GroupRegistry, InMemoryConfigStore, InMemoryLedgerLauncher, LifecycleConfig, NodeId,
    RawTransaction, StaticP2pService,
};
use qc_19_group_rpc::{route_method, CallContext, GroupRpcApi, ProofQueryService, RpcConfig, RpcDispatcher};

const NOW: u64 = 1_600_000_000;

fn node_id(prefix: &str) -> NodeId {
    NodeId::parse(&prefix.repeat(64)).unwrap()
}

/// Node with group 1 Running and one sealed block of `txs` transactions.
fn running_node(txs: u64) -> (Arc<RpcDispatcher>, Arc<InMemoryLedgerLauncher>, Vec<Hash>) {
    let launcher = Arc::new(InMemoryLedgerLauncher::new(node_id("aa")));
    let p2p = Arc::new(StaticP2pService::new());
    let controller = Arc::new(GroupLifecycleController::new(
        LifecycleConfig::for_testing(node_id("aa"), "/unused"),
        Arc::new(GroupRegistry::new()),
        Arc::new(InMemoryConfigStore::new()),
        launcher.clone(),
        p2p.clone(),
        Arc::new(FixedClock::new(NOW)),
    ));
    let dispatcher = Arc::new(RpcDispatcher::new(controller, p2p, &RpcConfig::default()));

    let request = GenerateGroupRequest::new(NOW.to_string(), vec!["aa".repeat(64)]);
    assert!(dispatcher.generate_group(1, &request).code.is_success());
    assert!(dispatcher.start_group(1).code.is_success());

    let hashes = (0..txs)
        .map(|nonce| {
            let raw = RawTransaction {
                from: Address::repeat_byte(1),
                to: Some(Address::repeat_byte(2)),
                nonce: U256::from(nonce),
                input: Vec::new(),
                block_limit: 1_000,
            }
            .encode();
            dispatcher
                .send_raw_transaction(1, &raw, &mut CallContext::new())
                .unwrap()
        })
        .collect();
    launcher.ledger(1).unwrap().seal_block();
    (dispatcher, launcher, hashes)
}

// ============================================================================
// QC-18: Merkle proof construction
// ============================================================================

fn bench_merkle_proofs(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-merkle");

    for size in [16usize, 256, 4096] {
        let leaves: Vec<Hash> = (0..size as u64).map(Hash::from_low_u64_be).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("root", size), &leaves, |b, leaves| {
            b.iter(|| black_box(compute_merkle_root(leaves)))
        });
        group.bench_with_input(BenchmarkId::new("proof", size), &leaves, |b, leaves| {
            b.iter(|| black_box(build_merkle_proof(leaves, leaves.len() / 2)))
        });
    }

    group.finish();
}

// ============================================================================
// QC-19: Proof queries
// ============================================================================

fn bench_proof_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-proofs");
    group.measurement_time(Duration::from_secs(5));

    let (_, launcher, hashes) = running_node(500);
    let ledger = launcher.ledger(1).unwrap();
    let target = hashes[250];

    group.bench_function("transaction_proof_cold", |b| {
        b.iter(|| {
            let proofs = ProofQueryService::new(1);
            black_box(proofs.transaction_proof(1, ledger.as_ref(), target).unwrap())
        })
    });

    let proofs = ProofQueryService::default();
    group.bench_function("transaction_proof_cached", |b| {
        b.iter(|| black_box(proofs.transaction_proof(1, ledger.as_ref(), target).unwrap()))
    });

    group.finish();
}

// ============================================================================
// QC-19: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-dispatch");

    let (dispatcher, _, hashes) = running_node(10);
    let block_number = json!([1]);
    let by_hash = json!([1, hashes[3]]);

    group.bench_function("getBlockNumber", |b| {
        b.iter(|| {
            let mut ctx = CallContext::new();
            black_box(
                route_method(dispatcher.as_ref(), "getBlockNumber", Some(&block_number), &mut ctx)
                    .unwrap(),
            )
        })
    });
    group.bench_function("getTransactionByHash", |b| {
        b.iter(|| {
            let mut ctx = CallContext::new();
            black_box(
                route_method(dispatcher.as_ref(), "getTransactionByHash", Some(&by_hash), &mut ctx)
                    .unwrap(),
            )
        })
    });
    group.bench_function("unknown_group", |b| {
        let params = json!([99]);
        b.iter(|| {
            let mut ctx = CallContext::new();
            black_box(route_method(dispatcher.as_ref(), "getBlockNumber", Some(&params), &mut ctx).is_err())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_merkle_proofs, bench_proof_queries, bench_dispatch);
criterion_main!(benches);
