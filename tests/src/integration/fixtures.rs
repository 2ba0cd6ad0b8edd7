//! Shared wiring for integration tests.

use std::path::Path;
use std::sync::Arc;

use qc_18_group_manager::domain::{Address, Hash, U256};
use qc_18_group_manager::ports::FixedClock;
use qc_18_group_manager::{
    ConfigStore, FsConfigStore, GenerateGroupRequest, GroupLifecycleController, GroupRegistry,
    InMemoryConfigStore, InMemoryLedger, InMemoryLedgerLauncher, LifecycleConfig, NodeId,
    RawTransaction, StaticP2pService,
};
use qc_19_group_rpc::{CallContext, GroupRpcApi, RpcConfig, RpcDispatcher};

/// Clock reading of every test node.
pub const NOW: u64 = 1_600_000_000;

/// Node id made of `prefix` repeated to 64 bytes.
pub fn node_id(prefix: &str) -> NodeId {
    NodeId::parse(&prefix.repeat(64)).expect("valid node id")
}

/// generateGroup request at [`NOW`] for the given sealer prefixes.
pub fn generate_request(sealers: &[&str]) -> GenerateGroupRequest {
    GenerateGroupRequest::new(
        NOW.to_string(),
        sealers.iter().map(|s| s.repeat(64)).collect(),
    )
}

/// Encoded transfer from a fixed sender.
pub fn raw_transfer(nonce: u64) -> Vec<u8> {
    RawTransaction {
        from: Address::repeat_byte(1),
        to: Some(Address::repeat_byte(2)),
        nonce: U256::from(nonce),
        input: Vec::new(),
        block_limit: 1_000,
    }
    .encode()
}

/// One node: local id `aa`, in-memory ledgers.
pub struct TestNode {
    pub launcher: Arc<InMemoryLedgerLauncher>,
    pub p2p: Arc<StaticP2pService>,
    pub controller: Arc<GroupLifecycleController>,
    pub dispatcher: Arc<RpcDispatcher>,
}

impl TestNode {
    /// Node whose group files live in memory.
    pub fn in_memory() -> Self {
        Self::build(
            LifecycleConfig::for_testing(node_id("aa"), "/unused"),
            Arc::new(InMemoryConfigStore::new()),
        )
    }

    /// Node whose group files live under `base`.
    pub fn on_disk(base: &Path) -> Self {
        let config = LifecycleConfig::for_testing(node_id("aa"), base);
        let store = Arc::new(FsConfigStore::new(
            config.conf_dir.clone(),
            config.data_dir.clone(),
        ));
        Self::build(config, store)
    }

    fn build(config: LifecycleConfig, store: Arc<dyn ConfigStore>) -> Self {
        let launcher = Arc::new(InMemoryLedgerLauncher::new(node_id("aa")));
        let p2p = Arc::new(StaticP2pService::new());
        let controller = Arc::new(GroupLifecycleController::new(
            config,
            Arc::new(GroupRegistry::new()),
            store,
            launcher.clone(),
            p2p.clone(),
            Arc::new(FixedClock::new(NOW)),
        ));
        let dispatcher = Arc::new(RpcDispatcher::new(
            Arc::clone(&controller),
            p2p.clone(),
            &RpcConfig::default(),
        ));
        Self {
            launcher,
            p2p,
            controller,
            dispatcher,
        }
    }

    /// Mark peer `prefix` connected.
    pub fn connect(&self, prefix: &str) {
        self.p2p.connect(node_id(prefix), "10.0.0.2:30300");
    }

    /// Generate and start `group_id` with sealers `aa` and `bb`.
    pub fn running_group(&self, group_id: u16) -> Arc<InMemoryLedger> {
        self.connect("bb");
        let id = i64::from(group_id);
        assert!(self
            .dispatcher
            .generate_group(id, &generate_request(&["aa", "bb"]))
            .code
            .is_success());
        assert!(self.dispatcher.start_group(id).code.is_success());
        self.launcher.ledger(group_id).expect("ledger launched")
    }

    /// Submit a transfer to `group_id` and return its hash.
    pub fn submit(&self, group_id: i64, nonce: u64) -> Hash {
        self.dispatcher
            .send_raw_transaction(group_id, &raw_transfer(nonce), &mut CallContext::new())
            .expect("transaction accepted")
    }
}
