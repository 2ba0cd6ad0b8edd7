//! # Group RPC development node
//!
//! Serves the group JSON-RPC API over in-memory ledgers backed by on-disk
//! group configuration. Useful for exercising group management and
//! queries without a full node.
//!
//! ## Environment
//!
//! - `QC_RPC_CONFIG` - TOML file for the RPC server (optional)
//! - `QC_NODE_ID` - this node's id, 128 hex chars
//! - `QC_GROUP_BASE` - directory holding `conf/` and `data/` (default `./group-node`)
//! - `QC_PEERS` - comma-separated `<node_id>@<ip:port>` treated as connected
//! - `QC_RPC_HOST`, `QC_RPC_PORT`, `QC_RPC_WORKERS`, `QC_GROUP_*` overrides

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use qc_18_group_manager::{
    FsConfigStore, GroupLifecycleController, GroupRegistry, InMemoryLedgerLauncher,
    LifecycleConfig, NodeId, StaticP2pService, SystemClock,
};
use qc_19_group_rpc::{init_tracing, GroupRpcService, RpcConfig, RpcDispatcher};

/// Node id used when `QC_NODE_ID` is unset.
const DEV_NODE_ID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef\
                           0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn load_rpc_config() -> Result<RpcConfig> {
    let mut config = match std::env::var("QC_RPC_CONFIG") {
        Ok(path) => RpcConfig::load(&path)?,
        Err(_) => RpcConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn load_node_id() -> Result<NodeId> {
    match std::env::var("QC_NODE_ID") {
        Ok(raw) => NodeId::parse(&raw).map_err(|e| anyhow!("QC_NODE_ID: {}", e)),
        Err(_) => {
            warn!("QC_NODE_ID not set, using development node id");
            NodeId::parse(DEV_NODE_ID).map_err(|e| anyhow!("dev node id: {}", e))
        }
    }
}

fn connect_peers(p2p: &StaticP2pService) -> Result<()> {
    let Ok(raw) = std::env::var("QC_PEERS") else {
        return Ok(());
    };
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, addr) = entry
            .split_once('@')
            .ok_or_else(|| anyhow!("QC_PEERS entry without '@': {}", entry))?;
        let node_id = NodeId::parse(id).map_err(|e| anyhow!("QC_PEERS {}: {}", id, e))?;
        p2p.connect(node_id, addr);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let rpc_config = load_rpc_config()?;
    init_tracing(&rpc_config.logging)?;

    let node_id = load_node_id()?;
    let base = std::env::var("QC_GROUP_BASE").unwrap_or_else(|_| "./group-node".to_string());
    let mut lifecycle = LifecycleConfig::new(node_id.clone(), &base);
    lifecycle.apply_env_overrides();
    lifecycle
        .validate()
        .map_err(|e| anyhow!("group config: {}", e))?;

    let p2p = Arc::new(StaticP2pService::new());
    connect_peers(&p2p)?;

    let store = Arc::new(FsConfigStore::new(
        lifecycle.conf_dir.clone(),
        lifecycle.data_dir.clone(),
    ));
    let controller = Arc::new(GroupLifecycleController::new(
        lifecycle,
        Arc::new(GroupRegistry::new()),
        store,
        Arc::new(InMemoryLedgerLauncher::new(node_id.clone())),
        p2p.clone(),
        Arc::new(SystemClock),
    ));

    let boot = Arc::clone(&controller);
    let summary = tokio::task::spawn_blocking(move || boot.load_persisted_groups())
        .await
        .context("boot task")??;
    info!(
        node_id = %node_id,
        restored = summary.restored.len(),
        started = summary.started.len(),
        "group node ready"
    );

    let dispatcher = RpcDispatcher::new(Arc::clone(&controller), p2p, &rpc_config);
    let service = GroupRpcService::new(rpc_config, Arc::new(dispatcher))?;
    service
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Initiating graceful shutdown...");
    tokio::task::spawn_blocking(move || controller.shutdown())
        .await
        .context("shutdown task")?;
    info!("Shutdown complete");
    Ok(())
}
