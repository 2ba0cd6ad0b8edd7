//! # QC-19 Group RPC
//!
//! Group-scoped JSON-RPC front end for a multi-group node.
//!
//! **Subsystem ID:** 19
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every ledger query names a group as its first parameter. This crate:
//! - Resolves the group and answers only for groups that are Running and
//!   that this node serves as sealer or observer
//! - Maps ledger failures to stable JSON-RPC error codes
//! - Forwards group management calls to QC-18 and reports their outcome as
//!   a `{code, message}` object
//! - Attaches Merkle inclusion proofs to transactions and receipts
//!
//! ## Request Flow
//!
//! ```text
//! HTTP POST ──> service (axum) ──spawn_blocking──> router ──> RpcDispatcher
//!                                                               │
//!                        ┌──────────────────────────────────────┤
//!                        v                                      v
//!              GroupLifecycleController                 GroupLedger (Running)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! qc-19-group-rpc/
//! ├── domain/        # RpcError codes, method registry, wire types, config
//! ├── ports/         # GroupRpcApi
//! ├── adapters/      # LedgerError -> RpcError
//! ├── dispatcher.rs  # GroupRpcApi over the registry and ledgers
//! ├── proof.rs       # Proof construction with a leaf-set cache
//! ├── router.rs      # Method name + params -> GroupRpcApi
//! ├── service.rs     # HTTP server
//! └── telemetry.rs   # Log subscriber
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod dispatcher;
pub mod domain;
pub mod ports;
pub mod proof;
pub mod router;
pub mod service;
pub mod telemetry;

// Re-exports
pub use dispatcher::{RpcDispatcher, CLIENT_NAME};
pub use domain::{
    codes, CallContext, ConfigError, GatewayError, GroupOpResponse, LoggingConfig, RpcConfig,
    RpcError, RpcResult,
};
pub use ports::GroupRpcApi;
pub use proof::ProofQueryService;
pub use router::route_method;
pub use service::GroupRpcService;
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
