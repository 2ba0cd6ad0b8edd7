//! # Adapters Layer
//!
//! Implementations of the outbound ports: durable group files on disk, and
//! in-memory stand-ins for the ledger and configuration store used by tests
//! and the development node.

mod fs_config_store;
mod memory_ledger;
mod memory_store;

pub use fs_config_store::FsConfigStore;
pub use memory_ledger::{InMemoryLedger, InMemoryLedgerLauncher, RawTransaction, TX_GAS};
pub use memory_store::InMemoryConfigStore;
