//! # Domain Module
//!
//! Core domain types for the Group Manager subsystem.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ledger;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use ledger::{
    keccak, Address, Block, BlockHeader, BlockNumber, CallOutput, CallRequest, Hash, PeerInfo,
    SyncStatus, TotalTransactionCount, Transaction, TransactionLocation, TransactionReceipt, U256,
};
pub use value_objects::*;
