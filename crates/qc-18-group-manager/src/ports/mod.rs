//! # Ports Layer
//!
//! Inbound API and outbound dependency traits.

pub mod inbound;
pub mod outbound;

pub use inbound::{GenerateGroupRequest, GroupLifecycleApi};
pub use outbound::{
    Clock, ConfigStore, FixedClock, GroupFile, GroupLedger, LedgerLauncher, LedgerResult, P2pService,
    ReceiptNotifier, StaticP2pService, SystemClock,
};
