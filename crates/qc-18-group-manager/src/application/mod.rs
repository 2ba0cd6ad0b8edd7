//! # Application Layer
//!
//! The group registry and the lifecycle controller that drives it.

pub mod controller;
pub mod registry;

pub use controller::{BootSummary, GroupLifecycleController};
pub use registry::{GroupEntry, GroupRegistry, SlotWriter, Unservable};
