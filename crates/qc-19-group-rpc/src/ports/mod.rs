//! # Ports Layer
//!
//! The RPC surface implemented by the dispatcher.

pub mod inbound;

pub use inbound::GroupRpcApi;
