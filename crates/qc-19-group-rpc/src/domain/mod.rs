//! Domain types for the group RPC layer.
//!
//! Errors, the method registry, wire types, the per-request callback
//! context and configuration.

pub mod callback;
pub mod config;
pub mod error;
pub mod methods;
pub mod types;

// Re-exports for convenience
pub use callback::{receipt_payload, CallContext, ReceiptCallback};
pub use config::{ConfigError, HttpConfig, LimitsConfig, LoggingConfig, RpcConfig};
pub use error::{codes, GatewayError, RpcError, RpcResult};
pub use methods::{
    get_method_info, get_methods_by_kind, is_method_supported, MethodInfo, MethodKind,
    MethodScope, METHOD_REGISTRY,
};
pub use types::*;
