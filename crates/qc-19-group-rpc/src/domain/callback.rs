//! Per-request receipt callback.
//!
//! A [`CallContext`] is created for every JSON-RPC request and handed down
//! the call chain. `sendRawTransaction` consumes the installed callback and
//! passes it to the ledger as a one-shot receipt notifier. Whatever is left
//! unconsumed is released when the context is dropped, including on unwind,
//! so nothing outlives the request that installed it.

use std::fmt;

use qc_18_group_manager::domain::TransactionReceipt;
use qc_18_group_manager::ports::ReceiptNotifier;
use qc_18_group_manager::GroupId;

/// Receives `(receipt_json, group_id)` once the transaction is committed.
pub type ReceiptCallback = Box<dyn FnOnce(String, GroupId) + Send + 'static>;

/// Request-scoped callback registration.
#[derive(Default)]
pub struct CallContext {
    callback: Option<ReceiptCallback>,
    version: u32,
}

impl CallContext {
    /// Context without a callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a receipt callback and the protocol version it expects.
    pub fn with_callback<F>(callback: F, version: u32) -> Self
    where
        F: FnOnce(String, GroupId) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            version,
        }
    }

    /// Protocol version of the installed callback.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Is a callback still installed?
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Remove the callback, leaving the context empty.
    pub fn take_callback(&mut self) -> Option<ReceiptCallback> {
        self.callback.take()
    }

    /// Consume the callback as a ledger receipt notifier for `group_id`.
    pub fn take_notifier(&mut self, group_id: GroupId) -> Option<ReceiptNotifier> {
        let version = self.version;
        self.take_callback().map(|callback| {
            let notifier: ReceiptNotifier = Box::new(move |receipt: TransactionReceipt| {
                callback(receipt_payload(version, group_id, &receipt), group_id)
            });
            notifier
        })
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("has_callback", &self.has_callback())
            .field("version", &self.version)
            .finish()
    }
}

/// JSON document handed to receipt callbacks.
pub fn receipt_payload(version: u32, group_id: GroupId, receipt: &TransactionReceipt) -> String {
    serde_json::json!({
        "version": version,
        "groupId": group_id,
        "receipt": receipt,
    })
    .to_string()
}
