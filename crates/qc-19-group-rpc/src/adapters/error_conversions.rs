//! Error conversions from group-manager types.
//!
//! Ledger failures that reflect bad caller input keep their message; every
//! other failure is logged here and surfaced as a bare `Internal error`.

use tracing::{debug, error};

use qc_18_group_manager::{GroupId, LedgerError, Unservable};

use crate::domain::RpcError;

impl From<LedgerError> for RpcError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidTransaction(msg) => {
                debug!("[qc-19] rejected malformed transaction: {}", msg);
                RpcError::invalid_params(format!("invalid transaction: {}", msg))
            }
            LedgerError::Rejected(msg) => {
                debug!("[qc-19] transaction rejected by pool: {}", msg);
                RpcError::invalid_params(format!("transaction rejected: {}", msg))
            }
            LedgerError::CallFailed(msg) => RpcError::invalid_params(format!("call failed: {}", msg)),
            other => {
                error!("[qc-19] ledger failure: {}", other);
                RpcError::internal()
            }
        }
    }
}

/// Error for a group that cannot serve requests.
pub fn unservable_error(group_id: GroupId, reason: Unservable) -> RpcError {
    match reason {
        Unservable::NotFound => RpcError::group_not_exist(group_id),
        Unservable::NotRunning(state) => {
            debug!("[qc-19] group {} not servable in state {}", group_id, state);
            RpcError::incomplete_initialization(group_id)
        }
    }
}
