//! JSON-RPC method routing.
//!
//! Maps a method name and its positional params onto [`GroupRpcApi`] and
//! renders the result as JSON. Group-scoped methods take the group id as
//! params[0].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use qc_18_group_manager::domain::{Address, CallRequest, Hash};
use qc_18_group_manager::{GenerateGroupRequest, GroupError};

use crate::domain::{
    get_method_info, Bytes, CallContext, GroupOpResponse, MethodKind, MethodScope, Quantity,
    RpcError, RpcResult,
};
use crate::ports::GroupRpcApi;

/// Route one call to `api`.
///
/// Lifecycle methods never fail at this level; their errors are carried in
/// the returned `{code, message}` object.
pub fn route_method(
    api: &dyn GroupRpcApi,
    method: &str,
    params: Option<&Value>,
    ctx: &mut CallContext,
) -> RpcResult<Value> {
    let info = get_method_info(method).ok_or_else(|| RpcError::method_not_found(method))?;

    match (info.scope, info.kind) {
        (_, MethodKind::Lifecycle) => to_json(route_lifecycle(api, method, params)),
        (MethodScope::Node, _) => route_node(api, method),
        (MethodScope::Group, _) => {
            let group_id: i64 = parse_param(params, 0)?;
            route_group(api, method, group_id, params, ctx)
        }
    }
}

fn route_node(api: &dyn GroupRpcApi, method: &str) -> RpcResult<Value> {
    match method {
        "getClientVersion" => to_json(api.client_version()?),
        "getPeers" => to_json(api.peers()?),
        "getGroupList" => to_json(api.group_list()?),
        _ => Err(RpcError::method_not_found(method)),
    }
}

fn route_group(
    api: &dyn GroupRpcApi,
    method: &str,
    group_id: i64,
    params: Option<&Value>,
    ctx: &mut CallContext,
) -> RpcResult<Value> {
    match method {
        // System config / consensus
        "getSystemConfigByKey" => {
            let key: String = parse_param(params, 1)?;
            to_json(api.system_config_by_key(group_id, &key)?)
        }
        "getBlockNumber" => Ok(hex_quantity(api.block_number(group_id)?)),
        "getPbftView" => Ok(hex_quantity(api.pbft_view(group_id)?)),
        "getSealerList" => to_json(api.sealer_list(group_id)?),
        "getEpochSealersList" => to_json(api.epoch_sealers_list(group_id)?),
        "getObserverList" => to_json(api.observer_list(group_id)?),
        "getConsensusStatus" => api.consensus_status(group_id),

        // Sync / P2P
        "getSyncStatus" => to_json(api.sync_status(group_id)?),
        "getGroupPeers" => to_json(api.group_peers(group_id)?),
        "getNodeIDList" => to_json(api.node_id_list(group_id)?),

        // Blocks
        "getBlockByHash" => {
            let hash: Hash = parse_param(params, 1)?;
            let include: bool = parse_param_optional(params, 2).unwrap_or(false);
            to_json(api.block_by_hash(group_id, hash, include)?)
        }
        "getBlockByNumber" => {
            let number: Quantity = parse_param(params, 1)?;
            let include: bool = parse_param_optional(params, 2).unwrap_or(false);
            to_json(api.block_by_number(group_id, number.0, include)?)
        }
        "getBlockHashByNumber" => {
            let number: Quantity = parse_param(params, 1)?;
            to_json(api.block_hash_by_number(group_id, number.0)?)
        }

        // Transactions
        "getTransactionByHash" => {
            let hash: Hash = parse_param(params, 1)?;
            to_json(api.transaction_by_hash(group_id, hash)?)
        }
        "getTransactionByBlockHashAndIndex" => {
            let hash: Hash = parse_param(params, 1)?;
            let index: Quantity = parse_param(params, 2)?;
            to_json(api.transaction_by_block_hash_and_index(group_id, hash, index.0)?)
        }
        "getTransactionByBlockNumberAndIndex" => {
            let number: Quantity = parse_param(params, 1)?;
            let index: Quantity = parse_param(params, 2)?;
            to_json(api.transaction_by_block_number_and_index(group_id, number.0, index.0)?)
        }
        "getTransactionReceipt" => {
            let hash: Hash = parse_param(params, 1)?;
            to_json(api.transaction_receipt(group_id, hash)?)
        }
        "getPendingTransactions" => to_json(api.pending_transactions(group_id)?),
        "getPendingTxSize" => Ok(hex_quantity(api.pending_tx_size(group_id)?)),
        "getCode" => {
            let address: Address = parse_param(params, 1)?;
            Ok(Value::String(format!(
                "0x{}",
                hex::encode(api.code(group_id, address)?)
            )))
        }
        "getTotalTransactionCount" => to_json(api.total_transaction_count(group_id)?),
        "call" => {
            let request: CallRequest = parse_param(params, 1)?;
            to_json(api.call(group_id, request)?)
        }
        "sendRawTransaction" => {
            let raw: Bytes = parse_param(params, 1)?;
            to_json(api.send_raw_transaction(group_id, &raw.0, ctx)?)
        }

        // Proofs
        "getTransactionByHashWithProof" => {
            let hash: Hash = parse_param(params, 1)?;
            to_json(api.transaction_by_hash_with_proof(group_id, hash)?)
        }
        "getTransactionReceiptByHashWithProof" => {
            let hash: Hash = parse_param(params, 1)?;
            to_json(api.transaction_receipt_by_hash_with_proof(group_id, hash)?)
        }

        _ => Err(RpcError::method_not_found(method)),
    }
}

fn route_lifecycle(api: &dyn GroupRpcApi, method: &str, params: Option<&Value>) -> GroupOpResponse {
    let group_id: i64 = match parse_param(params, 0) {
        Ok(id) => id,
        Err(e) => return invalid_params(e.message),
    };

    match method {
        "generateGroup" => match parse_generate_request(params) {
            Ok(request) => api.generate_group(group_id, &request),
            Err(e) => invalid_params(e.message),
        },
        "startGroup" => api.start_group(group_id),
        "stopGroup" => api.stop_group(group_id),
        "removeGroup" => api.remove_group(group_id),
        "recoverGroup" => api.recover_group(group_id),
        "queryGroupStatus" => api.query_group_status(group_id),
        _ => invalid_params(format!("not a group management method: {}", method)),
    }
}

fn invalid_params(message: String) -> GroupOpResponse {
    GroupOpResponse::from(&GroupError::InvalidParams(message))
}

/// `generateGroup` accepts `[id, {timestamp, sealers}]` and the positional
/// form `[id, timestamp, [sealers]]`.
fn parse_generate_request(params: Option<&Value>) -> RpcResult<GenerateGroupRequest> {
    match param_at(params, 1) {
        Some(Value::Object(_)) => parse_param(params, 1),
        Some(_) => {
            let timestamp = match parse_param::<Value>(params, 1)? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => {
                    return Err(RpcError::invalid_params(
                        "timestamp must be a string or number",
                    ))
                }
            };
            let sealers: Vec<String> = parse_param(params, 2)?;
            Ok(GenerateGroupRequest::new(timestamp, sealers))
        }
        None => Err(RpcError::invalid_params("Missing parameter at index 1")),
    }
}

fn to_json<T: Serialize>(value: T) -> RpcResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        error!("[qc-19] failed to encode result: {}", e);
        RpcError::internal()
    })
}

fn hex_quantity(value: u64) -> Value {
    Value::String(format!("{:#x}", value))
}

fn param_at(params: Option<&Value>, index: usize) -> Option<&Value> {
    params.and_then(|p| {
        if p.is_array() {
            p.get(index)
        } else if index == 0 {
            Some(p)
        } else {
            None
        }
    })
}

/// Parse a required parameter from JSON-RPC params array.
fn parse_param<T: DeserializeOwned>(params: Option<&Value>, index: usize) -> RpcResult<T> {
    let param = param_at(params, index).ok_or_else(|| {
        RpcError::invalid_params(format!("Missing parameter at index {}", index))
    })?;

    serde_json::from_value(param.clone()).map_err(|e| {
        RpcError::invalid_params(format!("Invalid parameter at index {}: {}", index, e))
    })
}

/// Parse an optional parameter from JSON-RPC params array.
fn parse_param_optional<T: DeserializeOwned>(params: Option<&Value>, index: usize) -> Option<T> {
    param_at(params, index).and_then(|v| serde_json::from_value(v.clone()).ok())
}
