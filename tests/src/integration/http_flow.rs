//! # HTTP JSON-RPC Flow
//!
//! The lifecycle and proof walkthrough over the real router: JSON in,
//! JSON out, no direct dispatcher calls.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use qc_18_group_manager::algorithms::leaf_hash;
use qc_18_group_manager::domain::Hash;
use qc_18_group_manager::{verify_merkle_proof, TransactionProof};
use qc_19_group_rpc::{codes, GroupRpcApi, GroupRpcService, RpcConfig};

use super::fixtures::{raw_transfer, TestNode, NOW};

fn router(node: &TestNode) -> Router {
    let api: Arc<dyn GroupRpcApi> = node.dispatcher.clone();
    GroupRpcService::new(RpcConfig::default(), api)
        .unwrap()
        .router()
}

async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_group_walkthrough_over_http() {
    let node = TestNode::in_memory();
    let app = router(&node);
    let sealers = json!(["aa".repeat(64), "bb".repeat(64)]);

    let r = rpc(&app, "generateGroup", json!([2, {"timestamp": NOW.to_string(), "sealers": sealers}])).await;
    assert_eq!(r["result"]["code"], "0x0");

    let r = rpc(&app, "startGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x8");
    let r = rpc(&app, "queryGroupStatus", json!([2])).await;
    assert_eq!(r["result"]["status"], "STOPPED");

    node.connect("bb");
    let r = rpc(&app, "startGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x0");

    let r = rpc(&app, "getSealerList", json!([2])).await;
    assert_eq!(r["result"], sealers);

    let raw = format!("0x{}", hex::encode(raw_transfer(0)));
    let r = rpc(&app, "sendRawTransaction", json!([2, raw])).await;
    let tx_hash = r["result"].as_str().unwrap().to_string();
    let r = rpc(&app, "getPendingTxSize", json!([2])).await;
    assert_eq!(r["result"], "0x1");

    node.launcher.ledger(2).unwrap().seal_block();

    let r = rpc(&app, "getBlockNumber", json!([2])).await;
    assert_eq!(r["result"], "0x1");
    let r = rpc(&app, "getBlockByNumber", json!([2, "0x1"])).await;
    let root = r["result"]["transactionsRoot"].clone();
    assert_eq!(r["result"]["transactions"], json!([tx_hash]));

    let r = rpc(&app, "getTransactionByHashWithProof", json!([2, tx_hash])).await;
    assert_eq!(r["result"]["transaction"]["hash"], json!(tx_hash));
    let proof: TransactionProof = serde_json::from_value(r["result"]["txProof"].clone()).unwrap();
    let root: Hash = serde_json::from_value(root).unwrap();
    assert_eq!(proof.root, root);
    let leaf = leaf_hash(proof.index, &proof.transaction_hash);
    assert!(verify_merkle_proof(&leaf, &proof.path, &root));

    let r = rpc(&app, "stopGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x0");
    let r = rpc(&app, "getBlockNumber", json!([2])).await;
    assert_eq!(r["error"]["code"], codes::INCOMPLETE_INITIALIZATION);

    let r = rpc(&app, "removeGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x0");
    let r = rpc(&app, "recoverGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x0");
    let r = rpc(&app, "queryGroupStatus", json!([2])).await;
    assert_eq!(r["result"]["status"], "STOPPED");
}

#[tokio::test]
async fn test_group_errors_over_http() {
    let node = TestNode::in_memory();
    node.running_group(2);
    let app = router(&node);

    let r = rpc(&app, "getBlockNumber", json!([7])).await;
    assert_eq!(r["error"]["code"], codes::GROUP_ID_NOT_EXIST);

    let r = rpc(&app, "getBlockNumber", json!([70000])).await;
    assert_eq!(r["error"]["code"], codes::GROUP_ID_NOT_EXIST);

    let r = rpc(&app, "getSystemConfigByKey", json!([2, "not_a_key"])).await;
    assert_eq!(r["error"]["code"], codes::INVALID_SYSTEM_CONFIG);

    let r = rpc(&app, "getBlockByNumber", json!([2, "0x99"])).await;
    assert_eq!(r["error"]["code"], codes::BLOCK_NUMBER_NOT_EXIST);

    let r = rpc(&app, "call", json!([2, {"to": format!("0x{}", "22".repeat(20)), "data": "0x"}])).await;
    assert_eq!(r["error"]["code"], codes::CALL_FROM_MISSING);

    let r = rpc(&app, "getTransactionByHash", json!([2, format!("0x{}", "42".repeat(32))])).await;
    assert_eq!(r["result"], Value::Null);

    let r = rpc(&app, "startGroup", json!([2])).await;
    assert_eq!(r["result"]["code"], "0x3");
    assert!(r.get("error").is_none());
}
