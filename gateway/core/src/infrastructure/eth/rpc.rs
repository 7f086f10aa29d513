// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Ethereum JSON-RPC Client
//
// Minimal JSON-RPC 2.0 transport over HTTP for the handful of methods the
// relay needs. Every call is tagged with the relay stage it belongs to so
// failures map directly onto `LedgerError`.

use crate::domain::ledger::{LedgerError, RelayStage};
use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

pub struct JsonRpcClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke `method` and deserialize its `result`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        stage: RelayStage,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        trace!(method, id, "JSON-RPC call");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport {
                stage,
                message: format!("{method}: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::InvalidResponse {
                stage,
                message: format!("{method}: HTTP {status}: {body}"),
            });
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse {
                stage,
                message: format!("{method}: malformed response: {e}"),
            }
        })?;

        if let Some(error) = body.error {
            return Err(LedgerError::Rejected {
                stage,
                code: error.code,
                message: error.message,
            });
        }

        let result = body.result.ok_or_else(|| LedgerError::InvalidResponse {
            stage,
            message: format!("{method}: response has neither result nor error"),
        })?;

        serde_json::from_value(result).map_err(|e| LedgerError::InvalidResponse {
            stage,
            message: format!("{method}: unexpected result: {e}"),
        })
    }

    /// Invoke a method whose result is a hex quantity (`"0x1a"`).
    pub async fn call_quantity(
        &self,
        method: &str,
        params: Value,
        stage: RelayStage,
    ) -> Result<U256, LedgerError> {
        let raw: String = self.call(method, params, stage).await?;
        parse_quantity(&raw).ok_or_else(|| LedgerError::InvalidResponse {
            stage,
            message: format!("{method}: '{raw}' is not a hex quantity"),
        })
    }
}

/// Parse a JSON-RPC quantity: `0x`-prefixed hex, no leading zeros required.
pub fn parse_quantity(raw: &str) -> Option<U256> {
    let digits = raw.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(digits, 16).ok()
}

/// Encode an integer as a JSON-RPC quantity.
pub fn format_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x0"), Some(U256::ZERO));
        assert_eq!(parse_quantity("0x3b9aca00"), Some(U256::from(1_000_000_000u64)));
        assert_eq!(parse_quantity("0x"), None);
        assert_eq!(parse_quantity("12"), None);
        assert_eq!(parse_quantity("0xzz"), None);
        assert_eq!(format_quantity(120_000), "0x1d4c0");
        assert_eq!(format_quantity(0), "0x0");
    }

    #[tokio::test]
    async fn test_call_returns_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "eth_gasPrice",
                "params": []
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x3b9aca00"}"#)
            .create_async()
            .await;

        let rpc = JsonRpcClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let price = rpc
            .call_quantity("eth_gasPrice", json!([]), RelayStage::Prepare)
            .await
            .unwrap();

        assert_eq!(price, U256::from(1_000_000_000u64));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_node_error_maps_to_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#,
            )
            .create_async()
            .await;

        let rpc = JsonRpcClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = rpc
            .call::<String>("eth_sendRawTransaction", json!(["0x00"]), RelayStage::Submit)
            .await
            .unwrap_err();

        match err {
            LedgerError::Rejected {
                stage,
                code,
                message,
            } => {
                assert_eq!(stage, RelayStage::Submit);
                assert_eq!(code, -32000);
                assert_eq!(message, "nonce too low");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_failure_maps_to_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let rpc = JsonRpcClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = rpc
            .call::<String>("eth_chainId", json!([]), RelayStage::Prepare)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InvalidResponse {
                stage: RelayStage::Prepare,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let rpc = JsonRpcClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = rpc
            .call::<String>("eth_chainId", json!([]), RelayStage::Prepare)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Transport { .. }));
        assert!(!err.may_have_been_submitted());
    }
}
