// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Session Manager Relay
//
// Anti-Corruption Layer for the on-chain session manager. Builds the
// `request(...)` call, wraps it in a legacy transaction signed by the
// provider, and broadcasts it through the community's JSON-RPC endpoint.
//
// Relays through one ledger are serialized from the nonce lookup to the
// broadcast, so concurrent handshakes never sign the same nonce.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ledger::{LedgerError, RelayStage, SessionLedger, SessionRequestCall};
use crate::domain::signature::SessionSigner;
use crate::infrastructure::eth::abi::encode_request_call;
use crate::infrastructure::eth::rpc::JsonRpcClient;
use crate::infrastructure::eth::transaction::{transaction_hash, LegacyTransaction};

pub struct JsonRpcSessionLedger {
    rpc: JsonRpcClient,
    chain_id: u64,
    gas_limit_multiplier: f64,
    /// Next nonce per sender after the last successful broadcast. Held across
    /// the whole relay.
    next_nonces: Mutex<HashMap<Address, u64>>,
}

impl JsonRpcSessionLedger {
    pub fn new(rpc: JsonRpcClient, chain_id: u64, gas_limit_multiplier: f64) -> Self {
        Self {
            rpc,
            chain_id,
            gas_limit_multiplier,
            next_nonces: Mutex::new(HashMap::new()),
        }
    }

    async fn relay(
        &self,
        signer: &dyn SessionSigner,
        call: &SessionRequestCall,
        local_nonce: Option<u64>,
    ) -> Result<(B256, u64), LedgerError> {
        let from = signer.address();
        let data = encode_request_call(call);

        let node_nonce = self
            .rpc
            .call_quantity(
                "eth_getTransactionCount",
                json!([from, "pending"]),
                RelayStage::Prepare,
            )
            .await?;
        let node_nonce: u64 = narrow(node_nonce, "nonce")?;
        // A node that has not indexed our previous broadcast yet reports a stale count.
        let nonce = local_nonce.map_or(node_nonce, |local| local.max(node_nonce));

        let gas_price = self
            .rpc
            .call_quantity("eth_gasPrice", json!([]), RelayStage::Prepare)
            .await?;
        let estimate = self
            .rpc
            .call_quantity(
                "eth_estimateGas",
                json!([{ "from": from, "to": call.session_manager, "data": data }]),
                RelayStage::Prepare,
            )
            .await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price: narrow(gas_price, "gas price")?,
            gas_limit: apply_gas_multiplier(
                narrow(estimate, "gas estimate")?,
                self.gas_limit_multiplier,
            ),
            to: call.session_manager,
            value: U256::ZERO,
            data,
            chain_id: self.chain_id,
        };
        debug!(
            nonce = tx.nonce,
            node_nonce,
            gas_price = tx.gas_price,
            gas_limit = tx.gas_limit,
            "Prepared session request transaction"
        );

        let signature = signer
            .sign_hash(tx.signing_hash())
            .map_err(|e| LedgerError::Signing(e.to_string()))?;
        let raw = tx.encode_signed(&signature);
        let local_hash = transaction_hash(&raw);

        let tx_hash: B256 = self
            .rpc
            .call("eth_sendRawTransaction", json!([raw]), RelayStage::Submit)
            .await?;

        if tx_hash != local_hash {
            warn!(
                "Node reported transaction hash {} but the signed payload hashes to {}",
                tx_hash, local_hash
            );
        }
        Ok((tx_hash, nonce))
    }
}

/// Scale a gas estimate by the configured safety margin.
pub fn apply_gas_multiplier(estimate: u64, multiplier: f64) -> u64 {
    (estimate as f64 * multiplier).ceil() as u64
}

fn narrow<T: TryFrom<U256>>(value: U256, what: &str) -> Result<T, LedgerError> {
    T::try_from(value).map_err(|_| LedgerError::InvalidResponse {
        stage: RelayStage::Prepare,
        message: format!("{what} {value} out of range"),
    })
}

#[async_trait]
impl SessionLedger for JsonRpcSessionLedger {
    async fn request_session(
        &self,
        signer: &dyn SessionSigner,
        call: &SessionRequestCall,
    ) -> Result<B256, LedgerError> {
        let from = signer.address();
        let mut next_nonces = self.next_nonces.lock().await;
        let local_nonce = next_nonces.get(&from).copied();

        match self.relay(signer, call, local_nonce).await {
            Ok((tx_hash, nonce)) => {
                next_nonces.insert(from, nonce.saturating_add(1));
                info!(
                    "Relayed session request {} to {} in tx {} (nonce {})",
                    call.session_request_hash, call.session_manager, tx_hash, nonce
                );
                Ok(tx_hash)
            }
            Err(e) => {
                // Resync from the node's pending count on the next relay.
                next_nonces.remove(&from);
                Err(e)
            }
        }
    }
}
