// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! EIP-155 legacy transactions.
//!
//! Legacy transactions are accepted by every EVM network a community may run
//! on, which keeps the relay independent of per-chain fee market support.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};

use crate::domain::signature::RecoverableSignature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

fn encode_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|field| field.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

impl LegacyTransaction {
    /// RLP of `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Vec<u8> {
        encode_list(&[
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &self.to,
            &self.value,
            &self.data,
            &self.chain_id,
            &0u8,
            &0u8,
        ])
    }

    pub fn signing_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// RLP of `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]` with
    /// `v = recovery_id + 35 + 2 * chainId`.
    pub fn encode_signed(&self, signature: &RecoverableSignature) -> Bytes {
        let v = u64::from(signature.recovery_id()) + 35 + 2 * self.chain_id;
        let r = U256::from_be_bytes(signature.r().0);
        let s = U256::from_be_bytes(signature.s().0);
        Bytes::from(encode_list(&[
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &self.to,
            &self.value,
            &self.data,
            &v,
            &r,
            &s,
        ]))
    }
}

/// Transaction hash of a raw signed transaction.
pub fn transaction_hash(raw: &[u8]) -> B256 {
    keccak256(raw)
}
