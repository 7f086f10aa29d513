// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Calldata encoding for the session manager's `request` entry point.
//!
//! Standard (non-packed) ABI encoding: every head slot is 32 bytes, dynamic
//! `bytes` arguments are referenced by offset and appended as
//! `length ‖ data ‖ zero padding` in argument order.

use alloy_primitives::{keccak256, Bytes};

use crate::domain::ledger::SessionRequestCall;

pub const REQUEST_SIGNATURE: &str = "request(bytes32,bytes32,bytes,bytes,uint48)";

const WORD: usize = 32;

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn encode_bytes_tail(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&uint_word(data.len() as u64));
    out.extend_from_slice(data);
    out.resize(out.len() + padded_len(data.len()) - data.len(), 0);
}

/// Encode `request(salt, sessionRequestHash, signedSessionRequest, signedSessionHash, sessionExpiry)`.
pub fn encode_request_call(call: &SessionRequestCall) -> Bytes {
    let owner_signature = call.owner_signature.as_bytes();
    let provider_signature = call.provider_signature.as_bytes();

    const HEAD_LEN: usize = 5 * WORD;
    let owner_offset = HEAD_LEN;
    let provider_offset = owner_offset + WORD + padded_len(owner_signature.len());

    let mut out = Vec::with_capacity(
        4 + provider_offset + WORD + padded_len(provider_signature.len()),
    );
    out.extend_from_slice(&selector(REQUEST_SIGNATURE));
    out.extend_from_slice(call.salt.as_bytes());
    out.extend_from_slice(call.session_request_hash.as_bytes());
    out.extend_from_slice(&uint_word(owner_offset as u64));
    out.extend_from_slice(&uint_word(provider_offset as u64));
    // uint48 widens to a full word, left-padded.
    out.extend_from_slice(&uint_word(call.expiry.as_secs()));
    encode_bytes_tail(&mut out, owner_signature);
    encode_bytes_tail(&mut out, provider_signature);

    Bytes::from(out)
}
