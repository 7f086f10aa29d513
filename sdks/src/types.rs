// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire types of the session gateway HTTP API.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use session_gateway_core::domain::channel::{ChannelType, SessionSource};
use session_gateway_core::domain::session::{
    generate_session_request_hash, generate_session_salt, SessionExpiry, SessionRequestHash,
};
use session_gateway_core::domain::signature::{SessionSigner, SignatureError};

/// Body of `POST /api/session/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub provider: String,
    pub owner: String,
    pub source: String,
    #[serde(rename = "type")]
    pub channel: String,
    pub expiry: u64,
    pub signature: String,
}

impl SessionRequest {
    /// Sign a session request as `owner`.
    ///
    /// `source` must already be canonical for `channel`; the gateway does not
    /// rewrite it.
    pub fn sign(
        owner: &dyn SessionSigner,
        provider: Address,
        source: &SessionSource,
        channel: ChannelType,
        expiry: SessionExpiry,
    ) -> Result<Self, SignatureError> {
        let hash = request_hash(provider, owner.address(), source, channel, expiry);
        let signature = owner.sign_message(hash.as_bytes())?;
        Ok(Self {
            provider: provider.to_checksum(None),
            owner: owner.address().to_checksum(None),
            source: source.to_string(),
            channel: channel.to_string(),
            expiry: expiry.as_secs(),
            signature: signature.to_hex(),
        })
    }
}

/// Session-request hash the owner signs.
pub fn request_hash(
    provider: Address,
    owner: Address,
    source: &SessionSource,
    channel: ChannelType,
    expiry: SessionExpiry,
) -> SessionRequestHash {
    generate_session_request_hash(provider, owner, generate_session_salt(source, channel), expiry)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestAccepted {
    pub session_request_tx_hash: String,
    pub status: u16,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayErrorBody {
    pub error: String,
    pub status: u16,
    /// Present when the relay succeeded but challenge delivery did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_request_tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
}
