// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Request Use Case
//!
//! Application service that runs the provider's half of the session-request
//! handshake for one community.
//!
//! ## Flow
//!
//! ```text
//! Client
//!   │  SessionRequestInput { provider, owner, source, type, expiry, signature }
//!   ▼
//! StandardSessionRequestService.request_session()
//!   1. Provider signer present?                           → 500
//!   2. Parse wire fields, provider must be ours           → 400
//!   3. verify_session_request()                           → 400
//!   4. Channel deliverable?                               → 400
//!   5. Expiry in the future?                              → 400
//!   6. SessionRequestStore.record_attempt(salt)           → 429
//!   7. challenge, session hash, provider countersignature
//!   8. SessionLedger.request_session()                    → 502
//!   9. ChallengeDelivery.deliver()                        → 502 (carries tx hash)
//!   ──────────────────────────────────────────────────────────────────────
//!   SessionRequestReceipt { tx_hash }
//! ```
//!
//! The challenge leaves this service only through the delivery gateway. It is
//! never returned to the caller and never logged.
//!
//! Relay and delivery are not atomic. A delivery failure after a successful
//! relay is reported as [`SessionRequestError::Delivery`] together with the
//! transaction hash; nothing is rolled back on-chain.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::address::parse_address;
use crate::domain::channel::{ChannelError, ChannelType, SessionSource};
use crate::domain::delivery::{ChallengeDelivery, DeliveryError};
use crate::domain::ledger::{LedgerError, SessionLedger, SessionRequestCall};
use crate::domain::request_store::SessionRequestStore;
use crate::domain::session::{
    generate_session_challenge, generate_session_hash, generate_session_request_hash,
    generate_session_salt, verify_session_request, SessionExpiry,
};
use crate::domain::signature::{
    RecoverableSignature, SessionSigner, SignatureError, SignatureRecovery,
};

/// Raw session request as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequestInput {
    pub provider: String,
    pub owner: String,
    pub source: String,
    pub channel: String,
    pub expiry: u64,
    /// Owner's 65-byte personal signature, hex encoded.
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRequestReceipt {
    pub tx_hash: B256,
}

#[derive(Debug, Error)]
pub enum SessionRequestError {
    #[error("session provider signer is not configured")]
    SignerNotConfigured,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported session type: {0}")]
    UnsupportedChannel(String),

    #[error("request is addressed to provider {requested}, this gateway is {configured}")]
    ProviderMismatch {
        requested: Address,
        configured: Address,
    },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("session request expired")]
    Expired,

    #[error("too many session requests for this source")]
    RateLimited,

    #[error("request store unavailable: {0}")]
    Store(String),

    #[error("failed to countersign session: {0}")]
    Signing(#[source] SignatureError),

    #[error("session request relay failed: {0}")]
    Relay(#[source] LedgerError),

    #[error("challenge delivery failed after relay in {tx_hash}: {source}")]
    Delivery { tx_hash: B256, source: DeliveryError },
}

impl SessionRequestError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignerNotConfigured => "signer_not_configured",
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnsupportedChannel(_) => "unsupported_channel",
            Self::ProviderMismatch { .. } => "provider_mismatch",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::RateLimited => "rate_limited",
            Self::Store(_) => "store_error",
            Self::Signing(_) => "signing_error",
            Self::Relay(_) => "relay_error",
            Self::Delivery { .. } => "delivery_error",
        }
    }
}

#[async_trait]
pub trait SessionRequestService: Send + Sync {
    async fn request_session(
        &self,
        input: SessionRequestInput,
    ) -> Result<SessionRequestReceipt, SessionRequestError>;
}

/// Community-specific settings of the handshake.
#[derive(Debug, Clone)]
pub struct SessionRequestSettings {
    pub session_provider: Address,
    pub session_manager: Address,
    pub max_requests_per_salt: u32,
}

pub struct StandardSessionRequestService {
    settings: SessionRequestSettings,
    signer: Option<Arc<dyn SessionSigner>>,
    recovery: Arc<dyn SignatureRecovery>,
    ledger: Arc<dyn SessionLedger>,
    delivery: Arc<dyn ChallengeDelivery>,
    request_store: Arc<dyn SessionRequestStore>,
}

impl StandardSessionRequestService {
    pub fn new(
        settings: SessionRequestSettings,
        signer: Option<Arc<dyn SessionSigner>>,
        recovery: Arc<dyn SignatureRecovery>,
        ledger: Arc<dyn SessionLedger>,
        delivery: Arc<dyn ChallengeDelivery>,
        request_store: Arc<dyn SessionRequestStore>,
    ) -> Self {
        Self {
            settings,
            signer,
            recovery,
            ledger,
            delivery,
            request_store,
        }
    }
}

struct ParsedRequest {
    owner: Address,
    channel: ChannelType,
    source: SessionSource,
    expiry: SessionExpiry,
    signature: Vec<u8>,
}

fn parse_input(
    input: &SessionRequestInput,
    configured_provider: Address,
) -> Result<ParsedRequest, SessionRequestError> {
    let provider = parse_address(&input.provider)
        .map_err(|e| SessionRequestError::InvalidRequest(format!("provider: {e}")))?;
    if provider != configured_provider {
        return Err(SessionRequestError::ProviderMismatch {
            requested: provider,
            configured: configured_provider,
        });
    }

    let owner = parse_address(&input.owner)
        .map_err(|e| SessionRequestError::InvalidRequest(format!("owner: {e}")))?;

    let channel = ChannelType::from_str(&input.channel).map_err(|e| match e {
        ChannelError::UnsupportedType(raw) => SessionRequestError::UnsupportedChannel(raw),
        other => SessionRequestError::InvalidRequest(other.to_string()),
    })?;

    let source = SessionSource::new(input.source.as_str(), channel)
        .map_err(|e| SessionRequestError::InvalidRequest(e.to_string()))?;

    let expiry = SessionExpiry::new(input.expiry)
        .map_err(|e| SessionRequestError::InvalidRequest(e.to_string()))?;

    let digits = input
        .signature
        .strip_prefix("0x")
        .unwrap_or(&input.signature);
    let signature = hex::decode(digits).map_err(|_| SessionRequestError::InvalidSignature)?;

    Ok(ParsedRequest {
        owner,
        channel,
        source,
        expiry,
        signature,
    })
}

#[async_trait]
impl SessionRequestService for StandardSessionRequestService {
    async fn request_session(
        &self,
        input: SessionRequestInput,
    ) -> Result<SessionRequestReceipt, SessionRequestError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(SessionRequestError::SignerNotConfigured)?;

        let provider = self.settings.session_provider;
        let request = parse_input(&input, provider)?;

        if !verify_session_request(
            self.recovery.as_ref(),
            provider,
            request.owner,
            &request.source,
            request.channel,
            request.expiry,
            &request.signature,
        ) {
            return Err(SessionRequestError::InvalidSignature);
        }
        let owner_signature = RecoverableSignature::try_from(request.signature.as_slice())
            .map_err(|_| SessionRequestError::InvalidSignature)?;

        if !self.delivery.supports(request.channel) {
            return Err(SessionRequestError::UnsupportedChannel(
                request.channel.to_string(),
            ));
        }

        let now = Utc::now();
        if request.expiry.is_elapsed(now.timestamp()) {
            return Err(SessionRequestError::Expired);
        }

        let salt = generate_session_salt(&request.source, request.channel);
        let attempts = self
            .request_store
            .record_attempt(salt, now)
            .await
            .map_err(|e| SessionRequestError::Store(e.to_string()))?;
        if attempts > self.settings.max_requests_per_salt {
            warn!(%salt, attempts, "Session request limit reached");
            return Err(SessionRequestError::RateLimited);
        }

        let challenge = generate_session_challenge();
        let session_request_hash =
            generate_session_request_hash(provider, request.owner, salt, request.expiry);
        let session_hash = generate_session_hash(session_request_hash, challenge);
        let provider_signature = signer
            .sign_message(session_hash.as_bytes())
            .map_err(SessionRequestError::Signing)?;

        let call = SessionRequestCall {
            session_manager: self.settings.session_manager,
            salt,
            session_request_hash,
            owner_signature,
            provider_signature,
            expiry: request.expiry,
        };

        let tx_hash = self
            .ledger
            .request_session(signer.as_ref(), &call)
            .await
            .map_err(SessionRequestError::Relay)?;

        if let Err(source) = self
            .delivery
            .deliver(request.channel, &request.source, challenge)
            .await
        {
            warn!(%salt, %tx_hash, error = %source, "Session relayed but challenge was not delivered");
            return Err(SessionRequestError::Delivery { tx_hash, source });
        }

        info!(%salt, owner = %request.owner, %tx_hash, "Session request accepted");
        Ok(SessionRequestReceipt { tx_hash })
    }
}
