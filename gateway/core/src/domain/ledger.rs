// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session Ledger (Anti-Corruption Layer)
//!
//! Boundary to the on-chain session-manager contract. The domain hands over a
//! fully signed authorization; the ledger turns it into a transaction on the
//! community's network and reports the transaction hash. Confirmation and
//! finality are the ledger's business, not the handshake's.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::session::{SessionExpiry, SessionRequestHash, SessionSalt};
use crate::domain::signature::{RecoverableSignature, SessionSigner};

/// Arguments of the session manager's `request` entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequestCall {
    /// Session-manager contract the call is addressed to.
    pub session_manager: Address,
    pub salt: SessionSalt,
    pub session_request_hash: SessionRequestHash,
    /// Owner's signature over `session_request_hash`.
    pub owner_signature: RecoverableSignature,
    /// Provider's signature over the session hash.
    pub provider_signature: RecoverableSignature,
    pub expiry: SessionExpiry,
}

/// Point in the relay at which an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    /// Nonce, fee and gas lookups, signing. Nothing has been broadcast.
    Prepare,
    /// Broadcasting the signed transaction.
    Submit,
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => f.write_str("prepare"),
            Self::Submit => f.write_str("submit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("network error during {stage}: {message}")]
    Transport { stage: RelayStage, message: String },

    #[error("node rejected {stage} (code {code}): {message}")]
    Rejected {
        stage: RelayStage,
        code: i64,
        message: String,
    },

    #[error("unexpected node response during {stage}: {message}")]
    InvalidResponse { stage: RelayStage, message: String },

    #[error("failed to sign relay transaction: {0}")]
    Signing(String),
}

impl LedgerError {
    /// Whether the transaction may have reached the network.
    ///
    /// `false` means resubmitting cannot double-relay. `true` means the caller
    /// has to check the chain before retrying.
    pub fn may_have_been_submitted(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                stage: RelayStage::Submit,
                ..
            } | Self::InvalidResponse {
                stage: RelayStage::Submit,
                ..
            }
        )
    }
}

/// Relays signed session requests to one community's session manager.
#[async_trait]
pub trait SessionLedger: Send + Sync {
    /// Submit `call` as a transaction signed by `signer`; returns the transaction hash.
    ///
    /// No retries: errors propagate as-is.
    async fn request_session(
        &self,
        signer: &dyn SessionSigner,
        call: &SessionRequestCall,
    ) -> Result<B256, LedgerError>;
}
