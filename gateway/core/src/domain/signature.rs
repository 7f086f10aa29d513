// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Recoverable Signatures
//!
//! Domain-level view of 65-byte secp256k1 signatures (`r ‖ s ‖ v`) and the two
//! capabilities the handshake needs from cryptography: recovering who signed a
//! personal message, and signing as the session provider.
//!
//! Both traits keep `k256` out of the domain layer. The concrete implementations
//! live in [`crate::infrastructure::eth::signer`].

use alloy_primitives::{Address, Bytes, B256};
use std::fmt;
use thiserror::Error;

pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),

    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("unsupported recovery byte v={0}")]
    InvalidRecoveryId(u8),

    #[error("signature could not be recovered: {0}")]
    Recovery(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid private key")]
    InvalidKey,
}

/// A 65-byte ECDSA signature with recovery byte, normalised to `v ∈ {27, 28}`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

impl RecoverableSignature {
    /// Build from `r ‖ s` and a recovery id of 0 or 1.
    pub fn from_parts(rs: &[u8; 64], recovery_id: u8) -> Result<Self, SignatureError> {
        if recovery_id > 1 {
            return Err(SignatureError::InvalidRecoveryId(recovery_id));
        }
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(rs);
        bytes[64] = 27 + recovery_id;
        Ok(Self(bytes))
    }

    /// Parse `0x`-prefixed or bare hex.
    pub fn from_hex(value: &str) -> Result<Self, SignatureError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidHex)?;
        Self::try_from(bytes.as_slice())
    }

    /// The 64 bytes `r ‖ s`.
    pub fn rs(&self) -> [u8; 64] {
        let mut rs = [0u8; 64];
        rs.copy_from_slice(&self.0[..64]);
        rs
    }

    pub fn r(&self) -> B256 {
        B256::from_slice(&self.0[..32])
    }

    pub fn s(&self) -> B256 {
        B256::from_slice(&self.0[32..64])
    }

    /// Recovery id in `{0, 1}`.
    pub fn recovery_id(&self) -> u8 {
        self.0[64] - 27
    }

    /// Recovery byte in `{27, 28}`.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl TryFrom<&[u8]> for RecoverableSignature {
    type Error = SignatureError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let mut bytes: [u8; SIGNATURE_LENGTH] = value
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(value.len()))?;
        bytes[64] = match bytes[64] {
            0 | 27 => 27,
            1 | 28 => 28,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        Ok(Self(bytes))
    }
}

impl From<RecoverableSignature> for Bytes {
    fn from(signature: RecoverableSignature) -> Self {
        Bytes::copy_from_slice(&signature.0)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Recovers the address that produced a personal-message signature.
pub trait SignatureRecovery: Send + Sync {
    /// Recover the signer of `message` signed as an EIP-191 personal message
    /// (`"\x19Ethereum Signed Message:\n" ‖ len ‖ message`).
    fn recover_personal_signer(
        &self,
        message: &[u8],
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError>;
}

/// The provider's signing identity.
///
/// # Security
///
/// Implementations own the private key. They must never expose it through
/// `Debug`, logs or errors.
pub trait SessionSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign `message` as an EIP-191 personal message.
    fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, SignatureError>;

    /// Sign a 32-byte digest directly (transaction signing hashes).
    fn sign_hash(&self, hash: B256) -> Result<RecoverableSignature, SignatureError>;
}
