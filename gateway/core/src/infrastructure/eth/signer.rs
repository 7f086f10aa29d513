// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use alloy_primitives::{eip191_hash_message, keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;

use crate::domain::signature::{
    RecoverableSignature, SessionSigner, SignatureError, SignatureRecovery,
};

/// Derive the account address of a secp256k1 public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Uncompressed SEC1: 0x04 ‖ x ‖ y. The address is the tail of keccak(x ‖ y).
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

/// Recover the signer of a 32-byte prehash.
pub fn recover_prehash(
    prehash: B256,
    signature: &RecoverableSignature,
) -> Result<Address, SignatureError> {
    let sig = Signature::from_slice(&signature.rs())
        .map_err(|e| SignatureError::Recovery(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id())
        .ok_or(SignatureError::InvalidRecoveryId(signature.v()))?;

    // Only the canonical low-s form is accepted; s must not exceed n/2.
    if sig.normalize_s().is_some() {
        return Err(SignatureError::Recovery(
            "non-canonical signature: s is in the upper half of the curve order".to_string(),
        ));
    }

    let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &sig, recovery_id)
        .map_err(|e| SignatureError::Recovery(e.to_string()))?;
    Ok(public_key_to_address(&key))
}

/// secp256k1 personal-message recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SignatureRecovery for Secp256k1Recovery {
    fn recover_personal_signer(
        &self,
        message: &[u8],
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        recover_prehash(eip191_hash_message(message), signature)
    }
}

/// Provider signing key held in process memory.
///
/// `k256` zeroizes the scalar on drop.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    /// Parse a 32-byte private key given as `0x`-prefixed or bare hex.
    pub fn from_hex(private_key: &str) -> Result<Self, SignatureError> {
        let digits = private_key.trim().strip_prefix("0x").unwrap_or(private_key.trim());
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidKey)?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self::from_signing_key(key))
    }

    /// Fresh random key.
    pub fn random() -> Self {
        loop {
            let bytes: [u8; 32] = rand::random();
            // Zero and values >= n are rejected; retry on the rare miss.
            if let Ok(key) = SigningKey::from_slice(&bytes) {
                return Self::from_signing_key(key);
            }
        }
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl SessionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, SignatureError> {
        self.sign_hash(eip191_hash_message(message))
    }

    fn sign_hash(&self, hash: B256) -> Result<RecoverableSignature, SignatureError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| SignatureError::Signing(e.to_string()))?;

        let mut rs = [0u8; 64];
        rs.copy_from_slice(&signature.to_bytes());
        RecoverableSignature::from_parts(&rs, recovery_id.to_byte())
    }
}
