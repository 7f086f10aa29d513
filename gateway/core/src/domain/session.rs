// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session-Request Protocol
//!
//! Deterministic hash construction and signature verification for the
//! session-request handshake.
//!
//! ## Hash Construction
//!
//! ```text
//! salt                 = keccak256(utf8("{source}:{type}"))
//! session_request_hash = keccak256(provider[20] ‖ owner[20] ‖ salt[32] ‖ expiry[6])
//! session_hash         = keccak256(session_request_hash[32] ‖ challenge[32])
//! ```
//!
//! Every preimage uses Solidity packed encoding: fixed widths, big-endian
//! integers, no padding between fields. The byte layout is the interoperability
//! contract with the session-manager contract and with every client; changing
//! an order or a width breaks verification everywhere.
//!
//! ## Handshake
//!
//! ```text
//! owner signs session_request_hash (personal message)
//!   └─ verify_session_request()          ← recompute + recover + compare
//!   └─ generate_session_challenge()
//!   └─ generate_session_hash()           ← provider countersigns
//!   └─ SessionLedger::request_session()  ← on-chain relay
//!   └─ ChallengeDelivery::deliver()      ← challenge goes out-of-band
//! ```
//!
//! Nothing in this module holds state. Salts and challenges are never cached.

use alloy_primitives::{keccak256, Address, B256};
use rand::Rng;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::domain::channel::{ChannelType, SessionSource};
use crate::domain::signature::{RecoverableSignature, SignatureRecovery};

/// Largest expiry representable as a `uint48`.
pub const MAX_SESSION_EXPIRY: u64 = (1 << 48) - 1;

pub const CHALLENGE_MIN: u32 = 100_000;
pub const CHALLENGE_MAX: u32 = 999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    #[error("expiry {0} does not fit in 48 bits")]
    Overflow(u64),
}

macro_rules! digest_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub B256);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0 .0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl From<$name> for B256 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

digest_newtype!(
    /// Digest scoping a session request to one `(source, type)` pair.
    SessionSalt
);
digest_newtype!(
    /// Digest the owner signs to authorise a session.
    SessionRequestHash
);
digest_newtype!(
    /// Digest binding a request hash to its challenge; countersigned by the provider.
    SessionHash
);

/// Session expiry as unix seconds, bounded to 48 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionExpiry(u64);

impl SessionExpiry {
    /// Rejects values that would not survive `uint48` packing.
    pub fn new(unix_seconds: u64) -> Result<Self, ExpiryError> {
        if unix_seconds > MAX_SESSION_EXPIRY {
            return Err(ExpiryError::Overflow(unix_seconds));
        }
        Ok(Self(unix_seconds))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Big-endian `uint48` encoding.
    pub fn to_packed(&self) -> [u8; 6] {
        let bytes = self.0.to_be_bytes();
        [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
    }

    /// Whether the expiry is at or before `now_unix`.
    pub fn is_elapsed(&self, now_unix: i64) -> bool {
        now_unix >= 0 && self.0 <= now_unix as u64
    }
}

impl fmt::Display for SessionExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Six-digit numeric challenge delivered out-of-band.
///
/// `Display` is intentionally the only way to read the code as text; do not log it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Challenge(u32);

impl Challenge {
    /// Accepts only values in `[100000, 999999]`.
    pub fn new(value: u32) -> Option<Self> {
        (CHALLENGE_MIN..=CHALLENGE_MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Challenge(******)")
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

/// Salt over raw, unvalidated strings.
///
/// No normalization is applied; see [`SessionSource`] for the validated entry point.
pub fn salt_from_raw(source: &str, channel: &str) -> SessionSalt {
    SessionSalt(keccak256(format!("{source}:{channel}").as_bytes()))
}

pub fn generate_session_salt(source: &SessionSource, channel: ChannelType) -> SessionSalt {
    salt_from_raw(source.as_str(), channel.as_str())
}

pub fn generate_session_request_hash(
    provider: Address,
    owner: Address,
    salt: SessionSalt,
    expiry: SessionExpiry,
) -> SessionRequestHash {
    let mut preimage = [0u8; 20 + 20 + 32 + 6];
    preimage[..20].copy_from_slice(provider.as_slice());
    preimage[20..40].copy_from_slice(owner.as_slice());
    preimage[40..72].copy_from_slice(salt.0.as_slice());
    preimage[72..].copy_from_slice(&expiry.to_packed());
    SessionRequestHash(keccak256(preimage))
}

pub fn generate_session_hash(
    session_request_hash: SessionRequestHash,
    challenge: Challenge,
) -> SessionHash {
    let mut preimage = [0u8; 32 + 32];
    preimage[..32].copy_from_slice(session_request_hash.0.as_slice());
    // uint256, big-endian: the challenge occupies the low four bytes.
    preimage[60..].copy_from_slice(&challenge.value().to_be_bytes());
    SessionHash(keccak256(preimage))
}

/// Draw a fresh challenge from the thread-local CSPRNG.
pub fn generate_session_challenge() -> Challenge {
    Challenge(rand::rng().random_range(CHALLENGE_MIN..=CHALLENGE_MAX))
}

/// Check that `signature` is `owner`'s personal-message signature over the
/// session-request hash rebuilt from the raw request fields.
///
/// Fails closed: malformed signatures, recovery errors and address mismatches
/// all return `false`. Expiry is not checked here.
pub fn verify_session_request(
    recovery: &(impl SignatureRecovery + ?Sized),
    provider: Address,
    owner: Address,
    source: &SessionSource,
    channel: ChannelType,
    expiry: SessionExpiry,
    signature: &[u8],
) -> bool {
    let salt = generate_session_salt(source, channel);
    let session_request_hash = generate_session_request_hash(provider, owner, salt, expiry);

    let signature = match RecoverableSignature::try_from(signature) {
        Ok(signature) => signature,
        Err(e) => {
            debug!(%owner, error = %e, "Rejecting malformed session request signature");
            return false;
        }
    };

    match recovery.recover_personal_signer(session_request_hash.as_bytes(), &signature) {
        Ok(recovered) if recovered == owner => true,
        Ok(recovered) => {
            debug!(%owner, %recovered, "Session request signed by a different address");
            false
        }
        Err(e) => {
            debug!(%owner, error = %e, "Session request signature did not recover");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_expiry_packs_as_uint48() {
        let expiry = SessionExpiry::new(0x0102_0304_0506).unwrap();
        assert_eq!(expiry.to_packed(), [1, 2, 3, 4, 5, 6]);
        assert!(SessionExpiry::new(MAX_SESSION_EXPIRY).is_ok());
        assert_eq!(
            SessionExpiry::new(MAX_SESSION_EXPIRY + 1),
            Err(ExpiryError::Overflow(MAX_SESSION_EXPIRY + 1))
        );
    }

    #[test]
    fn test_expiry_elapsed() {
        let expiry = SessionExpiry::new(1_000).unwrap();
        assert!(expiry.is_elapsed(1_000));
        assert!(expiry.is_elapsed(1_001));
        assert!(!expiry.is_elapsed(999));
    }

    #[test]
    fn test_request_hash_is_deterministic() {
        let salt = salt_from_raw("+32478121212", "sms");
        let expiry = SessionExpiry::new(1_735_689_600).unwrap();
        let a = generate_session_request_hash(addr(1), addr(2), salt, expiry);
        let b = generate_session_request_hash(addr(1), addr(2), salt, expiry);
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_hash_is_sensitive_to_every_field() {
        let salt = salt_from_raw("+32478121212", "sms");
        let other_salt = salt_from_raw("+32478121213", "sms");
        let expiry = SessionExpiry::new(1_735_689_600).unwrap();
        let later = SessionExpiry::new(1_735_689_601).unwrap();

        let hashes: HashSet<_> = [
            generate_session_request_hash(addr(1), addr(2), salt, expiry),
            generate_session_request_hash(addr(3), addr(2), salt, expiry),
            generate_session_request_hash(addr(1), addr(3), salt, expiry),
            generate_session_request_hash(addr(1), addr(2), other_salt, expiry),
            generate_session_request_hash(addr(1), addr(2), salt, later),
            // Swapping provider and owner must not collide either.
            generate_session_request_hash(addr(2), addr(1), salt, expiry),
        ]
        .into_iter()
        .collect();

        assert_eq!(hashes.len(), 6);
    }

    #[test]
    fn test_session_hash_binds_challenge() {
        let request_hash = SessionRequestHash(B256::repeat_byte(0x11));
        let a = generate_session_hash(request_hash, Challenge::new(123_456).unwrap());
        let b = generate_session_hash(request_hash, Challenge::new(123_457).unwrap());
        assert_ne!(a, b);
        assert_eq!(
            a,
            generate_session_hash(request_hash, Challenge::new(123_456).unwrap())
        );
    }

    #[test]
    fn test_challenge_bounds() {
        assert!(Challenge::new(99_999).is_none());
        assert!(Challenge::new(1_000_000).is_none());
        assert_eq!(Challenge::new(100_000).unwrap().to_string(), "100000");
        assert_eq!(format!("{:?}", Challenge::new(424_242).unwrap()), "Challenge(******)");
    }

    #[test]
    fn test_generated_challenges_are_six_digits_and_vary() {
        let samples: Vec<u32> = (0..10_000).map(|_| generate_session_challenge().value()).collect();
        assert!(samples
            .iter()
            .all(|c| (CHALLENGE_MIN..=CHALLENGE_MAX).contains(c)));

        let distinct: HashSet<_> = samples.iter().collect();
        // 10k draws from 900k values: a handful of birthday collisions at most.
        assert!(distinct.len() > 9_900, "only {} distinct challenges", distinct.len());

        // Coarse uniformity: each of the nine leading-digit buckets gets ~1/9.
        let mut buckets = [0usize; 9];
        for c in &samples {
            buckets[(c / 100_000 - 1) as usize] += 1;
        }
        for count in buckets {
            assert!((900..=1_340).contains(&count), "bucket count {count} out of range");
        }
    }
}
