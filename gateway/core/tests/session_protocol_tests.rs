// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Known-answer and negative tests for the session-request protocol.
//!
//! The literal digests below were computed with an independent keccak-256 /
//! secp256k1 implementation. Any change to a preimage layout shows up here
//! first.

use alloy_primitives::{eip191_hash_message, Address, B256, U256};
use session_gateway_core::domain::address::parse_address;
use session_gateway_core::domain::channel::{ChannelType, SessionSource};
use session_gateway_core::domain::session::{
    generate_session_hash, generate_session_request_hash, generate_session_salt, salt_from_raw,
    verify_session_request, Challenge, SessionExpiry,
};
use session_gateway_core::domain::signature::{
    RecoverableSignature, SessionSigner, SignatureError, SignatureRecovery,
};
use session_gateway_core::infrastructure::eth::signer::{
    recover_prehash, LocalSigner, Secp256k1Recovery,
};
use std::str::FromStr;

const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const PROVIDER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const PROVIDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
const SOURCE: &str = "+32478121212";
const EXPIRY: u64 = 1_735_689_600;

const SMS_SALT: &str = "0xd6e1d3bc4b24de2d3b22e2be6a0fd377657b338064a0e8fc21690c160d9999cd";
const EMAIL_SALT: &str = "0xbbbd5f685cb1b6e17fd91175dc36fe32a5b2e73d534ce546ffa247ad6bada205";
const REQUEST_HASH: &str = "0xef538ac0b5fc02ed2cef1fdea8f86c7a0f6facee9ec72b640122eb236e8a6b5f";
const PERSONAL_HASH: &str = "0xcab328a2fdc2c74e8d112e188612dd185606e701af0d60b44d4a0a09910ea62a";
const OWNER_SIGNATURE: &str = "0xc74bf14f70e7365c3f8d1bc171125268b6e6162e338f044b3fae86ee194cd1a50fa66543645bdd255d36aa0e99f8a13ef2980a7010ffde2b842e334ba446f08e1b";
const SESSION_HASH: &str = "0x825b08f17b69dfb507886c3bfd58b27d5eabc137501515a74af0693d1b1ba0da";
// secp256k1 group order.
const CURVE_ORDER: &str = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";

fn provider() -> Address {
    parse_address(PROVIDER).unwrap()
}

fn owner() -> Address {
    parse_address(OWNER).unwrap()
}

fn sms_source() -> SessionSource {
    SessionSource::new(SOURCE, ChannelType::Sms).unwrap()
}

fn expiry() -> SessionExpiry {
    SessionExpiry::new(EXPIRY).unwrap()
}

fn owner_signature() -> Vec<u8> {
    hex::decode(&OWNER_SIGNATURE[2..]).unwrap()
}

fn verify(
    provider: Address,
    owner: Address,
    source: &SessionSource,
    channel: ChannelType,
    expiry: SessionExpiry,
    signature: &[u8],
) -> bool {
    verify_session_request(
        &Secp256k1Recovery,
        provider,
        owner,
        source,
        channel,
        expiry,
        signature,
    )
}

#[test]
fn test_salt_known_answers() {
    let source = sms_source();
    assert_eq!(generate_session_salt(&source, ChannelType::Sms).to_hex(), SMS_SALT);
    assert_eq!(salt_from_raw(SOURCE, "email").to_hex(), EMAIL_SALT);
    assert_ne!(SMS_SALT, EMAIL_SALT);
}

#[test]
fn test_request_hash_known_answer() {
    let salt = generate_session_salt(&sms_source(), ChannelType::Sms);
    let hash = generate_session_request_hash(provider(), owner(), salt, expiry());
    assert_eq!(hash.to_hex(), REQUEST_HASH);
    assert_eq!(
        eip191_hash_message(hash.as_bytes()),
        B256::from_str(PERSONAL_HASH).unwrap()
    );
}

#[test]
fn test_session_hash_known_answer() {
    let request_hash = generate_session_request_hash(
        provider(),
        owner(),
        generate_session_salt(&sms_source(), ChannelType::Sms),
        expiry(),
    );
    let session_hash = generate_session_hash(request_hash, Challenge::new(123_456).unwrap());
    assert_eq!(session_hash.to_hex(), SESSION_HASH);
}

#[test]
fn test_reference_owner_signature_verifies() {
    assert!(verify(
        provider(),
        owner(),
        &sms_source(),
        ChannelType::Sms,
        expiry(),
        &owner_signature()
    ));
}

#[test]
fn test_locally_signed_request_round_trips() {
    let owner_signer = LocalSigner::from_hex(OWNER_KEY).unwrap();
    assert_eq!(owner_signer.address(), owner());

    let salt = generate_session_salt(&sms_source(), ChannelType::Sms);
    let hash = generate_session_request_hash(provider(), owner(), salt, expiry());
    let signature = owner_signer.sign_message(hash.as_bytes()).unwrap();

    assert!(verify(
        provider(),
        owner(),
        &sms_source(),
        ChannelType::Sms,
        expiry(),
        signature.as_bytes()
    ));
}

#[test]
fn test_provider_countersignature_recovers_to_provider() {
    let provider_signer = LocalSigner::from_hex(PROVIDER_KEY).unwrap();
    assert_eq!(provider_signer.address(), provider());

    let session_hash = B256::from_str(SESSION_HASH).unwrap();
    let signature = provider_signer.sign_message(session_hash.as_slice()).unwrap();
    let recovered = Secp256k1Recovery
        .recover_personal_signer(session_hash.as_slice(), &signature)
        .unwrap();
    assert_eq!(recovered, provider());
}

#[test]
fn test_any_field_change_breaks_verification() {
    let signature = owner_signature();
    let source = sms_source();
    let other_source = SessionSource::new("+32478121213", ChannelType::Sms).unwrap();
    let later = SessionExpiry::new(EXPIRY + 1).unwrap();

    assert!(!verify(owner(), owner(), &source, ChannelType::Sms, expiry(), &signature));
    assert!(!verify(provider(), provider(), &source, ChannelType::Sms, expiry(), &signature));
    assert!(!verify(provider(), owner(), &other_source, ChannelType::Sms, expiry(), &signature));
    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, later, &signature));
}

#[test]
fn test_signature_for_one_channel_does_not_verify_for_another() {
    // Same identifier, different channel: the salts differ so the request hashes do too.
    let source = SessionSource::new(SOURCE, ChannelType::Sms).unwrap();
    assert!(!verify(
        provider(),
        owner(),
        &source,
        ChannelType::Email,
        expiry(),
        &owner_signature()
    ));
}

#[test]
fn test_malformed_signatures_fail_closed() {
    let source = sms_source();
    let mut flipped = owner_signature();
    flipped[10] ^= 0x01;
    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, expiry(), &flipped));

    let truncated = &owner_signature()[..64];
    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, expiry(), truncated));

    let mut bad_v = owner_signature();
    bad_v[64] = 29;
    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, expiry(), &bad_v));

    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, expiry(), &[]));
    assert!(!verify(provider(), owner(), &source, ChannelType::Sms, expiry(), &[0u8; 65]));
}

#[test]
fn test_zero_based_recovery_byte_is_accepted() {
    let mut zero_based = owner_signature();
    zero_based[64] -= 27;
    assert!(verify(
        provider(),
        owner(),
        &sms_source(),
        ChannelType::Sms,
        expiry(),
        &zero_based
    ));
    let normalized = RecoverableSignature::try_from(zero_based.as_slice()).unwrap();
    assert_eq!(normalized.to_hex(), OWNER_SIGNATURE);
}

#[test]
fn test_high_s_twin_of_owner_signature_is_rejected() {
    let mut twin = owner_signature();
    let n = U256::from_str(CURVE_ORDER).unwrap();
    let s = U256::from_be_slice(&twin[32..64]);
    twin[32..64].copy_from_slice(&(n - s).to_be_bytes::<32>());
    twin[64] = if twin[64] == 27 { 28 } else { 27 };

    // Same r, mirrored s and flipped parity recover the same key, but only
    // the low-s form is canonical.
    assert!(!verify(
        provider(),
        owner(),
        &sms_source(),
        ChannelType::Sms,
        expiry(),
        &twin
    ));

    let parsed = RecoverableSignature::try_from(twin.as_slice()).unwrap();
    let result = recover_prehash(B256::from_str(PERSONAL_HASH).unwrap(), &parsed);
    assert!(matches!(result, Err(SignatureError::Recovery(_))));
}

#[test]
fn test_address_case_does_not_affect_verification() {
    let lower_owner = parse_address(&OWNER.to_lowercase()).unwrap();
    let upper_provider = parse_address(&format!("0x{}", PROVIDER[2..].to_uppercase())).unwrap();
    assert!(verify(
        upper_provider,
        lower_owner,
        &sms_source(),
        ChannelType::Sms,
        expiry(),
        &owner_signature()
    ));
}

#[test]
fn test_non_canonical_sources_are_rejected_not_normalized() {
    for raw in ["0032478121212", " +32478121212", "+32 478 12 12 12", "+32478121212\n"] {
        assert!(
            SessionSource::new(raw, ChannelType::Sms).is_err(),
            "{raw:?} should be rejected"
        );
    }
}
