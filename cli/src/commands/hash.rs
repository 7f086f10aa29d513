// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Offline protocol tooling
//!
//! Commands: salt, request, session, verify

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::str::FromStr;

use session_gateway_core::domain::{
    address::parse_address,
    channel::{ChannelType, SessionSource},
    session::{
        generate_session_hash, generate_session_request_hash, generate_session_salt,
        verify_session_request, Challenge, SessionExpiry, SessionHash, SessionRequestHash,
        SessionSalt,
    },
    signature::RecoverableSignature,
};
use session_gateway_core::infrastructure::eth::Secp256k1Recovery;

#[derive(Subcommand)]
pub enum HashCommand {
    /// Salt for a source and channel
    Salt {
        /// Phone number (E.164) or email address
        #[arg(long)]
        source: String,

        /// Channel type (sms or email)
        #[arg(long = "type", default_value = "sms")]
        channel: String,
    },

    /// Session-request hash the owner signs
    Request(RequestFields),

    /// Session hash the provider countersigns
    Session {
        /// Session-request hash (0x-prefixed)
        #[arg(long)]
        request_hash: String,

        /// Six-digit challenge
        #[arg(long)]
        challenge: u32,
    },

    /// Check an owner signature over a session request
    Verify {
        #[command(flatten)]
        fields: RequestFields,

        /// Owner's 65-byte signature (0x-prefixed hex)
        #[arg(long)]
        signature: String,
    },
}

#[derive(Args)]
pub struct RequestFields {
    /// Session provider address
    #[arg(long)]
    provider: String,

    /// Owner (account) address
    #[arg(long)]
    owner: String,

    /// Phone number (E.164) or email address
    #[arg(long)]
    source: String,

    /// Channel type (sms or email)
    #[arg(long = "type", default_value = "sms")]
    channel: String,

    /// Expiry as unix seconds
    #[arg(long)]
    expiry: u64,
}

pub async fn handle_command(command: HashCommand) -> Result<()> {
    match command {
        HashCommand::Salt { source, channel } => {
            println!("{}", salt(&source, &channel)?);
        }
        HashCommand::Request(fields) => {
            println!("{}", request_hash(&fields)?);
        }
        HashCommand::Session {
            request_hash,
            challenge,
        } => {
            println!("{}", session_hash(&request_hash, challenge)?);
        }
        HashCommand::Verify { fields, signature } => {
            if verify(&fields, &signature)? {
                println!("{}", "✓ Signature is valid for this owner".green());
            } else {
                println!("{}", "✗ Signature does not match this owner".red());
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn parse_source(source: &str, channel: &str) -> Result<(SessionSource, ChannelType)> {
    let channel = ChannelType::from_str(channel)?;
    let source = SessionSource::new(source, channel).context("Invalid source")?;
    Ok((source, channel))
}

fn salt(source: &str, channel: &str) -> Result<SessionSalt> {
    let (source, channel) = parse_source(source, channel)?;
    Ok(generate_session_salt(&source, channel))
}

fn request_hash(fields: &RequestFields) -> Result<SessionRequestHash> {
    let provider = parse_address(&fields.provider).context("Invalid provider address")?;
    let owner = parse_address(&fields.owner).context("Invalid owner address")?;
    let (source, channel) = parse_source(&fields.source, &fields.channel)?;
    let expiry = SessionExpiry::new(fields.expiry)?;
    Ok(generate_session_request_hash(
        provider,
        owner,
        generate_session_salt(&source, channel),
        expiry,
    ))
}

fn session_hash(request_hash: &str, challenge: u32) -> Result<SessionHash> {
    let request_hash = B256::from_str(request_hash)
        .map_err(|e| anyhow::anyhow!("Invalid session-request hash: {}", e))?;
    let challenge = Challenge::new(challenge)
        .with_context(|| format!("Challenge must be six digits, got {}", challenge))?;
    Ok(generate_session_hash(
        SessionRequestHash(request_hash),
        challenge,
    ))
}

fn verify(fields: &RequestFields, signature: &str) -> Result<bool> {
    let provider = parse_address(&fields.provider).context("Invalid provider address")?;
    let owner = parse_address(&fields.owner).context("Invalid owner address")?;
    let (source, channel) = parse_source(&fields.source, &fields.channel)?;
    let expiry = SessionExpiry::new(fields.expiry)?;
    let signature = RecoverableSignature::from_hex(signature).context("Invalid signature")?;

    Ok(verify_session_request(
        &Secp256k1Recovery,
        provider,
        owner,
        &source,
        channel,
        expiry,
        signature.as_bytes(),
    ))
}
