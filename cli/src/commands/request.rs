// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `request`: sign a session request as the owner and submit it to a gateway.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use std::str::FromStr;
use std::time::Duration;

use session_gateway_core::domain::{
    address::parse_address,
    channel::{ChannelType, SessionSource},
    session::SessionExpiry,
};
use session_gateway_core::infrastructure::{eth::LocalSigner, secrets::resolve_secret};
use session_gateway_sdk::{SdkError, SessionGatewayClient, SessionRequest};

#[derive(Args)]
pub struct RequestArgs {
    /// Gateway base URL
    #[arg(long, env = "SESSION_GATEWAY_URL", default_value = "http://127.0.0.1:8000")]
    gateway: String,

    /// Session provider address
    #[arg(long)]
    provider: String,

    /// Phone number (E.164) or email address
    #[arg(long)]
    source: String,

    /// Channel type
    #[arg(long = "type", default_value = "sms")]
    channel: String,

    /// Session lifetime in seconds from now
    #[arg(long, default_value_t = 600, conflicts_with = "expiry")]
    expires_in: u64,

    /// Absolute expiry as unix seconds
    #[arg(long)]
    expiry: Option<u64>,

    /// Owner private key (supports "env:VAR_NAME")
    #[arg(
        long,
        env = "SESSION_GATEWAY_OWNER_PRIVATE_KEY",
        hide_env_values = true,
        value_name = "KEY"
    )]
    owner_key: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

pub async fn handle_command(args: RequestArgs) -> Result<()> {
    let owner = LocalSigner::from_hex(&resolve_secret(&args.owner_key)?)
        .context("Invalid owner private key")?;
    let request = build_request(&args, &owner, Utc::now().timestamp())?;

    println!(
        "Requesting session for {} via {}",
        request.owner.bold(),
        args.gateway
    );

    let client = SessionGatewayClient::with_timeout(&args.gateway, Duration::from_secs(args.timeout))?;
    match client.submit(&request).await {
        Ok(accepted) => {
            println!("{}", "✓ Session requested".green());
            println!("  Transaction: {}", accepted.session_request_tx_hash);
            println!("  A challenge code is on its way to {}", request.source);
            Ok(())
        }
        Err(SdkError::Gateway {
            status,
            message,
            session_request_tx_hash: Some(tx_hash),
        }) => {
            println!(
                "{}",
                "⚠ Session was recorded on-chain but the challenge was not delivered".yellow()
            );
            println!("  Transaction: {}", tx_hash);
            anyhow::bail!("gateway returned {}: {}", status, message)
        }
        Err(e) => Err(e).context("Session request failed"),
    }
}

fn build_request(args: &RequestArgs, owner: &LocalSigner, now: i64) -> Result<SessionRequest> {
    let provider = parse_address(&args.provider).context("Invalid provider address")?;
    let channel = ChannelType::from_str(&args.channel)?;
    let source = SessionSource::new(args.source.as_str(), channel).context("Invalid source")?;

    let expiry = match args.expiry {
        Some(expiry) => expiry,
        None => u64::try_from(now)
            .context("System clock is before the unix epoch")?
            .saturating_add(args.expires_in),
    };
    let expiry = SessionExpiry::new(expiry)?;

    Ok(SessionRequest::sign(owner, provider, &source, channel, expiry)?)
}
