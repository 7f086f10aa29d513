// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use session_gateway_core::domain::gateway_config::{GatewayConfigManifest, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./session-gateway.yaml)
        #[arg(short, long, default_value = "./session-gateway.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GatewayConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        for (i, path) in GatewayConfigManifest::discovery_paths().iter().enumerate() {
            let marker = if path.exists() { "" } else { " (missing)" };
            println!("  {}. {}{}", i + 2, path.display(), marker.dimmed());
        }
        if std::env::var(CONFIG_PATH_ENV).is_err() {
            println!("  ({} not set)", CONFIG_PATH_ENV);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Deployment:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!(
        "  Listen: {}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    println!();

    let community = &config.spec.community;
    println!("{}", "Community:".bold());
    println!("  Alias: {}", community.alias);
    println!("  Chain ID: {}", community.chain_id);
    println!("  RPC: {}", community.rpc_url);
    println!("  Session manager: {}", community.session_manager);
    println!("  Session provider: {}", community.session_provider);
    println!("  Gas limit multiplier: {}", community.gas_limit_multiplier);
    println!();

    println!("{}", "Provider key:".bold());
    println!("  {}", describe_secret(config.spec.signer.private_key.as_deref()));
    println!();

    println!("{}", "SMS:".bold());
    match &config.spec.sms {
        Some(sms) => {
            println!("  Endpoint: {}", sms.endpoint);
            println!("  Account: {}", sms.account_sid);
            println!("  Auth token: {}", describe_secret(Some(&sms.auth_token)));
            println!("  From: {}", sms.from);
        }
        None => println!("  {}", "(not configured)".yellow()),
    }
    println!();

    println!("{}", "Limits:".bold());
    println!(
        "  {} requests per source every {}s",
        config.spec.limits.max_requests_per_salt, config.spec.limits.window_seconds
    );
    println!();

    Ok(())
}

/// Describe a secret reference without printing the secret.
fn describe_secret(reference: Option<&str>) -> String {
    match reference {
        None => "(not set)".to_string(),
        Some(r) if r.starts_with("env:") => format!("from environment ({})", &r[4..]),
        Some(_) => "(inline value)".to_string(),
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    if config.spec.sms.is_none() {
        println!(
            "{}",
            "⚠ spec.sms is not set; `serve` will refuse to start".yellow()
        );
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = template(with_examples);

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn template(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}
