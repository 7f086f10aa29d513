// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Session Gateway CLI
//!
//! The `session-gateway` binary runs the provider side of the session-request
//! handshake and ships the offline tooling around it.
//!
//! ## Commands
//!
//! - `session-gateway serve` - Run the HTTP gateway
//! - `session-gateway config show|validate|generate` - Configuration management
//! - `session-gateway hash salt|request|session|verify` - Protocol hashes, offline
//! - `session-gateway request` - Sign and submit a session request as an owner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use session_gateway::commands::{self, ConfigCommand, HashCommand, RequestArgs};
use session_gateway::logging::{init_logging, LogSettings};
use session_gateway::server;
use session_gateway_core::domain::gateway_config::GatewayConfigManifest;

/// Session gateway - relay signed session requests and deliver challenges
#[derive(Parser)]
#[command(name = "session-gateway")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SESSION_GATEWAY_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SESSION_GATEWAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text or json)
    #[arg(long, global = true, env = "SESSION_GATEWAY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    #[command(name = "serve")]
    Serve {
        /// Bind address (overrides spec.server.bind_address)
        #[arg(long)]
        host: Option<String>,

        /// HTTP API port (overrides spec.server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Compute protocol hashes offline
    #[command(name = "hash")]
    Hash {
        #[command(subcommand)]
        command: HashCommand,
    },

    /// Sign and submit a session request
    #[command(name = "request")]
    Request(RequestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            // Loaded before logging so observability.logging can apply.
            let config = GatewayConfigManifest::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            let logging = config
                .spec
                .observability
                .as_ref()
                .and_then(|o| o.logging.as_ref());
            init_logging(&LogSettings::resolve(
                cli.log_level.as_deref(),
                cli.log_format.as_deref(),
                logging,
            ))?;

            info!("Starting session gateway");
            server::start_server(config, host, port).await
        }
        Some(Commands::Config { command }) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Hash { command }) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            commands::hash::handle_command(command).await
        }
        Some(Commands::Request(args)) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            commands::request::handle_command(args).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// One-shot commands log warnings and above unless asked otherwise.
fn init_cli_logging(level: &Option<String>, format: &Option<String>) -> Result<()> {
    init_logging(&LogSettings::resolve(
        level.as_deref().or(Some("warn")),
        format.as_deref(),
        None,
    ))
}
