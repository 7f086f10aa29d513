// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tracing subscriber setup

use anyhow::{Context, Result};
use session_gateway_core::domain::gateway_config::LoggingConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl LogSettings {
    /// Command-line values win over the config file's `observability.logging`.
    pub fn resolve(
        cli_level: Option<&str>,
        cli_format: Option<&str>,
        config: Option<&LoggingConfig>,
    ) -> Self {
        let level = cli_level
            .map(str::to_string)
            .or_else(|| config.map(|c| c.level.clone()))
            .unwrap_or_else(|| "info".to_string());
        let format = cli_format
            .map(str::to_string)
            .or_else(|| config.map(|c| c.format.clone()))
            .unwrap_or_else(|| "text".to_string());

        Self {
            level,
            json: format.eq_ignore_ascii_case("json"),
        }
    }
}

/// Initialize tracing subscriber for logging
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if settings.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
