// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server
//!
//! Wires the configured community, provider key and SMS gateway into the
//! session-request service and serves it until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use chrono::Utc;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

use session_gateway_core::{
    application::session_request::{SessionRequestSettings, StandardSessionRequestService},
    domain::{gateway_config::GatewayConfigManifest, signature::SessionSigner},
    infrastructure::{
        eth::{JsonRpcClient, JsonRpcSessionLedger, LocalSigner, Secp256k1Recovery},
        secrets::{resolve_secret, SecretError},
        InMemorySessionRequestStore, SmsGatewayDelivery,
    },
    presentation::api,
};

/// Everything `serve` needs besides the listener.
pub struct GatewayComponents {
    pub service: Arc<StandardSessionRequestService>,
    pub request_store: Arc<InMemorySessionRequestStore>,
    pub prune_interval: Duration,
}

pub async fn start_server(
    config: GatewayConfigManifest,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        "Configuration loaded: community={} chain_id={}",
        config.spec.community.alias, config.spec.community.chain_id
    );

    let components = build_components(&config)?;

    let metrics_enabled = config
        .spec
        .observability
        .as_ref()
        .is_none_or(|o| o.metrics_enabled);
    let metrics = if metrics_enabled {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    let prune_task = tokio::spawn(prune_request_store(
        components.request_store.clone(),
        components.prune_interval,
    ));

    let app = api::app(components.service, metrics);

    let host = host_override.unwrap_or_else(|| config.spec.server.bind_address.clone());
    let port = port_override.unwrap_or(config.spec.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Session gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    prune_task.abort();
    info!("Session gateway shutting down");

    Ok(())
}

/// Build the session-request service from a validated configuration.
///
/// A missing provider key is not fatal: the gateway starts and answers every
/// session request with 500 until a key is configured. A key that is present
/// but malformed, or that does not control the configured provider address,
/// is.
pub fn build_components(config: &GatewayConfigManifest) -> Result<GatewayComponents> {
    let community = &config.spec.community;
    let session_provider = community.session_provider_address()?;
    let session_manager = community.session_manager_address()?;
    let timeout = Duration::from_secs(config.spec.http.timeout_seconds);

    let signer = load_provider_signer(config.spec.signer.private_key.as_deref())?;
    if let Some(signer) = &signer {
        if signer.address() != session_provider {
            anyhow::bail!(
                "Provider key controls {} but spec.community.session_provider is {}",
                signer.address(),
                session_provider
            );
        }
    }

    let sms = config
        .spec
        .sms
        .as_ref()
        .context("spec.sms is required: challenges can only be delivered by SMS")?;
    let delivery =
        SmsGatewayDelivery::from_config(sms, timeout).context("Failed to initialize SMS gateway")?;

    let rpc = JsonRpcClient::new(community.rpc_url.clone(), timeout)
        .context("Failed to initialize JSON-RPC client")?;
    let ledger = JsonRpcSessionLedger::new(rpc, community.chain_id, community.gas_limit_multiplier);

    let window = Duration::from_secs(config.spec.limits.window_seconds);
    let request_store = Arc::new(InMemorySessionRequestStore::new(window));

    let service = Arc::new(StandardSessionRequestService::new(
        SessionRequestSettings {
            session_provider,
            session_manager,
            max_requests_per_salt: config.spec.limits.max_requests_per_salt,
        },
        signer,
        Arc::new(Secp256k1Recovery),
        Arc::new(ledger),
        Arc::new(delivery),
        request_store.clone(),
    ));

    Ok(GatewayComponents {
        service,
        request_store,
        prune_interval: window,
    })
}

fn load_provider_signer(reference: Option<&str>) -> Result<Option<Arc<dyn SessionSigner>>> {
    let Some(reference) = reference else {
        warn!("No provider key configured (spec.signer.private_key); session requests will fail");
        return Ok(None);
    };

    let key = match resolve_secret(reference) {
        Ok(key) => key,
        Err(SecretError::MissingEnv(var)) => {
            warn!(
                "Provider key variable {} is not set; session requests will fail",
                var
            );
            return Ok(None);
        }
        Err(e) => return Err(e).context("Failed to resolve provider key"),
    };

    // The key error never carries key material.
    let signer = LocalSigner::from_hex(&key).context("Invalid provider private key")?;
    info!("Provider signer loaded for {}", signer.address());
    let signer: Arc<dyn SessionSigner> = Arc::new(signer);
    Ok(Some(signer))
}

fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

async fn prune_request_store(store: Arc<InMemorySessionRequestStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        match store.prune(Utc::now()) {
            Ok(removed) => debug!("Pruned {} idle request-count entries", removed),
            Err(e) => error!("Failed to prune request-count store: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
