// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::types::{GatewayErrorBody, HealthStatus, SessionRequest, SessionRequestAccepted};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request to session gateway failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with an error body.
    #[error("session gateway returned {status}: {message}")]
    Gateway {
        status: u16,
        message: String,
        /// Set when the session was relayed on-chain but the challenge was not delivered.
        session_request_tx_hash: Option<String>,
    },

    #[error("unexpected response from session gateway: {0}")]
    InvalidResponse(String),
}

/// Client for a session gateway.
pub struct SessionGatewayClient {
    base_url: String,
    client: Client,
}

impl SessionGatewayClient {
    /// Create a new client for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SdkError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a signed session request. On success the challenge is on its
    /// way to the owner's channel and the relay transaction hash is returned.
    pub async fn submit(&self, request: &SessionRequest) -> Result<SessionRequestAccepted, SdkError> {
        let url = format!("{}/api/session/request", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<GatewayErrorBody>(&text) {
                Ok(body) => SdkError::Gateway {
                    status: body.status,
                    message: body.error,
                    session_request_tx_hash: body.session_request_tx_hash,
                },
                Err(_) => SdkError::Gateway {
                    status: status.as_u16(),
                    message: text,
                    session_request_tx_hash: None,
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| SdkError::InvalidResponse(e.to_string()))
    }

    /// Check gateway liveness.
    pub async fn health(&self) -> Result<HealthStatus, SdkError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SdkError::InvalidResponse(format!(
                "health check returned HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| SdkError::InvalidResponse(e.to_string()))
    }
}
