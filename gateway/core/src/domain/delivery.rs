// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Out-of-band challenge delivery boundary.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::channel::{ChannelType, SessionSource};
use crate::domain::session::Challenge;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("channel {0} has no delivery gateway")]
    UnsupportedChannel(ChannelType),

    #[error("delivery gateway unreachable: {0}")]
    Transport(String),

    #[error("delivery gateway rejected the message (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Sends a plaintext challenge to the owner.
#[async_trait]
pub trait ChallengeDelivery: Send + Sync {
    /// Whether this gateway can reach identifiers of `channel`.
    fn supports(&self, channel: ChannelType) -> bool {
        channel.is_deliverable()
    }

    async fn deliver(
        &self,
        channel: ChannelType,
        destination: &SessionSource,
        challenge: Challenge,
    ) -> Result<(), DeliveryError>;
}
