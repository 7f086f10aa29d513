// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::session::SessionSalt;

/// Request-count store keyed by salt, used to throttle repeated session
/// requests for the same channel identifier.
#[async_trait]
pub trait SessionRequestStore: Send + Sync {
    /// Record an attempt at `at` and return how many attempts for `salt` fall
    /// inside the store's window, this one included.
    async fn record_attempt(&self, salt: SessionSalt, at: DateTime<Utc>) -> Result<u32>;
}
