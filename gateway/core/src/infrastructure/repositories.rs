// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::request_store::SessionRequestStore;
use crate::domain::session::SessionSalt;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Sliding-window attempt log held in process memory.
///
/// Counts are lost on restart and are not shared between replicas.
#[derive(Clone)]
pub struct InMemorySessionRequestStore {
    attempts: Arc<Mutex<HashMap<SessionSalt, Vec<DateTime<Utc>>>>>,
    window: Duration,
}

impl InMemorySessionRequestStore {
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            window: Duration::from_std(window).unwrap_or(Duration::MAX),
        }
    }

    /// Oldest instant still outside the window, `None` when the window reaches past the epoch range.
    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.window)
    }

    /// Drop every attempt older than the window; returns the number of salts still tracked.
    pub fn prune(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut attempts = self.attempts.lock().map_err(|_| anyhow!("Mutex poisoned"))?;
        let cutoff = self.cutoff(now);
        attempts.retain(|_, log| {
            log.retain(|at| Some(*at) > cutoff);
            !log.is_empty()
        });
        Ok(attempts.len())
    }
}

#[async_trait]
impl SessionRequestStore for InMemorySessionRequestStore {
    async fn record_attempt(&self, salt: SessionSalt, at: DateTime<Utc>) -> Result<u32> {
        let mut attempts = self.attempts.lock().map_err(|_| anyhow!("Mutex poisoned"))?;
        let cutoff = self.cutoff(at);
        let log = attempts.entry(salt).or_default();
        log.retain(|previous| Some(*previous) > cutoff);
        log.push(at);
        Ok(u32::try_from(log.len()).unwrap_or(u32::MAX))
    }
}
