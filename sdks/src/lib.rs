// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session Gateway Rust SDK
//!
//! Build, sign and submit session requests from the owner side of the
//! handshake.

pub mod client;
pub mod types;

pub use client::{SdkError, SessionGatewayClient};
pub use types::*;
