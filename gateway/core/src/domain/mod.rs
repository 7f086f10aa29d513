// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer
//!
//! Session-request protocol types, hash construction and the collaborator
//! traits the handshake depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure protocol logic; no I/O

pub mod address;
pub mod channel;
pub mod delivery;
pub mod gateway_config;
pub mod ledger;
pub mod request_store;
pub mod session;
pub mod signature;
