// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session gateway core
//!
//! Protocol engine and service plumbing for the session-request handshake.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Hosts the domain, application, infrastructure and presentation layers

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
