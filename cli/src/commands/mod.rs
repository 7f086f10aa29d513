// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the session gateway CLI

pub mod config;
pub mod hash;
pub mod request;

pub use self::config::ConfigCommand;
pub use self::hash::HashCommand;
pub use self::request::RequestArgs;
