// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod eth;
pub mod repositories;
pub mod secrets;
pub mod sms;

pub use repositories::InMemorySessionRequestStore;
pub use sms::SmsGatewayDelivery;
