// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod session_request;

// Re-export use cases for convenience
pub use session_request::{
    SessionRequestError, SessionRequestInput, SessionRequestReceipt, SessionRequestService,
    SessionRequestSettings, StandardSessionRequestService,
};
