// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`session-gateway-core`)
//!
//! HTTP surface that translates requests into application service calls. No
//! protocol logic lives here; handlers map wire bodies in and errors out.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/session/request` | Submit a signed session request |
//! | `GET /health` | Liveness and uptime |
//! | `GET /metrics` | Prometheus exposition (when enabled) |

pub mod api;
