// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod abi;
pub mod rpc;
pub mod session_manager;
pub mod signer;
pub mod transaction;

pub use rpc::JsonRpcClient;
pub use session_manager::JsonRpcSessionLedger;
pub use signer::{LocalSigner, Secp256k1Recovery};
