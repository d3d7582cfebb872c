// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! A minimal message interpreter: value transfers between accounts and the
//! read methods of the power actor, metered by a flat gas schedule.

mod errors;
mod gas;
mod processor;
mod vm;

pub use self::errors::Error;
pub use self::gas::{BLOCK_GAS_LIMIT, GasTracker, MESSAGE_BASE_GAS, PARAM_BYTE_GAS, send_gas};
pub use self::processor::{ApplyResult, DefaultProcessor, MessageProcessor};
pub use self::vm::VM;
