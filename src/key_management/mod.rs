// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod memory_signer;
mod wallet_helpers;

pub use errors::Error;
pub use memory_signer::MemorySigner;
pub use wallet_helpers::*;
