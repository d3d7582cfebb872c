// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;

pub use super::fvm_shared_latest::receipt::Receipt;
use super::error::ExitCode;

/// Builds a receipt without events.
pub fn receipt(exit_code: ExitCode, return_data: RawBytes, gas_used: u64) -> Receipt {
    Receipt {
        exit_code,
        return_data,
        gas_used,
        events_root: None,
    }
}
