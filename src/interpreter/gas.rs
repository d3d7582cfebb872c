// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Error;

/// Maximum gas a single block may consume. Also the limit of read-only
/// queries.
pub const BLOCK_GAS_LIMIT: u64 = 10_000_000;
/// Gas charged for every send.
pub const MESSAGE_BASE_GAS: u64 = 100;
/// Gas charged per byte of message parameters.
pub const PARAM_BYTE_GAS: u64 = 1;

/// Gas charged for sending a message with `params_len` bytes of parameters.
pub fn send_gas(params_len: usize) -> u64 {
    let params_len = u64::try_from(params_len).unwrap_or(u64::MAX);
    MESSAGE_BASE_GAS.saturating_add(params_len.saturating_mul(PARAM_BYTE_GAS))
}

/// Tracks gas consumption of a single message against its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasTracker {
    limit: u64,
    used: u64,
}

impl GasTracker {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Charges `amount`. Running out of gas consumes the whole limit.
    pub fn charge(&mut self, amount: u64) -> Result<(), Error> {
        match self.used.checked_add(amount) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => {
                let err = Error::OutOfGas {
                    charge: amount,
                    used: self.used,
                    limit: self.limit,
                };
                self.used = self.limit;
                Err(err)
            }
        }
    }
}
