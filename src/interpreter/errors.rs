// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Interpreter error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read state from the database: {0}")]
    Lookup(#[from] anyhow::Error),

    #[error("failed to encode actor return value: {0}")]
    Encoding(#[from] fvm_ipld_encoding::Error),

    #[error("out of gas: charging {charge} with {used} of {limit} used")]
    OutOfGas { charge: u64, used: u64, limit: u64 },
}
