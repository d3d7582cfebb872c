// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::econ::TokenAmount;

/// Returns `gas_units * price` as a token amount.
pub fn gas_cost(gas_units: u64, price: &TokenAmount) -> TokenAmount {
    TokenAmount::from_atto(price.atto() * gas_units)
}
