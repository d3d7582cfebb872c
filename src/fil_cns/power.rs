// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actors::power;
use crate::shim::{address::Address, sector::StoragePower};
use crate::state_tree::StateTree;
use anyhow::Context as _;
use auto_impl::auto_impl;
use fvm_ipld_blockstore::Blockstore;

/// Read-only view of miner and network power at a given state.
#[auto_impl(&, Arc)]
pub trait PowerTableView {
    /// Total power of the network.
    fn total<S: Blockstore>(&self, state: &StateTree<S>) -> anyhow::Result<StoragePower>;

    /// Power claimed by `miner`.
    fn miner_power<S: Blockstore>(
        &self,
        state: &StateTree<S>,
        miner: &Address,
    ) -> anyhow::Result<StoragePower>;
}

/// Reads power from the power actor of the state tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatePowerTable;

impl PowerTableView for StatePowerTable {
    fn total<S: Blockstore>(&self, state: &StateTree<S>) -> anyhow::Result<StoragePower> {
        Ok(power::load_state(state)?.total_power)
    }

    fn miner_power<S: Blockstore>(
        &self,
        state: &StateTree<S>,
        miner: &Address,
    ) -> anyhow::Result<StoragePower> {
        power::load_state(state)?
            .miner_power(state.store(), miner)?
            .with_context(|| format!("miner {miner} not found in power table"))
    }
}
