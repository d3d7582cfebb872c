// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::LazyLock;

use crate::actors::REWARD_ACTOR_ADDR;
use crate::message::{Message as _, SignedMessage};
use crate::shim::{address::Address, econ::TokenAmount};
use crate::state_tree::StateTree;
use anyhow::Context as _;
use auto_impl::auto_impl;
use fvm_ipld_blockstore::Blockstore;

/// Reward paid to the owner of every block's miner, in whole FIL.
pub const BLOCK_REWARD_FIL: u64 = 1000;

pub static BLOCK_REWARD: LazyLock<TokenAmount> =
    LazyLock::new(|| TokenAmount::from_whole(BLOCK_REWARD_FIL));

/// Pays the owner of a block's miner. Implementations either apply a
/// payment in full or leave the state untouched.
#[auto_impl(&, Arc)]
pub trait BlockRewarder {
    /// Pays the block reward from the network account to `miner_owner`.
    fn block_reward<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        miner_owner: &Address,
    ) -> anyhow::Result<()>;

    /// Pays `cost` from the sender of `message` to `miner_owner`.
    fn gas_reward<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        miner_owner: &Address,
        message: &SignedMessage,
        cost: &TokenAmount,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRewarder;

impl DefaultRewarder {
    pub fn block_reward_amount(&self) -> TokenAmount {
        BLOCK_REWARD.clone()
    }
}

impl BlockRewarder for DefaultRewarder {
    fn block_reward<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        miner_owner: &Address,
    ) -> anyhow::Result<()> {
        reward_transfer(
            state,
            &REWARD_ACTOR_ADDR,
            miner_owner,
            &self.block_reward_amount(),
        )
        .context("Error attempting to pay block reward")
    }

    fn gas_reward<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        miner_owner: &Address,
        message: &SignedMessage,
        cost: &TokenAmount,
    ) -> anyhow::Result<()> {
        reward_transfer(state, &message.from(), miner_owner, cost)
            .context("Error attempting to pay gas reward")
    }
}

/// Transfers `value` inside a snapshot layer that is only kept when the
/// payment succeeds in full.
fn reward_transfer<S: Blockstore>(
    state: &mut StateTree<S>,
    from: &Address,
    to: &Address,
    value: &TokenAmount,
) -> anyhow::Result<()> {
    state.snapshot()?;
    let res = state
        .get_required_actor(from)
        .context("could not retrieve from actor for reward transfer")
        .and_then(|_| state.transfer(from, to, value));
    if res.is_err() {
        state.revert_to_snapshot()?;
    }
    state.clear_snapshot()?;
    res
}
