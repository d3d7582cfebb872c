// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::VM;
use crate::actors::power;
use crate::blocks::{Block, Tipset};
use crate::fil_cns::{BlockRewarder, DefaultRewarder};
use crate::message::{Message as _, SignedMessage};
use crate::shim::{
    address::Address,
    econ::{TokenAmount, gas_cost},
    error::ExitCode,
    executor::{Receipt, receipt},
};
use crate::state_tree::StateTree;
use ahash::HashSet;
use auto_impl::auto_impl;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use num_traits::Zero as _;
use tracing::{debug, trace};

/// Outcome of applying one message as part of a tipset.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub msg_cid: Cid,
    pub receipt: Receipt,
}

/// Applies the messages of blocks and tipsets to a state tree.
#[auto_impl(&, Arc)]
pub trait MessageProcessor {
    /// Pays the block reward and applies the messages of `block`, returning
    /// one receipt per message.
    fn process_block<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        block: &Block,
        ancestors: &[Tipset],
    ) -> anyhow::Result<Vec<Receipt>>;

    /// Applies every block of `tipset` in ticket order. A message carried by
    /// more than one block is applied once.
    fn process_tipset<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        tipset: &Tipset,
        ancestors: &[Tipset],
    ) -> anyhow::Result<Vec<ApplyResult>>;
}

/// Reference message processor.
#[derive(Debug, Default, Clone)]
pub struct DefaultProcessor<R = DefaultRewarder> {
    rewarder: R,
}

impl<R: BlockRewarder> DefaultProcessor<R> {
    pub fn new(rewarder: R) -> Self {
        Self { rewarder }
    }

    pub fn rewarder(&self) -> &R {
        &self.rewarder
    }

    /// Applies a single message and pays its gas to `miner_owner`.
    ///
    /// Messages with a negative value or fee cap, or whose sender is unknown,
    /// out of sequence or unable to cover `value + gas_limit * gas_fee_cap`
    /// are rejected with a receipt that uses no gas and leaves the state
    /// untouched. Errors are only returned for store failures and failed
    /// reward payments, in which case the state is left untouched as well.
    pub fn apply_message<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        msg: &SignedMessage,
        miner_owner: &Address,
    ) -> anyhow::Result<Receipt> {
        if msg.value() < TokenAmount::zero() || msg.gas_fee_cap() < TokenAmount::zero() {
            return Ok(rejected(ExitCode::USR_ILLEGAL_ARGUMENT));
        }
        let from = msg.from();
        let Some(sender) = state.get_actor(&from)? else {
            return Ok(rejected(ExitCode::SYS_SENDER_INVALID));
        };
        if sender.sequence != msg.sequence() {
            return Ok(rejected(ExitCode::SYS_SENDER_STATE_INVALID));
        }
        if sender.balance < msg.required_funds() {
            return Ok(rejected(ExitCode::SYS_INSUFFICIENT_FUNDS));
        }

        state.snapshot()?;
        let res = self.execute_message(state, msg, miner_owner);
        if res.is_err() {
            state.revert_to_snapshot()?;
        }
        state.clear_snapshot()?;
        res
    }

    fn execute_message<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        msg: &SignedMessage,
        miner_owner: &Address,
    ) -> anyhow::Result<Receipt> {
        let from = msg.from();
        state.mutate_actor(&from, |act| {
            act.sequence += 1;
            Ok(())
        })?;

        let mut vm = VM::new(state, msg.gas_limit());
        let (exit_code, return_data) = vm.send(
            &from,
            &msg.to(),
            msg.method_num(),
            &msg.value(),
            msg.params(),
        )?;
        let gas_used = vm.gas_used();

        let cost = gas_cost(gas_used, &msg.gas_fee_cap());
        self.rewarder.gas_reward(state, miner_owner, msg, &cost)?;

        trace!(%from, sequence = msg.sequence(), ?exit_code, gas_used, "applied message");
        Ok(receipt(exit_code, return_data, gas_used))
    }

    fn reward_block<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        block: &Block,
    ) -> anyhow::Result<Address> {
        let miner = block.header().miner_address;
        let owner = power::miner_owner(state, &miner)?;
        self.rewarder.block_reward(state, &owner)?;
        Ok(owner)
    }
}

fn rejected(exit_code: ExitCode) -> Receipt {
    receipt(exit_code, RawBytes::default(), 0)
}

impl<R: BlockRewarder> MessageProcessor for DefaultProcessor<R> {
    fn process_block<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        block: &Block,
        _ancestors: &[Tipset],
    ) -> anyhow::Result<Vec<Receipt>> {
        let owner = self.reward_block(state, block)?;
        let receipts = block
            .messages()
            .iter()
            .map(|msg| self.apply_message(state, msg, &owner))
            .collect::<anyhow::Result<Vec<_>>>()?;
        debug!(block = %block.cid(), messages = receipts.len(), "processed block");
        Ok(receipts)
    }

    fn process_tipset<S: Blockstore>(
        &self,
        state: &mut StateTree<S>,
        tipset: &Tipset,
        _ancestors: &[Tipset],
    ) -> anyhow::Result<Vec<ApplyResult>> {
        let mut processed = HashSet::<Cid>::default();
        let mut results = Vec::new();

        for block in tipset.blocks_by_ticket() {
            let owner = self.reward_block(state, block)?;
            for msg in block.messages() {
                let msg_cid = msg.cid()?;
                // Ensure no duplicate processing of a message
                if !processed.insert(msg_cid) {
                    continue;
                }
                let receipt = self.apply_message(state, msg, &owner)?;
                results.push(ApplyResult { msg_cid, receipt });
            }
        }
        debug!(tipset = %tipset.key(), messages = results.len(), "processed tipset");
        Ok(results)
    }
}
