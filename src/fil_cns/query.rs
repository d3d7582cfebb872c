// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Read-only message execution against a state tree. Every change made by a
//! query is reverted before returning.

use crate::interpreter::{BLOCK_GAS_LIMIT, VM};
use crate::shim::{address::Address, econ::TokenAmount, error::ExitCode, message::MethodNum};
use crate::state_tree::StateTree;
use anyhow::Context as _;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;

/// Sends a zero-valued message from `from` to `to` and returns the return
/// value and exit code of the invoked method. The state is left unchanged.
pub fn query<S: Blockstore>(
    state: &mut StateTree<S>,
    from: &Address,
    to: &Address,
    method: MethodNum,
    params: &RawBytes,
) -> anyhow::Result<(RawBytes, ExitCode)> {
    let (exit_code, ret, _) = call_and_revert(state, from, to, method, params)?;
    Ok((ret, exit_code))
}

/// Like [`query`], but returns the gas a send of the message would use.
pub fn preview<S: Blockstore>(
    state: &mut StateTree<S>,
    from: &Address,
    to: &Address,
    method: MethodNum,
    params: &RawBytes,
) -> anyhow::Result<u64> {
    let (_, _, gas_used) = call_and_revert(state, from, to, method, params)?;
    Ok(gas_used)
}

fn call_and_revert<S: Blockstore>(
    state: &mut StateTree<S>,
    from: &Address,
    to: &Address,
    method: MethodNum,
    params: &RawBytes,
) -> anyhow::Result<(ExitCode, RawBytes, u64)> {
    state
        .get_required_actor(to)
        .context("failed to get To actor")?;

    state.snapshot()?;
    let res = run(state, from, to, method, params);
    state.revert_to_snapshot()?;
    state.clear_snapshot()?;
    res
}

fn run<S: Blockstore>(
    state: &mut StateTree<S>,
    from: &Address,
    to: &Address,
    method: MethodNum,
    params: &RawBytes,
) -> anyhow::Result<(ExitCode, RawBytes, u64)> {
    let mut vm = VM::new(state, BLOCK_GAS_LIMIT);
    let (exit_code, ret) = vm.send(from, to, method, &TokenAmount::default(), params)?;
    Ok((exit_code, ret, vm.gas_used()))
}
