// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, GasTracker, send_gas};
use crate::actors::{POWER_ACTOR_CODE_ID, power};
use crate::shim::{
    address::Address,
    econ::TokenAmount,
    error::ExitCode,
    message::{METHOD_SEND, MethodNum},
};
use crate::state_tree::{ActorState, StateTree};
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use fvm_shared4::bigint::bigint_ser::BigIntSer;
use num_traits::Zero as _;

/// Executes sends against a state tree, charging gas to a single tracker.
pub struct VM<'a, S> {
    state: &'a mut StateTree<S>,
    gas: GasTracker,
}

impl<'a, S> VM<'a, S>
where
    S: Blockstore,
{
    pub fn new(state: &'a mut StateTree<S>, gas_limit: u64) -> Self {
        Self {
            state,
            gas: GasTracker::new(gas_limit),
        }
    }

    pub fn gas_used(&self) -> u64 {
        self.gas.used()
    }

    pub fn state(&self) -> &StateTree<S> {
        self.state
    }

    /// Transfers `value` from `from` to `to` and invokes `method` on the
    /// receiver. Actor failures are reported as exit codes; the state changes
    /// of a failed send are reverted. Errors are reserved for store failures.
    pub fn send(
        &mut self,
        from: &Address,
        to: &Address,
        method: MethodNum,
        value: &TokenAmount,
        params: &RawBytes,
    ) -> Result<(ExitCode, RawBytes), Error> {
        if self.gas.charge(send_gas(params.len())).is_err() {
            return Ok((ExitCode::SYS_OUT_OF_GAS, RawBytes::default()));
        }

        self.state.snapshot()?;
        let res = self.send_inner(from, to, method, value, params);
        if !matches!(&res, Ok((code, _)) if code.is_success()) {
            self.state.revert_to_snapshot()?;
        }
        self.state.clear_snapshot()?;

        let (exit_code, ret) = res?;
        if !exit_code.is_success() {
            tracing::debug!(%from, %to, method, ?exit_code, "send failed");
        }
        Ok((exit_code, ret))
    }

    fn send_inner(
        &mut self,
        from: &Address,
        to: &Address,
        method: MethodNum,
        value: &TokenAmount,
        params: &RawBytes,
    ) -> Result<(ExitCode, RawBytes), Error> {
        if *value < TokenAmount::zero() {
            return Ok((ExitCode::USR_ILLEGAL_ARGUMENT, RawBytes::default()));
        }
        if value.is_zero() {
            self.state.get_or_create_account(to)?;
        } else {
            let balance = self.state.get_actor(from)?.map(|a| a.balance);
            if balance.is_none_or(|balance| balance < *value) {
                return Ok((ExitCode::SYS_INSUFFICIENT_FUNDS, RawBytes::default()));
            }
            self.state.transfer(from, to, value)?;
        }

        let receiver = self.state.get_required_actor(to)?;
        self.invoke(&receiver, method, params)
    }

    fn invoke(
        &self,
        receiver: &ActorState,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<(ExitCode, RawBytes), Error> {
        if method == METHOD_SEND {
            return Ok((ExitCode::OK, RawBytes::default()));
        }
        if receiver.code == *POWER_ACTOR_CODE_ID {
            return self.invoke_power(receiver, method, params);
        }
        Ok((ExitCode::USR_UNHANDLED_MESSAGE, RawBytes::default()))
    }

    fn invoke_power(
        &self,
        receiver: &ActorState,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<(ExitCode, RawBytes), Error> {
        let st = power::State::load(self.state.store(), receiver)?;
        match method {
            power::TOTAL_POWER_METHOD => Ok((
                ExitCode::OK,
                RawBytes::serialize(BigIntSer(&st.total_power))?,
            )),
            power::MINER_POWER_METHOD => {
                let Ok(miner) = params.deserialize::<Address>() else {
                    return Ok((ExitCode::USR_SERIALIZATION, RawBytes::default()));
                };
                match st.miner_power(self.state.store(), &miner)? {
                    Some(p) => Ok((ExitCode::OK, RawBytes::serialize(BigIntSer(&p))?)),
                    None => Ok((ExitCode::USR_NOT_FOUND, RawBytes::default())),
                }
            }
            _ => Ok((ExitCode::USR_UNHANDLED_MESSAGE, RawBytes::default())),
        }
    }
}
