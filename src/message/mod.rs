// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod signed_message;

use crate::shim::{
    address::Address,
    econ::TokenAmount,
    message::{Message as ShimMessage, MethodNum},
};
use crate::utils::encoding::CidCborExt as _;
use cid::Cid;
use fvm_ipld_encoding::RawBytes;
pub use signed_message::SignedMessage;

/// Message interface to interact with signed and unsigned messages in a
/// generic context.
pub trait Message {
    /// Returns the from address of the message.
    fn from(&self) -> Address;
    /// Returns the destination address of the message.
    fn to(&self) -> Address;
    /// Returns the message sequence or nonce.
    fn sequence(&self) -> u64;
    /// Returns the amount sent in message.
    fn value(&self) -> TokenAmount;
    /// Returns the method number to be called.
    fn method_num(&self) -> MethodNum;
    /// Returns the encoded parameters for the method call.
    fn params(&self) -> &RawBytes;
    /// Returns the gas limit for the message.
    fn gas_limit(&self) -> u64;
    /// Returns the price paid per unit of gas.
    fn gas_fee_cap(&self) -> TokenAmount;
    /// Returns the funds a sender must hold for the message to be applied:
    /// `value + gas_limit * gas_fee_cap`.
    fn required_funds(&self) -> TokenAmount {
        &self.gas_fee_cap() * self.gas_limit() + &self.value()
    }
}

impl Message for ShimMessage {
    fn from(&self) -> Address {
        self.from
    }
    fn to(&self) -> Address {
        self.to
    }
    fn sequence(&self) -> u64 {
        self.sequence
    }
    fn value(&self) -> TokenAmount {
        self.value.clone()
    }
    fn method_num(&self) -> MethodNum {
        self.method_num
    }
    fn params(&self) -> &RawBytes {
        &self.params
    }
    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }
    fn gas_fee_cap(&self) -> TokenAmount {
        self.gas_fee_cap.clone()
    }
}

/// Content identifier of an unsigned message.
pub fn message_cid(message: &ShimMessage) -> anyhow::Result<Cid> {
    Cid::from_cbor_blake2b256(message)
}
