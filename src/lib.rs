// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Expected Consensus state transition for Filecoin style chains.
//!
//! The entry point is [`fil_cns::ExpectedConsensus`], which validates a
//! candidate tipset against its parent, applies its messages and returns the
//! resulting state tree. The remaining modules provide the chain data types,
//! the layered state tree and the message interpreter it builds on.

pub mod actors;
pub mod blocks;
pub mod chain;
pub mod cli_shared;
pub mod db;
pub mod fil_cns;
pub mod genesis;
pub mod interpreter;
pub mod key_management;
pub mod message;
pub mod metrics;
pub mod shim;
pub mod state_tree;
#[cfg(test)]
mod test_utils;
pub mod utils;
