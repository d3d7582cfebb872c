// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::VRFProof;
use fvm_ipld_encoding::tuple::*;

/// Proof that a miner was eligible to produce a block in a round. The ticket
/// of the block is derived by signing this proof.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple, Hash)]
pub struct ElectionProof {
    pub win_count: i64,
    pub vrfproof: VRFProof,
}
