// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::VRFProof;
use fvm_ipld_encoding::tuple::*;

/// Length in bytes of a well-formed ticket, a recoverable secp256k1 signature.
pub const TICKET_BYTES: usize = 65;

/// A Ticket is a marker of a tick of the blockchain's clock. It is the source
/// of randomness for leader election and the tie-breaker between tipsets of
/// equal weight. It is generated by the miner of a block by signing the
/// election proof with the miner's key.
///
/// Tickets order lexicographically by their bytes, which for tickets of equal
/// length is the big-endian unsigned integer order used by sortition.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Default,
    Serialize_tuple,
    Deserialize_tuple,
    Hash,
    PartialOrd,
    Ord,
)]
pub struct Ticket {
    pub vrfproof: VRFProof,
}

impl Ticket {
    pub fn new(vrfproof: VRFProof) -> Self {
        Self { vrfproof }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.vrfproof.as_bytes()
    }

    pub fn is_well_formed(&self) -> bool {
        self.as_bytes().len() == TICKET_BYTES
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Ticket {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let bytes = (0..TICKET_BYTES).map(|_| u8::arbitrary(g)).collect();
        Self::new(VRFProof::new(bytes))
    }
}
