// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blake2b_simd::Params;
use cid::Cid;
use multihash_codetable::{Code, MultihashDigest as _};
use serde::Serialize;

/// Hashes the input with 256 bit BLAKE2b.
pub fn blake2b_256(ingest: &[u8]) -> [u8; 32] {
    let digest = Params::new()
        .hash_length(32)
        .to_state()
        .update(ingest)
        .finalize();

    let mut ret = [0u8; 32];
    ret.clone_from_slice(digest.as_bytes());
    ret
}

/// Extension methods for constructing `dag-cbor` [`Cid`]
pub trait CidCborExt {
    /// Default CID builder for Filecoin
    ///
    /// - The default codec is [`fvm_ipld_encoding::DAG_CBOR`]
    /// - The default hash function is 256 bit BLAKE2b
    ///
    /// This matches [`abi.CidBuilder`](https://github.com/filecoin-project/go-state-types/blob/master/abi/cid.go#L49) in go
    fn from_cbor_blake2b256<S: Serialize>(obj: &S) -> anyhow::Result<Cid> {
        let bytes = fvm_ipld_encoding::to_vec(obj)?;
        Ok(Cid::new_v1(
            fvm_ipld_encoding::DAG_CBOR,
            Code::Blake2b256.digest(&bytes),
        ))
    }
}

impl CidCborExt for Cid {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_256_known_vector() {
        // BLAKE2b-256 of the empty string
        assert_eq!(
            hex::encode(blake2b_256(&[])),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn cbor_cid_is_deterministic() {
        let a = Cid::from_cbor_blake2b256(&(1u64, "forest")).unwrap();
        let b = Cid::from_cbor_blake2b256(&(1u64, "forest")).unwrap();
        let c = Cid::from_cbor_blake2b256(&(2u64, "forest")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.codec(), fvm_ipld_encoding::DAG_CBOR);
    }
}
