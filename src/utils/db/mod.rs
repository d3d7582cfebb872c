// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use multihash_codetable::{Code, MultihashDigest as _};
use serde::Serialize;

/// Extension methods for inserting and retrieving IPLD data with CIDs
pub trait CborStoreExt: Blockstore + Sized {
    /// Default CID builder for Filecoin
    ///
    /// - The default codec is [`fvm_ipld_encoding::DAG_CBOR`]
    /// - The default hash function is 256 bit BLAKE2b
    fn default_cid(bytes: &[u8]) -> Cid {
        Cid::new_v1(fvm_ipld_encoding::DAG_CBOR, Code::Blake2b256.digest(bytes))
    }

    /// Puts the CBOR encoded object into the block store with the default CID
    /// builder and returns its CID.
    fn put_cbor_default<S: Serialize>(&self, obj: &S) -> anyhow::Result<Cid> {
        let bytes = fvm_ipld_encoding::to_vec(obj)?;
        let cid = Self::default_cid(&bytes);
        self.put_keyed(&cid, &bytes)?;
        Ok(cid)
    }
}

impl<T: Blockstore> CborStoreExt for T {}
