// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::message::SignedMessage;
use crate::shim::executor::Receipt;
use crate::utils::encoding::CidCborExt as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;

use super::{CachingBlockHeader, Ticket};

/// A complete block: the header, the messages it carries and the receipts its
/// miner declares for them.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub header: CachingBlockHeader,
    pub messages: Vec<SignedMessage>,
    pub receipts: Vec<Receipt>,
}

impl std::hash::Hash for Block {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(self.cid(), state)
    }
}

impl Block {
    pub fn header(&self) -> &CachingBlockHeader {
        &self.header
    }
    pub fn messages(&self) -> &[SignedMessage] {
        &self.messages
    }
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }
    /// Returns block header's CID.
    pub fn cid(&self) -> &Cid {
        self.header.cid()
    }
    pub fn election_ticket(&self) -> Option<&Ticket> {
        self.header.election_ticket()
    }

    /// Persists the header, messages and receipts in the given block store.
    pub fn persist(&self, db: &impl Blockstore) -> anyhow::Result<()> {
        let (cid, data) = self.header.car_block()?;
        db.put_keyed(&cid, &data)?;
        for (cid, data) in [
            encode(&self.messages, messages_root)?,
            encode(&self.receipts, receipts_root)?,
        ] {
            db.put_keyed(&cid, &data)?;
        }
        Ok(())
    }
}

fn encode<T: serde::Serialize>(
    items: &[T],
    root: fn(&[T]) -> anyhow::Result<Cid>,
) -> anyhow::Result<(Cid, Vec<u8>)> {
    Ok((root(items)?, fvm_ipld_encoding::to_vec(items)?))
}

/// CID of the CBOR list of messages, as committed to in a block header.
pub fn messages_root(messages: &[SignedMessage]) -> anyhow::Result<Cid> {
    Cid::from_cbor_blake2b256(&messages)
}

/// CID of the CBOR list of receipts, as committed to in a block header.
pub fn receipts_root(receipts: &[Receipt]) -> anyhow::Result<Cid> {
    Cid::from_cbor_blake2b256(&receipts)
}
