// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::RwLock;
use tracing::trace;

/// A write buffer over a backing blockstore.
///
/// Reads fall through to the backing store, writes stay in memory until
/// [`StorageMap::flush`] is called. Dropping the map discards every buffered
/// write, leaving the backing store untouched.
#[derive(Debug)]
pub struct StorageMap<DB> {
    backing: DB,
    buffer: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl<DB: Blockstore> StorageMap<DB> {
    pub fn new(backing: DB) -> Self {
        Self {
            backing,
            buffer: Default::default(),
        }
    }

    pub fn backing(&self) -> &DB {
        &self.backing
    }

    /// Number of buffered, not yet flushed, blocks.
    pub fn pending(&self) -> usize {
        self.buffer.read().len()
    }

    /// Writes every buffered block to the backing store and empties the
    /// buffer. Returns the number of blocks written.
    pub fn flush(&self) -> anyhow::Result<usize> {
        let blocks = std::mem::take(&mut *self.buffer.write());
        let count = blocks.len();
        self.backing.put_many_keyed(blocks)?;
        trace!("flushed {count} blocks from storage map");
        Ok(count)
    }
}

impl<DB: Blockstore> Blockstore for StorageMap<DB> {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        if let Some(data) = self.buffer.read().get(k) {
            return Ok(Some(data.clone()));
        }
        self.backing.get(k)
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.buffer.write().insert(*k, block.to_vec());
        Ok(())
    }

    fn has(&self, k: &Cid) -> anyhow::Result<bool> {
        if self.buffer.read().contains_key(k) {
            return Ok(true);
        }
        self.backing.has(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::utils::db::CborStoreExt as _;
    use fvm_ipld_encoding::CborStore as _;

    #[test]
    fn writes_are_buffered_until_flush() {
        let db = MemoryDB::default();
        let existing = db.put_cbor_default(&1_u64).unwrap();

        let map = StorageMap::new(&db);
        assert_eq!(map.get_cbor::<u64>(&existing).unwrap(), Some(1));

        let cid = map.put_cbor_default(&2_u64).unwrap();
        assert!(map.has(&cid).unwrap());
        assert!(!db.has(&cid).unwrap());
        assert_eq!(map.pending(), 1);

        assert_eq!(map.flush().unwrap(), 1);
        assert_eq!(map.pending(), 0);
        assert_eq!(db.get_cbor::<u64>(&cid).unwrap(), Some(2));
    }

    #[test]
    fn dropping_discards_writes() {
        let db = MemoryDB::default();
        {
            let map = StorageMap::new(&db);
            map.put_cbor_default(&"discarded").unwrap();
        }
        assert!(db.is_empty());
    }
}
