// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cmp::Ordering;
use std::fmt;

use super::{Block, Error, Ticket};
use crate::chain::ChainWeight;
use crate::shim::clock::ChainEpoch;
use ahash::HashSet;
use cid::Cid;
use itertools::Itertools as _;
use nunny::Vec as NonEmpty;
use serde::{Deserialize, Serialize};

/// A set of CIDs forming a unique key for a tipset.
///
/// Equal sets produce equal keys: the CIDs are deduplicated and kept in
/// ascending byte order, which is not the canonical (ticket) iteration order
/// of the blocks of a tipset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Cid>", into = "Vec<Cid>")]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    pub fn new(cids: impl IntoIterator<Item = Cid>) -> Self {
        let mut cids = cids.into_iter().collect_vec();
        cids.sort_by_cached_key(|cid| cid.to_bytes());
        cids.dedup();
        Self(cids)
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }

    pub fn into_cids(self) -> Vec<Cid> {
        self.0
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.0.contains(cid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Cid>> for TipsetKey {
    fn from(value: Vec<Cid>) -> Self {
        Self::new(value)
    }
}

impl From<NonEmpty<Cid>> for TipsetKey {
    fn from(value: NonEmpty<Cid>) -> Self {
        Self::new(value)
    }
}

impl From<TipsetKey> for Vec<Cid> {
    fn from(value: TipsetKey) -> Self {
        value.0
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for cid in &self.0 {
            write!(f, " {cid}")?;
        }
        f.write_str(" }")
    }
}

/// An immutable set of blocks mined at the same epoch on top of the same
/// parents.
///
/// The blocks keep the order they were given in. The canonical order used for
/// message application is ascending by election ticket, with ties broken by
/// block CID bytes.
#[derive(Clone, Debug)]
pub struct Tipset {
    blocks: NonEmpty<Block>,
    /// Indices into `blocks` in canonical order.
    ticket_order: Vec<usize>,
    min_ticket: Ticket,
    key: TipsetKey,
}

impl PartialEq for Tipset {
    fn eq(&self, other: &Self) -> bool {
        self.key.eq(&other.key)
    }
}

impl Eq for Tipset {}

fn ticket_cmp(a: &Block, b: &Block) -> Ordering {
    a.election_ticket()
        .cmp(&b.election_ticket())
        .then_with(|| a.cid().to_bytes().cmp(&b.cid().to_bytes()))
}

impl Tipset {
    /// Builds a new tipset from a collection of blocks.
    /// The blocks must be distinct (different CIDs), carry at least one
    /// ticket, and agree on epoch, parents and parent weight.
    pub fn new(blocks: impl IntoIterator<Item = Block>) -> Result<Self, Error> {
        let blocks: NonEmpty<Block> = blocks
            .into_iter()
            .collect_vec()
            .try_into()
            .map_err(|_| Error::NoBlocks)?;

        let first = blocks.first();
        let mut seen = HashSet::default();
        for block in blocks.iter() {
            if block.header.parents != first.header.parents {
                return Err(Error::InvalidTipset(
                    "parent cids are not equal".to_string(),
                ));
            }
            if block.header.epoch != first.header.epoch {
                return Err(Error::InvalidTipset("epochs are not equal".to_string()));
            }
            if block.header.weight != first.header.weight {
                return Err(Error::InvalidTipset(
                    "parent weights are not equal".to_string(),
                ));
            }
            if block.election_ticket().is_none() {
                return Err(Error::InvalidTipset(format!(
                    "block {} has no ticket",
                    block.cid()
                )));
            }
            if !seen.insert(*block.cid()) {
                return Err(Error::InvalidTipset(format!(
                    "duplicate block {}",
                    block.cid()
                )));
            }
        }

        let ticket_order = blocks
            .iter()
            .enumerate()
            .sorted_by(|(_, a), (_, b)| ticket_cmp(a, b))
            .map(|(i, _)| i)
            .collect_vec();
        let min_ticket = ticket_order
            .first()
            .and_then(|&i| blocks.get(i))
            .and_then(Block::election_ticket)
            .cloned()
            .ok_or(Error::NoBlocks)?;
        let key = TipsetKey::new(blocks.iter().map(|b| *b.cid()));

        Ok(Self {
            blocks,
            ticket_order,
            min_ticket,
            key,
        })
    }

    /// Blocks in the order the tipset was constructed with.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks in ascending election ticket order.
    pub fn blocks_by_ticket(&self) -> Vec<&Block> {
        self.ticket_order
            .iter()
            .filter_map(|&i| self.blocks.get(i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.blocks().len()
    }

    /// Always `false`; present for symmetry with [`Tipset::len`].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The smallest election ticket among the blocks.
    pub fn min_ticket(&self) -> &Ticket {
        &self.min_ticket
    }

    /// The block holding the smallest ticket, the canonical representative of
    /// the tipset.
    pub fn min_ticket_block(&self) -> &Block {
        self.blocks_by_ticket()
            .first()
            .copied()
            .unwrap_or_else(|| self.blocks.first())
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.blocks.first().header.epoch
    }

    pub fn parents(&self) -> &TipsetKey {
        &self.blocks.first().header.parents
    }

    pub fn parent_weight(&self) -> ChainWeight {
        self.blocks.first().header.weight
    }

    pub fn key(&self) -> &TipsetKey {
        &self.key
    }

    pub fn cids(&self) -> &[Cid] {
        self.key.cids()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.key.contains(cid)
    }
}

impl fmt::Display for Tipset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key, f)
    }
}
