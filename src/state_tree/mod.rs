// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Content-addressed map from actor address to [`ActorState`].
//!
//! Mutations are staged in a stack of snapshot layers. A layer is opened with
//! [`StateTree::snapshot`], discarded with [`StateTree::revert_to_snapshot`]
//! and merged into the layer below with [`StateTree::clear_snapshot`]. Only a
//! tree with no open snapshot can be flushed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::actors::account;
use crate::shim::{address::Address, econ::TokenAmount};
use crate::utils::db::CborStoreExt as _;
use ahash::HashMap;
use anyhow::{Context as _, bail, ensure};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::CborStore as _;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::Hamt;
use fvm_shared4::HAMT_BIT_WIDTH;
use num_traits::Zero as _;

/// Version tag written into every persisted state root.
pub const STATE_TREE_VERSION: u64 = 1;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// State of an actor as stored in the state tree.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct ActorState {
    /// Link to code for the actor.
    pub code: Cid,
    /// Link to the state of the actor.
    pub state: Cid,
    /// Sequence of the actor.
    pub sequence: u64,
    /// Tokens available to the actor.
    pub balance: TokenAmount,
}

impl ActorState {
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }

    /// An actor with the given code, no state, zero balance and sequence.
    pub fn new_empty(code: Cid, state: Cid) -> Self {
        Self::new(code, state, TokenAmount::zero(), 0)
    }

    pub fn deduct_funds(&mut self, amt: &TokenAmount) -> anyhow::Result<()> {
        ensure!(
            &self.balance >= amt,
            "not enough funds: have {}, need {}",
            self.balance,
            amt
        );
        self.balance = &self.balance - amt;
        Ok(())
    }

    pub fn deposit_funds(&mut self, amt: &TokenAmount) {
        self.balance = &self.balance + amt;
    }
}

/// Persisted form of a state tree.
#[derive(Serialize_tuple, Deserialize_tuple)]
struct StateRoot {
    version: u64,
    /// Root of the HAMT of actors keyed by address bytes
    actors: Cid,
}

/// Collection of state snapshots
#[derive(Debug)]
struct StateSnapshots {
    layers: Vec<StateSnapLayer>,
}

/// State snap shot layer
#[derive(Debug, Default)]
struct StateSnapLayer {
    actors: HashMap<Address, Option<ActorState>>,
}

impl StateSnapshots {
    fn new() -> Self {
        Self {
            layers: vec![StateSnapLayer::default()],
        }
    }

    fn add_layer(&mut self) {
        self.layers.push(StateSnapLayer::default())
    }

    fn drop_layer(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.layers.len() > 1,
            "no snapshot layer to drop, only the base layer is present"
        );
        self.layers.pop();
        Ok(())
    }

    fn merge_last_layer(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.layers.len() > 1,
            "no snapshot layer to merge, only the base layer is present"
        );
        let last = self.layers.pop().context("snapshot stack is empty")?;
        self.layers
            .last_mut()
            .context("snapshot stack is empty")?
            .actors
            .extend(last.actors);
        Ok(())
    }

    fn get_actor(&self, addr: &Address) -> Option<Option<ActorState>> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.actors.get(addr).cloned())
    }

    fn set_actor(&mut self, addr: Address, actor: Option<ActorState>) -> anyhow::Result<()> {
        self.layers
            .last_mut()
            .context("snapshot stack is empty")?
            .actors
            .insert(addr, actor);
        Ok(())
    }
}

/// State tree implementation over a [`Blockstore`]. This structure is not
/// thread-safe; concurrent users each work on their own tree or checkout.
pub struct StateTree<S> {
    /// Actors as of the last load or flush
    hamt: Hamt<S, ActorState>,
    snaps: StateSnapshots,
    generation: u64,
}

impl<S> fmt::Debug for StateTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTree")
            .field("snaps", &self.snaps)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<S> StateTree<S>
where
    S: Blockstore,
{
    /// An empty state tree.
    pub fn new(store: S) -> Self {
        Self {
            hamt: Hamt::new_with_bit_width(store, HAMT_BIT_WIDTH),
            snaps: StateSnapshots::new(),
            generation: next_generation(),
        }
    }

    /// Loads the state tree persisted at `root`.
    pub fn new_from_root(store: S, root: &Cid) -> anyhow::Result<Self> {
        let StateRoot { version, actors } = store
            .get_cbor(root)?
            .with_context(|| format!("state root {root} not found in store"))?;
        ensure!(
            version == STATE_TREE_VERSION,
            "unsupported state tree version {version}"
        );
        let hamt = Hamt::load_with_bit_width(&actors, store, HAMT_BIT_WIDTH)
            .with_context(|| format!("failed to load actors HAMT {actors}"))?;
        Ok(Self {
            hamt,
            snaps: StateSnapshots::new(),
            generation: next_generation(),
        })
    }

    /// Retrieve store reference to modify db.
    pub fn store(&self) -> &S {
        self.hamt.store()
    }

    /// Identifier of this copy of the tree. Every tree and every checkout
    /// gets a distinct generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of open snapshot layers above the base layer.
    pub fn snapshot_depth(&self) -> usize {
        self.snaps.layers.len() - 1
    }

    /// Get actor state from an address.
    pub fn get_actor(&self, addr: &Address) -> anyhow::Result<Option<ActorState>> {
        if let Some(cached) = self.snaps.get_actor(addr) {
            return Ok(cached);
        }
        Ok(self.hamt.get(&addr.to_bytes())?.cloned())
    }

    /// Like [`StateTree::get_actor`] but errors when the actor is missing.
    pub fn get_required_actor(&self, addr: &Address) -> anyhow::Result<ActorState> {
        self.get_actor(addr)?
            .with_context(|| format!("Actor for address: {addr} does not exist"))
    }

    /// Set actor state for an address.
    pub fn set_actor(&mut self, addr: &Address, actor: ActorState) -> anyhow::Result<()> {
        self.snaps.set_actor(*addr, Some(actor))
    }

    /// Delete actor for an address.
    pub fn delete_actor(&mut self, addr: &Address) -> anyhow::Result<()> {
        self.snaps.set_actor(*addr, None)
    }

    /// Mutate and set actor state for an Address.
    pub fn mutate_actor<F>(&mut self, addr: &Address, mutate: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut ActorState) -> anyhow::Result<()>,
    {
        let mut act = self.get_required_actor(addr)?;
        mutate(&mut act)?;
        self.set_actor(addr, act)
    }

    /// Returns the actor at `addr`, creating an empty account actor there if
    /// none exists.
    pub fn get_or_create_account(&mut self, addr: &Address) -> anyhow::Result<ActorState> {
        if let Some(actor) = self.get_actor(addr)? {
            return Ok(actor);
        }
        let actor = account::new_empty_actor(self.store())?;
        self.set_actor(addr, actor.clone())?;
        Ok(actor)
    }

    /// Moves `amount` from `from` to `to` inside its own snapshot layer,
    /// creating `to` as an empty account actor if needed. Either the whole
    /// transfer is applied or nothing is.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &TokenAmount,
    ) -> anyhow::Result<()> {
        ensure!(
            *amount >= TokenAmount::zero(),
            "attempted to transfer negative value {amount}"
        );
        self.snapshot()?;
        let res = self.transfer_inner(from, to, amount);
        if res.is_err() {
            self.revert_to_snapshot()?;
        }
        self.clear_snapshot()?;
        res
    }

    fn transfer_inner(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &TokenAmount,
    ) -> anyhow::Result<()> {
        self.get_or_create_account(to)?;
        if from == to {
            return Ok(());
        }
        self.mutate_actor(from, |act| act.deduct_funds(amount))
            .with_context(|| format!("transfer from {from} failed"))?;
        self.mutate_actor(to, |act| {
            act.deposit_funds(amount);
            Ok(())
        })
    }

    /// Add snapshot layer to stack.
    pub fn snapshot(&mut self) -> anyhow::Result<()> {
        self.snaps.add_layer();
        Ok(())
    }

    /// Merges last two snap shot layers.
    pub fn clear_snapshot(&mut self) -> anyhow::Result<()> {
        self.snaps.merge_last_layer()
    }

    /// Revert state cache by discarding the contents of the last snapshot
    /// layer. The layer itself stays open and must still be cleared.
    pub fn revert_to_snapshot(&mut self) -> anyhow::Result<()> {
        self.snaps.drop_layer()?;
        self.snaps.add_layer();
        Ok(())
    }

    /// Flush state tree and return Cid root.
    pub fn flush(&mut self) -> anyhow::Result<Cid> {
        if self.snaps.layers.len() != 1 {
            bail!(
                "tried to flush state tree with snapshots on the stack: {:?}",
                self.snaps.layers.len()
            );
        }

        let base = std::mem::take(&mut self.snaps.layers[0].actors);
        for (addr, sto) in base {
            match sto {
                None => {
                    self.hamt.delete(&addr.to_bytes())?;
                }
                Some(state) => {
                    self.hamt.set(addr.to_bytes().into(), state)?;
                }
            }
        }

        let root = StateRoot {
            version: STATE_TREE_VERSION,
            actors: self.hamt.flush()?,
        };
        self.store().put_cbor_default(&root)
    }

    /// Flushes the tree and loads a private copy of the flushed state. The
    /// copy shares nothing mutable with `self` and carries a new generation.
    pub fn checkout(&mut self) -> anyhow::Result<StateTree<S>>
    where
        S: Clone,
    {
        let root = self.flush()?;
        StateTree::new_from_root(self.store().clone(), &root)
    }
}
