// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Expected Consensus: fork choice weight, leader election by ticket
//! sortition and the tipset state transition.

use std::sync::Arc;

use crate::blocks::{self, Block, Ticket, Tipset};
use crate::chain::{ChainWeight, WeightError};
use crate::db::StorageMap;
use crate::interpreter::MessageProcessor;
use crate::metrics::{HistogramTimerExt as _, KindLabel};
use crate::shim::{address::Address, error::ExitCode, message::MethodNum};
use crate::state_tree::StateTree;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

mod challenge;
pub mod metrics;
mod power;
mod query;
mod rewards;
mod tickets;
mod validation;
mod weight;

pub use self::challenge::create_challenge_seed;
pub use self::power::{PowerTableView, StatePowerTable};
pub use self::query::{preview, query};
pub use self::rewards::{BLOCK_REWARD, BLOCK_REWARD_FIL, BlockRewarder, DefaultRewarder};
pub use self::tickets::{
    TICKET_DOMAIN, TicketSigner, compare_ticket_power, create_ticket, is_winning_ticket,
};
pub use self::validation::{BlockValidator, DefaultBlockValidator};
pub use self::weight::{ECPRM, ECV, is_heavier, weight};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid base: {0}")]
    InvalidBase(String),
    #[error("block {block} of miner {miner} does not hold a winning ticket")]
    NotWinningTicket { block: Cid, miner: Address },
    #[error("state root mismatch for block {block}: declared {expected}, computed {computed}")]
    StateRootMismatch {
        block: Cid,
        expected: Cid,
        computed: Cid,
    },
    #[error("receipt count mismatch for block {block}: declared {declared}, computed {computed}")]
    ReceiptCountMismatch {
        block: Cid,
        declared: usize,
        computed: usize,
    },
    #[error("power lookup failed: {0:#}")]
    PowerLookup(anyhow::Error),
    #[error("invalid parent weight: {0}")]
    ParentWeight(#[from] WeightError),
    #[error("cannot order identical tipsets")]
    UnorderedTipsets,
    #[error("block processing failed: {0:#}")]
    BlockProcessing(anyhow::Error),
    #[error("tipset processing failed: {0:#}")]
    TipsetProcessing(anyhow::Error),
    #[error("state transition cancelled")]
    Cancelled,
    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the error is a verdict on the validity of the
    /// tipset, as opposed to a caller mistake, a local store failure or a
    /// cancellation.
    pub fn is_consensus_fault(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::UnorderedTipsets | Self::Store(_))
    }

    /// Metric label of the error kind.
    pub fn kind(&self) -> KindLabel {
        use self::metrics::values;
        match self {
            Self::InvalidBase(_) => values::INVALID_BASE,
            Self::NotWinningTicket { .. } => values::NOT_WINNING_TICKET,
            Self::StateRootMismatch { .. } => values::STATE_ROOT_MISMATCH,
            Self::ReceiptCountMismatch { .. } => values::RECEIPT_COUNT_MISMATCH,
            Self::PowerLookup(_) => values::POWER_LOOKUP,
            Self::ParentWeight(_) => values::PARENT_WEIGHT,
            Self::UnorderedTipsets => values::UNORDERED_TIPSETS,
            Self::BlockProcessing(_) => values::BLOCK_PROCESSING,
            Self::TipsetProcessing(_) => values::TIPSET_PROCESSING,
            Self::Cancelled => values::CANCELLED,
            Self::Store(_) => values::STORE,
        }
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// The Expected Consensus engine.
///
/// The engine holds no mutable state: every operation works on its own copy
/// of the state it is given, so distinct tipsets may be evaluated
/// concurrently. State is addressed by its root [`Cid`] in the backing
/// blockstore.
pub struct ExpectedConsensus<
    DB,
    M = crate::interpreter::DefaultProcessor,
    V = DefaultBlockValidator,
    P = StatePowerTable,
> {
    db: Arc<DB>,
    processor: M,
    validator: V,
    power_table: P,
    genesis_cid: Cid,
}

impl<DB, M, V, P> ExpectedConsensus<DB, M, V, P>
where
    DB: Blockstore,
    M: MessageProcessor,
    V: BlockValidator,
    P: PowerTableView,
{
    pub fn new(db: Arc<DB>, processor: M, validator: V, power_table: P, genesis_cid: Cid) -> Self {
        Self {
            db,
            processor,
            validator,
            power_table,
            genesis_cid,
        }
    }

    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    pub fn genesis_cid(&self) -> &Cid {
        &self.genesis_cid
    }

    pub fn validate_syntax(&self, block: &Block) -> Result<(), blocks::Error> {
        self.validator.validate_syntax(block)
    }

    pub fn validate_semantic(&self, child: &Block, parent: &Block) -> Result<(), blocks::Error> {
        self.validator.validate_semantic(child, parent)
    }

    /// Applies `tipset` on top of `parent_state` and returns the resulting
    /// state tree, loaded on the backing blockstore.
    ///
    /// `ancestors[0]` is the parent tipset. The transition either succeeds
    /// as a whole or fails without writing anything to the backing store:
    ///
    /// 1. every block must be well formed and derive from the parent;
    /// 2. every block must hold a winning ticket at `parent_state`;
    /// 3. every block is replayed on its own copy of `parent_state`, in
    ///    tipset order, and must reproduce its declared receipts count and
    ///    state root;
    /// 4. a single block tipset yields the state of step 3. Otherwise all
    ///    blocks are applied together on `parent_state` in ticket order.
    #[tracing::instrument(skip_all, fields(tipset = %tipset.key(), epoch = tipset.epoch()))]
    pub fn run_state_transition(
        &self,
        tipset: &Tipset,
        ancestors: &[Tipset],
        parent_state: &Cid,
        cancel: &CancellationToken,
    ) -> Result<StateTree<Arc<DB>>, Error> {
        let _timer = metrics::STATE_TRANSITION_TIME.start_timer();
        let res = self.state_transition(tipset, ancestors, parent_state, cancel);
        match &res {
            Ok(_) => debug!("state transition succeeded"),
            Err(e) => {
                metrics::STATE_TRANSITION_FAILURE
                    .get_or_create(&e.kind())
                    .inc();
                if e.is_consensus_fault() {
                    warn!("rejected tipset: {e}");
                } else {
                    debug!("state transition aborted: {e}");
                }
            }
        }
        res
    }

    fn state_transition(
        &self,
        tipset: &Tipset,
        ancestors: &[Tipset],
        parent_state: &Cid,
        cancel: &CancellationToken,
    ) -> Result<StateTree<Arc<DB>>, Error> {
        ensure_not_cancelled(cancel)?;
        let parent = ancestors.first().ok_or_else(|| {
            Error::InvalidBase(format!("no ancestors given for tipset {}", tipset.key()))
        })?;
        self.validate_blocks(tipset, parent.min_ticket_block())?;

        // Every write of the transition stays in the storage map until the
        // end.
        let vms = StorageMap::new(self.db.clone());
        let mut state = StateTree::new_from_root(&vms, parent_state).map_err(Error::Store)?;

        ensure_not_cancelled(cancel)?;
        self.validate_mining(tipset, &state)?;

        let root = self.run_messages(&mut state, tipset, ancestors, cancel)?;

        ensure_not_cancelled(cancel)?;
        let written = vms.flush().map_err(Error::Store)?;
        debug!(%root, written, "persisted state transition");
        StateTree::new_from_root(self.db.clone(), &root).map_err(Error::Store)
    }

    fn validate_blocks(&self, tipset: &Tipset, ancestor: &Block) -> Result<(), Error> {
        for block in tipset.blocks() {
            self.validator
                .validate_syntax(block)
                .map_err(|e| Error::InvalidBase(format!("block {}: {e}", block.cid())))?;
            self.validator
                .validate_semantic(block, ancestor)
                .map_err(|e| Error::InvalidBase(format!("block {}: {e}", block.cid())))?;
        }
        Ok(())
    }

    fn validate_mining<S: Blockstore>(
        &self,
        tipset: &Tipset,
        state: &StateTree<S>,
    ) -> Result<(), Error> {
        for block in tipset.blocks() {
            let miner = block.header().miner_address;
            let ticket = block.election_ticket().ok_or_else(|| {
                Error::InvalidBase(format!("block {} has no ticket", block.cid()))
            })?;
            let won = is_winning_ticket(&self.power_table, state, ticket, &miner)
                .map_err(Error::PowerLookup)?;
            if !won {
                return Err(Error::NotWinningTicket {
                    block: *block.cid(),
                    miner,
                });
            }
        }
        Ok(())
    }

    fn run_messages<S: Blockstore + Clone>(
        &self,
        state: &mut StateTree<S>,
        tipset: &Tipset,
        ancestors: &[Tipset],
        cancel: &CancellationToken,
    ) -> Result<Cid, Error> {
        let mut block_roots = Vec::with_capacity(tipset.len());
        for block in tipset.blocks() {
            ensure_not_cancelled(cancel)?;
            let header = block.header();

            // A private copy, so that blocks cannot observe each other.
            let mut block_state = state.checkout().map_err(Error::Store)?;
            let receipts = self
                .processor
                .process_block(&mut block_state, block, ancestors)
                .map_err(Error::BlockProcessing)?;
            if receipts.len() != block.receipts().len() {
                return Err(Error::ReceiptCountMismatch {
                    block: *block.cid(),
                    declared: block.receipts().len(),
                    computed: receipts.len(),
                });
            }
            let computed = block_state.flush().map_err(Error::Store)?;
            if computed != header.state_root {
                return Err(Error::StateRootMismatch {
                    block: *block.cid(),
                    expected: header.state_root,
                    computed,
                });
            }
            block_roots.push(computed);
        }

        if let [root] = block_roots.as_slice() {
            return Ok(*root);
        }

        ensure_not_cancelled(cancel)?;
        let results = self
            .processor
            .process_tipset(state, tipset, ancestors)
            .map_err(Error::TipsetProcessing)?;
        let failed = results
            .iter()
            .filter(|r| r.receipt.exit_code != ExitCode::OK)
            .count();
        debug!(messages = results.len(), failed, "applied tipset messages");
        state.flush().map_err(Error::Store)
    }

    fn load_state(&self, root: &Cid) -> Result<StateTree<Arc<DB>>, Error> {
        StateTree::new_from_root(self.db.clone(), root).map_err(Error::Store)
    }

    /// Weight of `tipset` given the state root of its parent.
    pub fn weight(&self, tipset: &Tipset, parent_state: &Cid) -> Result<ChainWeight, Error> {
        let state = self.load_state(parent_state)?;
        weight(&self.power_table, &self.genesis_cid, tipset, &state)
    }

    /// Returns `true` if `a` is heavier than `b`. See [`is_heavier`].
    pub fn is_heavier(
        &self,
        a: &Tipset,
        b: &Tipset,
        a_state: &Cid,
        b_state: &Cid,
    ) -> Result<bool, Error> {
        let a_tree = self.load_state(a_state)?;
        let b_tree = self.load_state(b_state)?;
        is_heavier(
            &self.power_table,
            &self.genesis_cid,
            a,
            b,
            &a_tree,
            &b_tree,
        )
    }

    pub fn is_winning_ticket(
        &self,
        state: &Cid,
        ticket: &Ticket,
        miner: &Address,
    ) -> Result<bool, Error> {
        let tree = self.load_state(state)?;
        is_winning_ticket(&self.power_table, &tree, ticket, miner).map_err(Error::PowerLookup)
    }

    pub fn create_challenge_seed(&self, parents: &Tipset, null_block_count: u64) -> [u8; 32] {
        create_challenge_seed(parents, null_block_count)
    }

    /// Runs a read-only call against `state`. See [`query`].
    pub fn query(
        &self,
        state: &Cid,
        from: &Address,
        to: &Address,
        method: MethodNum,
        params: &RawBytes,
    ) -> anyhow::Result<(RawBytes, ExitCode)> {
        let store = StorageMap::new(self.db.clone());
        let mut tree = StateTree::new_from_root(&store, state)?;
        query(&mut tree, from, to, method, params)
    }

    /// Estimates the gas of a call against `state`. See [`preview`].
    pub fn preview(
        &self,
        state: &Cid,
        from: &Address,
        to: &Address,
        method: MethodNum,
        params: &RawBytes,
    ) -> anyhow::Result<u64> {
        let store = StorageMap::new(self.db.clone());
        let mut tree = StateTree::new_from_root(&store, state)?;
        preview(&mut tree, from, to, method, params)
    }
}

impl<DB, M, V, P> ExpectedConsensus<DB, M, V, P>
where
    DB: Blockstore + Send + Sync + 'static,
    M: MessageProcessor + Send + Sync + 'static,
    V: BlockValidator + Send + Sync + 'static,
    P: PowerTableView + Send + Sync + 'static,
{
    /// Runs [`ExpectedConsensus::run_state_transition`] on the blocking
    /// thread pool.
    pub async fn run_state_transition_async(
        self: Arc<Self>,
        tipset: Tipset,
        ancestors: Vec<Tipset>,
        parent_state: Cid,
        cancel: CancellationToken,
    ) -> Result<StateTree<Arc<DB>>, Error> {
        let token = cancel.clone();
        tokio::task::spawn_blocking(move || {
            self.run_state_transition(&tipset, &ancestors, &parent_state, &cancel)
        })
        .await
        .map_err(|e| {
            if token.is_cancelled() {
                Error::Cancelled
            } else {
                Error::Store(e.into())
            }
        })?
    }
}
