// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actors::{
    POWER_ACTOR_ADDR, POWER_ACTOR_CODE_ID, REWARD_ACTOR_ADDR, REWARD_ACTOR_CODE_ID,
    SYSTEM_ACTOR_ADDR, SYSTEM_ACTOR_CODE_ID, account, power,
};
use crate::blocks::{
    Block, CachingBlockHeader, ElectionProof, RawBlockHeader, TICKET_BYTES, Ticket, TipsetKey,
    VRFProof, messages_root, receipts_root,
};
use crate::chain::ChainWeight;
use crate::shim::{address::Address, econ::TokenAmount, sector::StoragePower};
use crate::state_tree::{ActorState, StateTree};
use crate::utils::db::CborStoreExt as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use smart_default::SmartDefault;
use tracing::info;

/// Initial balance of the network account paying block rewards, in FIL.
pub const DEFAULT_NETWORK_BALANCE_FIL: u64 = 1_000_000_000;

/// Builds the initial state of a chain and its genesis block.
#[derive(Debug, Clone, SmartDefault)]
pub struct GenesisBuilder {
    #[default(TokenAmount::from_whole(DEFAULT_NETWORK_BALANCE_FIL))]
    network_balance: TokenAmount,
    accounts: Vec<(Address, TokenAmount)>,
    /// `(miner, owner, power)`
    miners: Vec<(Address, Address, StoragePower)>,
    timestamp: u64,
}

impl GenesisBuilder {
    pub fn with_network_balance(mut self, balance: TokenAmount) -> Self {
        self.network_balance = balance;
        self
    }

    pub fn with_account(mut self, addr: Address, balance: TokenAmount) -> Self {
        self.accounts.push((addr, balance));
        self
    }

    /// Registers a power claim for `miner`. Its `owner` is created as an
    /// empty account unless it is also added with [`GenesisBuilder::with_account`].
    pub fn with_miner(mut self, miner: Address, owner: Address, power: StoragePower) -> Self {
        self.miners.push((miner, owner, power));
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Writes the genesis state into `store` and returns its root along with
    /// the flushed tree.
    pub fn build_state<S: Blockstore>(&self, store: S) -> anyhow::Result<(Cid, StateTree<S>)> {
        let mut tree = StateTree::new(store);
        let empty = tree.store().put_cbor_default(&())?;

        tree.set_actor(
            &SYSTEM_ACTOR_ADDR,
            ActorState::new_empty(*SYSTEM_ACTOR_CODE_ID, empty),
        )?;
        tree.set_actor(
            &REWARD_ACTOR_ADDR,
            ActorState::new(*REWARD_ACTOR_CODE_ID, empty, self.network_balance.clone(), 0),
        )?;

        let mut power_state = power::State::new(tree.store())?;
        for (miner, owner, power) in &self.miners {
            power_state.set_claim(tree.store(), miner, *owner, power.clone())?;
        }
        let power_head = power_state.save(tree.store())?;
        tree.set_actor(
            &POWER_ACTOR_ADDR,
            ActorState::new_empty(*POWER_ACTOR_CODE_ID, power_head),
        )?;

        for (addr, balance) in &self.accounts {
            let mut actor = account::new_empty_actor(tree.store())?;
            actor.balance = balance.clone();
            tree.set_actor(addr, actor)?;
        }
        for (_, owner, _) in &self.miners {
            tree.get_or_create_account(owner)?;
        }

        let root = tree.flush()?;
        Ok((root, tree))
    }

    /// Writes the genesis state and the genesis block into `store`.
    pub fn build<S: Blockstore>(&self, store: &S) -> anyhow::Result<Block> {
        let (state_root, _) = self.build_state(store)?;
        let header = RawBlockHeader {
            miner_address: SYSTEM_ACTOR_ADDR,
            tickets: vec![Ticket::new(VRFProof::new(vec![0; TICKET_BYTES]))],
            election_proof: Some(ElectionProof::default()),
            parents: TipsetKey::default(),
            weight: ChainWeight::ZERO,
            epoch: 0,
            state_root,
            message_receipts: receipts_root(&[])?,
            messages: messages_root(&[])?,
            timestamp: self.timestamp,
            signature: None,
        };
        let block = Block {
            header: CachingBlockHeader::new(header),
            messages: vec![],
            receipts: vec![],
        };
        block.persist(store)?;
        info!("Initialized genesis: {}", block.cid());
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::fil_cns::{PowerTableView as _, StatePowerTable};
    use fvm_ipld_encoding::CborStore as _;
    use num_traits::Zero as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_builtin_actors_and_accounts() {
        let alice = Address::new_id(100);
        let (miner, owner) = (Address::new_id(1000), Address::new_id(1001));
        let (root, tree) = GenesisBuilder::default()
            .with_account(alice, TokenAmount::from_atto(42))
            .with_miner(miner, owner, StoragePower::from(8))
            .build_state(MemoryDB::default())
            .unwrap();

        assert_eq!(
            tree.get_required_actor(&REWARD_ACTOR_ADDR).unwrap().balance,
            TokenAmount::from_whole(DEFAULT_NETWORK_BALANCE_FIL)
        );
        assert_eq!(
            tree.get_required_actor(&alice).unwrap().balance,
            TokenAmount::from_atto(42)
        );
        assert!(tree.get_required_actor(&owner).unwrap().balance.is_zero());
        assert_eq!(StatePowerTable.total(&tree).unwrap(), StoragePower::from(8));
        assert_eq!(power::miner_owner(&tree, &miner).unwrap(), owner);

        let reloaded = StateTree::new_from_root(tree.store(), &root).unwrap();
        assert!(reloaded.get_actor(&SYSTEM_ACTOR_ADDR).unwrap().is_some());
    }

    #[test]
    fn owners_listed_as_accounts_keep_their_balance() {
        let owner = Address::new_id(1001);
        let (_, tree) = GenesisBuilder::default()
            .with_account(owner, TokenAmount::from_atto(7))
            .with_miner(Address::new_id(1000), owner, StoragePower::from(1))
            .build_state(MemoryDB::default())
            .unwrap();
        assert_eq!(
            tree.get_required_actor(&owner).unwrap().balance,
            TokenAmount::from_atto(7)
        );
    }

    #[test]
    fn genesis_state_is_deterministic() {
        let builder = GenesisBuilder::default()
            .with_miner(Address::new_id(1000), Address::new_id(1001), StoragePower::from(1));
        let (a, _) = builder.build_state(MemoryDB::default()).unwrap();
        let (b, _) = builder.build_state(MemoryDB::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn genesis_block_is_persisted() {
        let db = MemoryDB::default();
        let block = GenesisBuilder::default()
            .with_timestamp(1_000)
            .build(&db)
            .unwrap();

        let header = block.header();
        assert_eq!(header.epoch, 0);
        assert!(header.parents.is_empty());
        assert_eq!(header.weight, ChainWeight::ZERO);
        assert_eq!(header.timestamp, 1_000);
        assert!(db.contains(&header.state_root));

        let stored: RawBlockHeader = db.get_cbor(block.cid()).unwrap().unwrap();
        assert_eq!(&stored, &**header);
    }
}
