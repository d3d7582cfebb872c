// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{POWER_ACTOR_ADDR, POWER_ACTOR_CODE_ID};
use crate::shim::{address::Address, message::MethodNum, sector::StoragePower};
use crate::state_tree::{ActorState, StateTree};
use crate::utils::db::CborStoreExt as _;
use anyhow::{Context as _, ensure};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::CborStore as _;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared4::HAMT_BIT_WIDTH;
use fvm_shared4::bigint::bigint_ser;
use num_traits::{Signed as _, Zero as _};

type Map<'bs, BS, V> = Hamt<&'bs BS, V, BytesKey>;

/// Returns the total power of the network.
pub const TOTAL_POWER_METHOD: MethodNum = 2;
/// Returns the power of the miner given as CBOR encoded address parameter.
pub const MINER_POWER_METHOD: MethodNum = 3;

/// Power claimed by a miner, and the account its rewards are paid to.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub owner: Address,
    #[serde(with = "bigint_ser")]
    pub power: StoragePower,
}

/// Storage power actor state.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    #[serde(with = "bigint_ser")]
    pub total_power: StoragePower,
    /// Root of the HAMT of [`Claim`]s keyed by miner address bytes
    pub claims: Cid,
}

impl State {
    /// A power table with no claims.
    pub fn new<BS: Blockstore>(store: &BS) -> anyhow::Result<Self> {
        let claims = Map::<_, Claim>::new_with_bit_width(store, HAMT_BIT_WIDTH)
            .flush()
            .context("failed to create empty claims map")?;
        Ok(Self {
            total_power: StoragePower::zero(),
            claims,
        })
    }

    pub fn load<BS: Blockstore>(store: &BS, actor: &ActorState) -> anyhow::Result<Self> {
        ensure!(
            actor.code == *POWER_ACTOR_CODE_ID,
            "actor code {} is not the power actor",
            actor.code
        );
        store
            .get_cbor(&actor.state)?
            .with_context(|| format!("power actor state {} not found", actor.state))
    }

    pub fn save<BS: Blockstore>(&self, store: &BS) -> anyhow::Result<Cid> {
        store.put_cbor_default(self)
    }

    fn load_claims<'bs, BS: Blockstore>(
        &self,
        store: &'bs BS,
    ) -> anyhow::Result<Map<'bs, BS, Claim>> {
        Map::load_with_bit_width(&self.claims, store, HAMT_BIT_WIDTH)
            .with_context(|| format!("failed to load claims map {}", self.claims))
    }

    /// Records a claim for `miner`, replacing any earlier claim, and keeps the
    /// total power in sync.
    pub fn set_claim<BS: Blockstore>(
        &mut self,
        store: &BS,
        miner: &Address,
        owner: Address,
        power: StoragePower,
    ) -> anyhow::Result<()> {
        ensure!(!power.is_negative(), "negative power claim for {miner}");
        let mut claims = self.load_claims(store)?;
        let total = &self.total_power + &power;
        let old = claims.set(miner.to_bytes().into(), Claim { owner, power })?;
        self.total_power = match old {
            Some(old) => total - old.power,
            None => total,
        };
        self.claims = claims.flush()?;
        Ok(())
    }

    pub fn claim<BS: Blockstore>(
        &self,
        store: &BS,
        miner: &Address,
    ) -> anyhow::Result<Option<Claim>> {
        Ok(self.load_claims(store)?.get(&miner.to_bytes())?.cloned())
    }

    pub fn miner_power<BS: Blockstore>(
        &self,
        store: &BS,
        miner: &Address,
    ) -> anyhow::Result<Option<StoragePower>> {
        Ok(self.claim(store, miner)?.map(|c| c.power))
    }
}

/// Loads the power actor state out of a state tree.
pub fn load_state<S: Blockstore>(tree: &StateTree<S>) -> anyhow::Result<State> {
    let actor = tree
        .get_actor(&POWER_ACTOR_ADDR)?
        .context("power actor not found in state tree")?;
    State::load(tree.store(), &actor)
}

/// Account receiving the rewards of `miner`.
pub fn miner_owner<S: Blockstore>(tree: &StateTree<S>, miner: &Address) -> anyhow::Result<Address> {
    load_state(tree)?
        .claim(tree.store(), miner)?
        .map(|c| c.owner)
        .with_context(|| format!("miner {miner} has no power claim"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;

    #[test]
    fn claims_keep_total_in_sync() {
        let db = MemoryDB::default();
        let mut st = State::new(&db).unwrap();
        let (m1, m2) = (Address::new_id(101), Address::new_id(102));
        st.set_claim(&db, &m1, Address::new_id(201), StoragePower::from(30))
            .unwrap();
        st.set_claim(&db, &m2, Address::new_id(202), StoragePower::from(10))
            .unwrap();
        assert_eq!(st.total_power, StoragePower::from(40));

        st.set_claim(&db, &m1, Address::new_id(201), StoragePower::from(5))
            .unwrap();
        assert_eq!(st.total_power, StoragePower::from(15));
        assert_eq!(
            st.miner_power(&db, &m1).unwrap(),
            Some(StoragePower::from(5))
        );
        assert_eq!(
            st.claim(&db, &m2).unwrap().unwrap().owner,
            Address::new_id(202)
        );
        assert!(st.claim(&db, &Address::new_id(103)).unwrap().is_none());
        assert!(
            st.set_claim(&db, &m1, m1, StoragePower::from(-1))
                .is_err()
        );
        assert_eq!(st.total_power, StoragePower::from(15));
    }

    #[test]
    fn claims_root_does_not_depend_on_insertion_order() {
        let db = MemoryDB::default();
        let claims: [(u64, i64); 3] = [(101, 30), (102, 10), (103, 5)];
        let mut forward = State::new(&db).unwrap();
        for (id, power) in claims {
            forward
                .set_claim(
                    &db,
                    &Address::new_id(id),
                    Address::new_id(id + 100),
                    StoragePower::from(power),
                )
                .unwrap();
        }
        let mut backward = State::new(&db).unwrap();
        for (id, power) in claims.into_iter().rev() {
            backward
                .set_claim(
                    &db,
                    &Address::new_id(id),
                    Address::new_id(id + 100),
                    StoragePower::from(power),
                )
                .unwrap();
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn state_round_trips_through_the_store() {
        let db = MemoryDB::default();
        let mut st = State::new(&db).unwrap();
        st.set_claim(
            &db,
            &Address::new_id(101),
            Address::new_id(201),
            StoragePower::from(7),
        )
        .unwrap();
        let head = st.save(&db).unwrap();
        let actor = ActorState::new_empty(*POWER_ACTOR_CODE_ID, head);
        assert_eq!(State::load(&db, &actor).unwrap(), st);

        let wrong_code = ActorState::new_empty(*super::super::ACCOUNT_ACTOR_CODE_ID, head);
        assert!(State::load(&db, &wrong_code).is_err());
    }
}
