// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cmp::Ordering;

use super::{Error, PowerTableView};
use crate::blocks::Tipset;
use crate::chain::ChainWeight;
use crate::state_tree::StateTree;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed as _;

/// Constant weight every block adds to its tipset.
pub const ECV: u64 = 10;
/// Magnitude of the power ratio every block adds to its tipset.
pub const ECPRM: u64 = 100;

/// Computes the weight of `tipset` given the state of its parent:
/// `parent_weight + sum(ECV + ECPRM * miner_power / total_power)` over its
/// blocks. The tipset made of the single genesis block weighs zero.
pub fn weight<S: Blockstore>(
    power_table: &impl PowerTableView,
    genesis_cid: &Cid,
    tipset: &Tipset,
    parent_state: &StateTree<S>,
) -> Result<ChainWeight, Error> {
    if tipset.len() == 1 && tipset.min_ticket_block().cid() == genesis_cid {
        return Ok(ChainWeight::ZERO);
    }

    let total = power_table
        .total(parent_state)
        .map_err(Error::PowerLookup)?;
    if !total.is_positive() {
        return Err(Error::PowerLookup(anyhow::anyhow!(
            "total power must be positive, got {total}"
        )));
    }

    let ecv = BigRational::from_integer(BigInt::from(ECV));
    let mut w = tipset.parent_weight().to_ratio();
    for block in tipset.blocks() {
        let miner_power = power_table
            .miner_power(parent_state, &block.header().miner_address)
            .map_err(Error::PowerLookup)?;
        w += &ecv + BigRational::new(miner_power * ECPRM, total.clone());
    }
    Ok(ChainWeight::try_from_ratio(&w)?)
}

/// Returns `true` if `a` is heavier than `b`. Equal weights are ordered by
/// smallest ticket (smaller wins), then by the string form of the tipset keys
/// (greater wins).
pub fn is_heavier<S1, S2>(
    power_table: &impl PowerTableView,
    genesis_cid: &Cid,
    a: &Tipset,
    b: &Tipset,
    a_state: &StateTree<S1>,
    b_state: &StateTree<S2>,
) -> Result<bool, Error>
where
    S1: Blockstore,
    S2: Blockstore,
{
    let a_weight = weight(power_table, genesis_cid, a, a_state)?;
    let b_weight = weight(power_table, genesis_cid, b, b_state)?;
    if a_weight != b_weight {
        return Ok(a_weight > b_weight);
    }

    match a.min_ticket().cmp(b.min_ticket()) {
        Ordering::Less => return Ok(true),
        Ordering::Greater => return Ok(false),
        Ordering::Equal => {}
    }

    match a.key().to_string().cmp(&b.key().to_string()) {
        Ordering::Equal => Err(Error::UnorderedTipsets),
        ord => Ok(ord == Ordering::Greater),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::genesis::GenesisBuilder;
    use crate::shim::{address::Address, sector::StoragePower};
    use crate::test_utils::{FixedPowerTable, construct_block, construct_ticket, mock_block};
    use pretty_assertions::assert_eq;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn power_state() -> StateTree<MemoryDB> {
        GenesisBuilder::default()
            .with_miner(Address::new_id(1), Address::new_id(101), StoragePower::from(1))
            .with_miner(Address::new_id(2), Address::new_id(102), StoragePower::from(2))
            .build_state(MemoryDB::default())
            .unwrap()
            .1
    }

    #[test]
    fn genesis_weighs_zero() {
        let genesis = Tipset::new([construct_block(1, construct_ticket(0x01))]).unwrap();
        let w = weight(
            &FixedPowerTable::default(),
            genesis.min_ticket_block().cid(),
            &genesis,
            &power_state(),
        )
        .unwrap();
        assert_eq!(w, ChainWeight::ZERO);
    }

    #[test]
    fn weight_adds_ecv_and_power_share_per_block() {
        let state = power_state();
        let parent_weight = ChainWeight::from_integer(7);
        let ts = Tipset::new([
            mock_block(1, construct_ticket(0x10), parent_weight),
            mock_block(2, construct_ticket(0x20), parent_weight),
        ])
        .unwrap();

        let w = weight(&crate::fil_cns::StatePowerTable, &Cid::default(), &ts, &state).unwrap();
        // 7 + 2 * 10 + 100 * (1 + 2) / 3
        assert_eq!(w, ChainWeight::from_integer(127));
    }

    #[test]
    fn weight_truncates_fractional_share() {
        let state = power_state();
        let ts = Tipset::new([mock_block(1, construct_ticket(0x10), ChainWeight::ZERO)]).unwrap();

        let w = weight(&crate::fil_cns::StatePowerTable, &Cid::default(), &ts, &state).unwrap();
        let exact = ratio(10, 1) + ratio(100, 3);
        assert_eq!(w, ChainWeight::try_from_ratio(&exact).unwrap());
        assert!(w.to_ratio() <= exact);
        assert!(w > ts.parent_weight());
    }

    #[test]
    fn weight_fails_on_power_lookup() {
        let state = power_state();
        let unknown_miner =
            Tipset::new([mock_block(9, construct_ticket(0x10), ChainWeight::ZERO)]).unwrap();
        assert!(matches!(
            weight(&crate::fil_cns::StatePowerTable, &Cid::default(), &unknown_miner, &state),
            Err(Error::PowerLookup(_))
        ));

        let no_power = FixedPowerTable::new(0, 0);
        let ts = Tipset::new([mock_block(1, construct_ticket(0x10), ChainWeight::ZERO)]).unwrap();
        assert!(matches!(
            weight(&no_power, &Cid::default(), &ts, &state),
            Err(Error::PowerLookup(_))
        ));
    }

    #[test]
    fn weight_overflow_is_a_parent_weight_error() {
        let state = power_state();
        let ts = Tipset::new([mock_block(
            1,
            construct_ticket(0x10),
            ChainWeight::from_bits(u64::MAX),
        )])
        .unwrap();
        assert!(matches!(
            weight(&crate::fil_cns::StatePowerTable, &Cid::default(), &ts, &state),
            Err(Error::ParentWeight(_))
        ));
    }

    #[test]
    fn heavier_weight_wins() {
        let state = power_state();
        let pt = FixedPowerTable::new(1, 1);
        let light = Tipset::new([mock_block(1, construct_ticket(0x01), ChainWeight::ZERO)]).unwrap();
        let heavy = Tipset::new([
            mock_block(1, construct_ticket(0x10), ChainWeight::ZERO),
            mock_block(2, construct_ticket(0x20), ChainWeight::ZERO),
        ])
        .unwrap();

        let g = Cid::default();
        assert!(is_heavier(&pt, &g, &heavy, &light, &state, &state).unwrap());
        assert!(!is_heavier(&pt, &g, &light, &heavy, &state, &state).unwrap());
    }

    #[test]
    fn equal_weight_smaller_ticket_wins() {
        let state = power_state();
        let pt = FixedPowerTable::new(1, 1);
        let a = Tipset::new([mock_block(1, construct_ticket(0x01), ChainWeight::ZERO)]).unwrap();
        let b = Tipset::new([mock_block(2, construct_ticket(0x02), ChainWeight::ZERO)]).unwrap();

        let g = Cid::default();
        assert!(is_heavier(&pt, &g, &a, &b, &state, &state).unwrap());
        assert!(!is_heavier(&pt, &g, &b, &a, &state, &state).unwrap());
    }

    #[test]
    fn equal_tickets_fall_back_to_key_string() {
        let state = power_state();
        let pt = FixedPowerTable::new(1, 1);
        let a = Tipset::new([mock_block(1, construct_ticket(0x05), ChainWeight::ZERO)]).unwrap();
        let b = Tipset::new([mock_block(2, construct_ticket(0x05), ChainWeight::ZERO)]).unwrap();

        let g = Cid::default();
        let a_wins = a.key().to_string() > b.key().to_string();
        assert_eq!(is_heavier(&pt, &g, &a, &b, &state, &state).unwrap(), a_wins);
        assert_eq!(is_heavier(&pt, &g, &b, &a, &state, &state).unwrap(), !a_wins);
    }

    #[test]
    fn identical_tipsets_are_unordered() {
        let state = power_state();
        let pt = FixedPowerTable::new(1, 1);
        let a = Tipset::new([mock_block(1, construct_ticket(0x05), ChainWeight::ZERO)]).unwrap();
        assert!(matches!(
            is_heavier(&pt, &Cid::default(), &a, &a.clone(), &state, &state),
            Err(Error::UnorderedTipsets)
        ));
    }
}
