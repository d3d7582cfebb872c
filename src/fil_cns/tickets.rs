// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::LazyLock;

use super::PowerTableView;
use crate::blocks::{TICKET_BYTES, Ticket, VRFProof};
use crate::shim::{address::Address, crypto::Signature, sector::StoragePower};
use crate::state_tree::StateTree;
use anyhow::Context as _;
use auto_impl::auto_impl;
use fvm_ipld_blockstore::Blockstore;
use num_bigint::{BigInt, Sign};
use num_traits::One as _;

/// Size of the ticket space, `2^520 - 1`. Tickets are secp256k1 recoverable
/// signatures, so the domain has to match their byte length.
pub static TICKET_DOMAIN: LazyLock<BigInt> =
    LazyLock::new(|| (BigInt::one() << (TICKET_BYTES * 8)) - 1);

/// Signs ticket material on behalf of a miner.
#[auto_impl(&, Arc)]
pub trait TicketSigner {
    /// Resolves the address holding the private key for `pub_key`.
    fn address_for_pub_key(&self, pub_key: &[u8]) -> anyhow::Result<Address>;
    /// Signs `data` with the key behind `addr`.
    fn sign_bytes(&self, data: &[u8], addr: &Address) -> anyhow::Result<Signature>;
}

/// Signs `proof || signer address` and returns the signature as a ticket.
pub fn create_ticket(
    proof: &[u8],
    pub_key: &[u8],
    signer: &impl TicketSigner,
) -> anyhow::Result<Ticket> {
    let addr = signer
        .address_for_pub_key(pub_key)
        .context("could not get address for signer public key")?;
    let mut buf = proof.to_vec();
    buf.extend_from_slice(&addr.to_bytes());
    let sig = signer.sign_bytes(&buf, &addr)?;
    Ok(Ticket::new(VRFProof::new(sig.bytes)))
}

/// Returns `true` if `ticket * total_power < miner_power * TICKET_DOMAIN`,
/// with the ticket read as a big-endian unsigned integer.
pub fn compare_ticket_power(
    ticket: &Ticket,
    miner_power: &StoragePower,
    total_power: &StoragePower,
) -> bool {
    let lhs = BigInt::from_bytes_be(Sign::Plus, ticket.as_bytes()) * total_power;
    let rhs = miner_power * &*TICKET_DOMAIN;
    lhs < rhs
}

/// Looks up the power of `miner` and of the network at `state` and checks
/// whether `ticket` elects the miner.
pub fn is_winning_ticket<S: Blockstore>(
    power_table: &impl PowerTableView,
    state: &StateTree<S>,
    ticket: &Ticket,
    miner: &Address,
) -> anyhow::Result<bool> {
    let total_power = power_table
        .total(state)
        .context("Couldn't get totalPower")?;
    let miner_power = power_table
        .miner_power(state, miner)
        .context("Couldn't get minerPower")?;
    Ok(compare_ticket_power(ticket, &miner_power, &total_power))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::fil_cns::StatePowerTable;
    use crate::genesis::GenesisBuilder;
    use crate::key_management::{MemorySigner, verify_secp256k1};
    use quickcheck_macros::quickcheck;

    fn ticket(first: u8, rest: u8) -> Ticket {
        let mut bytes = vec![rest; TICKET_BYTES];
        bytes[0] = first;
        Ticket::new(VRFProof::new(bytes))
    }

    #[test]
    fn ticket_domain_is_all_ones() {
        assert_eq!(
            TICKET_DOMAIN.to_bytes_be(),
            (Sign::Plus, vec![0xff; TICKET_BYTES])
        );
    }

    #[quickcheck]
    fn full_power_wins_below_domain(ticket: Ticket, total: u64) -> bool {
        let total = StoragePower::from(total) + 1;
        let below_domain = ticket.as_bytes() != [0xff; TICKET_BYTES];
        compare_ticket_power(&ticket, &total, &total) == below_domain
    }

    #[quickcheck]
    fn zero_power_never_wins(ticket: Ticket, total: u64) -> bool {
        !compare_ticket_power(&ticket, &StoragePower::from(0), &StoragePower::from(total))
    }

    #[test]
    fn half_power_splits_the_domain() {
        let (miner, total) = (StoragePower::from(1), StoragePower::from(2));
        assert!(compare_ticket_power(&ticket(0x7f, 0xff), &miner, &total));
        assert!(!compare_ticket_power(&ticket(0x80, 0x00), &miner, &total));
    }

    #[test]
    fn winning_ticket_uses_state_power() {
        let (m1, m2) = (Address::new_id(1001), Address::new_id(1002));
        let (_, tree) = GenesisBuilder::default()
            .with_miner(m1, Address::new_id(2001), StoragePower::from(1))
            .with_miner(m2, Address::new_id(2002), StoragePower::from(3))
            .build_state(MemoryDB::default())
            .unwrap();
        let low = ticket(0x20, 0x00);
        let mid = ticket(0x80, 0x00);

        assert!(is_winning_ticket(&StatePowerTable, &tree, &low, &m1).unwrap());
        assert!(!is_winning_ticket(&StatePowerTable, &tree, &mid, &m1).unwrap());
        assert!(is_winning_ticket(&StatePowerTable, &tree, &mid, &m2).unwrap());

        let err = is_winning_ticket(&StatePowerTable, &tree, &low, &Address::new_id(9))
            .unwrap_err();
        assert!(err.to_string().contains("Couldn't get minerPower"));
    }

    #[test]
    fn created_ticket_signs_proof_and_address() {
        let signer = MemorySigner::default();
        let addr = signer.generate().unwrap();
        let pub_key = signer.public_key(&addr).unwrap();

        let proof = b"post proof";
        let ticket = create_ticket(proof, &pub_key, &signer).unwrap();
        assert!(ticket.is_well_formed());

        let mut signed = proof.to_vec();
        signed.extend_from_slice(&addr.to_bytes());
        verify_secp256k1(ticket.as_bytes(), &signed, &addr).unwrap();

        let stranger = MemorySigner::default();
        assert!(create_ticket(proof, &pub_key, &stranger).is_err());
    }
}
