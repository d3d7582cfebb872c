// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::Tipset;
use sha2::{Digest as _, Sha256};

/// Derives the proving challenge for a block mined on top of `parents` after
/// `null_block_count` empty rounds: `sha256(min_ticket || uvarint(count))`.
pub fn create_challenge_seed(parents: &Tipset, null_block_count: u64) -> [u8; 32] {
    let mut buf = unsigned_varint::encode::u64_buffer();
    let count = unsigned_varint::encode::u64(null_block_count, &mut buf);

    let mut hasher = Sha256::new();
    hasher.update(parents.min_ticket().as_bytes());
    hasher.update(count);

    let mut seed = [0; 32];
    seed.copy_from_slice(&hasher.finalize());
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{construct_block, construct_ticket};

    #[test]
    fn seed_hashes_min_ticket_and_uvarint() {
        let parents = Tipset::new([
            construct_block(1, construct_ticket(0x30)),
            construct_block(2, construct_ticket(0x10)),
        ])
        .unwrap();

        let mut expected = Sha256::new();
        expected.update(construct_ticket(0x10).as_bytes());
        // 300 as an unsigned varint
        expected.update([0xac, 0x02]);
        assert_eq!(
            create_challenge_seed(&parents, 300).as_slice(),
            expected.finalize().as_slice()
        );
    }

    #[test]
    fn seed_depends_on_null_block_count() {
        let parents = Tipset::new([construct_block(1, construct_ticket(0x42))]).unwrap();
        assert_eq!(
            create_challenge_seed(&parents, 0),
            create_challenge_seed(&parents, 0)
        );
        assert_ne!(
            create_challenge_seed(&parents, 0),
            create_challenge_seed(&parents, 1)
        );
    }
}
