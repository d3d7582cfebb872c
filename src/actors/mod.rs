// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Built-in actors known to the reference message processor: reserved
//! addresses, code CIDs and the power actor state.

pub mod account;
pub mod power;

use std::sync::LazyLock;

use crate::shim::address::Address;
use crate::shim::fvm_shared_latest::{IDENTITY_HASH, IPLD_RAW};
use cid::Cid;
use cid::multihash::Multihash;

/// System actor address.
pub const SYSTEM_ACTOR_ADDR: Address = Address::new_id(0);
/// Network account paying out block rewards.
pub const REWARD_ACTOR_ADDR: Address = Address::new_id(2);
/// Storage power actor address.
pub const POWER_ACTOR_ADDR: Address = Address::new_id(4);

pub static SYSTEM_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin(b"fil/1/system"));
pub static ACCOUNT_ACTOR_CODE_ID: LazyLock<Cid> =
    LazyLock::new(|| make_builtin(b"fil/1/account"));
pub static REWARD_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin(b"fil/1/reward"));
pub static POWER_ACTOR_CODE_ID: LazyLock<Cid> =
    LazyLock::new(|| make_builtin(b"fil/1/storagepower"));

fn make_builtin(bz: &[u8]) -> Cid {
    Cid::new_v1(
        IPLD_RAW,
        Multihash::wrap(IDENTITY_HASH, bz).expect("name exceeds identity multihash size"),
    )
}

/// Returns `true` for code CIDs of the built-in actors above.
pub fn is_builtin_actor(code: &Cid) -> bool {
    [
        &*SYSTEM_ACTOR_CODE_ID,
        &*ACCOUNT_ACTOR_CODE_ID,
        &*REWARD_ACTOR_CODE_ID,
        &*POWER_ACTOR_CODE_ID,
    ]
    .contains(&code)
}
