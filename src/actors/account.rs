// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::ACCOUNT_ACTOR_CODE_ID;
use crate::state_tree::ActorState;
use crate::utils::db::CborStoreExt as _;
use fvm_ipld_blockstore::Blockstore;

/// An account actor with an empty state object and no funds.
pub fn new_empty_actor<BS: Blockstore>(store: &BS) -> anyhow::Result<ActorState> {
    let state = store.put_cbor_default(&())?;
    Ok(ActorState::new_empty(*ACCOUNT_ACTOR_CODE_ID, state))
}
