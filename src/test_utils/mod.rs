// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::{
    Block, CachingBlockHeader, ElectionProof, RawBlockHeader, TICKET_BYTES, Ticket, Tipset,
    VRFProof, messages_root, receipts_root,
};
use crate::chain::ChainWeight;
use crate::db::StorageMap;
use crate::fil_cns::PowerTableView;
use crate::interpreter::{DefaultProcessor, MessageProcessor as _};
use crate::message::SignedMessage;
use crate::shim::{
    address::Address,
    crypto::{SECP_SIG_LEN, Signature},
    econ::TokenAmount,
    message::{METHOD_SEND, Message},
    sector::StoragePower,
};
use crate::state_tree::StateTree;
use crate::utils::encoding::CidCborExt as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use num_traits::Zero as _;

/// Returns a well-formed ticket whose first byte is `lead`, the rest zero.
pub fn construct_ticket(lead: u8) -> Ticket {
    let mut bytes = vec![0; TICKET_BYTES];
    bytes[0] = lead;
    Ticket::new(VRFProof::new(bytes))
}

pub fn dummy_signature() -> Signature {
    Signature::new_secp256k1(vec![0; SECP_SIG_LEN])
}

/// Returns a signed transfer of `value` with a gas limit of 1000 at one
/// attoFIL per unit. The signature is not valid.
pub fn construct_signed_message(
    from: Address,
    to: Address,
    sequence: u64,
    value: TokenAmount,
) -> SignedMessage {
    let message = Message {
        version: 0,
        from,
        to,
        sequence,
        value,
        method_num: METHOD_SEND,
        params: RawBytes::default(),
        gas_limit: 1_000,
        gas_fee_cap: TokenAmount::from_atto(1),
        gas_premium: TokenAmount::zero(),
    };
    SignedMessage::new_unchecked(message, dummy_signature())
}

/// Returns a syntactically valid block at epoch 1 without messages.
pub fn construct_block(miner_id: u64, ticket: Ticket) -> Block {
    mock_block(miner_id, ticket, ChainWeight::ZERO)
}

pub fn mock_block(miner_id: u64, ticket: Ticket, parent_weight: ChainWeight) -> Block {
    mock_block_with_messages(Address::new_id(miner_id), ticket, parent_weight, vec![])
}

/// Returns a syntactically valid block carrying `messages`, no receipts and
/// a placeholder state root.
pub fn mock_block_with_messages(
    miner: Address,
    ticket: Ticket,
    parent_weight: ChainWeight,
    messages: Vec<SignedMessage>,
) -> Block {
    let header = RawBlockHeader {
        miner_address: miner,
        tickets: vec![ticket],
        election_proof: Some(ElectionProof {
            win_count: 1,
            vrfproof: VRFProof::new(vec![1; 32]),
        }),
        parents: Default::default(),
        weight: parent_weight,
        epoch: 1,
        state_root: Cid::from_cbor_blake2b256(&"placeholder state").unwrap(),
        message_receipts: receipts_root(&[]).unwrap(),
        messages: messages_root(&messages).unwrap(),
        timestamp: 100,
        signature: Some(dummy_signature()),
    };
    Block {
        header: CachingBlockHeader::new(header),
        messages,
        receipts: vec![],
    }
}

/// Returns a copy of `block` with a modified header.
pub fn modify_header(block: &Block, f: impl FnOnce(&mut RawBlockHeader)) -> Block {
    let mut raw = block.header().clone().into_raw();
    f(&mut raw);
    Block {
        header: CachingBlockHeader::new(raw),
        ..block.clone()
    }
}

/// Mines a block on top of `parent` whose receipts and state root are those
/// computed by [`DefaultProcessor`] on `parent_state`. Nothing is written to
/// `db`.
pub fn mine_block(
    db: &impl Blockstore,
    parent: &Tipset,
    parent_state: &Cid,
    miner: Address,
    ticket: Ticket,
    messages: Vec<SignedMessage>,
) -> Block {
    let block = mock_block_with_messages(miner, ticket, ChainWeight::ZERO, messages);

    let store = StorageMap::new(db);
    let mut state = StateTree::new_from_root(&store, parent_state).unwrap();
    let receipts = <DefaultProcessor>::default()
        .process_block(&mut state, &block, std::slice::from_ref(parent))
        .unwrap();
    let state_root = state.flush().unwrap();

    let parent_header = parent.min_ticket_block().header();
    let mined = modify_header(&block, |h| {
        h.parents = parent.key().clone();
        h.epoch = parent.epoch() + 1;
        h.timestamp = parent_header.timestamp + 30;
        h.state_root = state_root;
        h.message_receipts = receipts_root(&receipts).unwrap();
    });
    Block { receipts, ..mined }
}

/// Power table reporting the same power for every miner.
#[derive(Debug, Clone)]
pub struct FixedPowerTable {
    miner: StoragePower,
    total: StoragePower,
}

impl FixedPowerTable {
    pub fn new(miner: u64, total: u64) -> Self {
        Self {
            miner: StoragePower::from(miner),
            total: StoragePower::from(total),
        }
    }
}

impl Default for FixedPowerTable {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl PowerTableView for FixedPowerTable {
    fn total<S: Blockstore>(&self, _state: &StateTree<S>) -> anyhow::Result<StoragePower> {
        Ok(self.total.clone())
    }

    fn miner_power<S: Blockstore>(
        &self,
        _state: &StateTree<S>,
        _miner: &Address,
    ) -> anyhow::Result<StoragePower> {
        Ok(self.miner.clone())
    }
}
