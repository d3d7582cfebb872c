// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::{Block, Error, messages_root, receipts_root};
use auto_impl::auto_impl;
use cid::Cid;

/// Checks that blocks are well formed and correctly linked to their parent.
#[auto_impl(&, Arc)]
pub trait BlockValidator {
    /// Checks a single block in isolation.
    fn validate_syntax(&self, block: &Block) -> Result<(), Error>;

    /// Checks that `child` correctly derives from `parent`.
    fn validate_semantic(&self, child: &Block, parent: &Block) -> Result<(), Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBlockValidator;

impl BlockValidator for DefaultBlockValidator {
    fn validate_syntax(&self, block: &Block) -> Result<(), Error> {
        let header = block.header();
        if header.tickets.is_empty() {
            return Err(Error::Validation("block has no tickets".to_owned()));
        }
        if let Some(ticket) = header.tickets.iter().find(|t| !t.is_well_formed()) {
            return Err(Error::Validation(format!(
                "ticket must be {} bytes, got {}",
                crate::blocks::TICKET_BYTES,
                ticket.as_bytes().len()
            )));
        }
        if header.election_proof.is_none() {
            return Err(Error::Validation("block has no election proof".to_owned()));
        }
        if header.signature.is_none() {
            return Err(Error::InvalidSignature(
                "Signature is nil in header".to_owned(),
            ));
        }
        if header.state_root == Cid::default() {
            return Err(Error::Validation("block has no state root".to_owned()));
        }

        let computed = messages_root(block.messages())
            .map_err(|e| Error::Validation(format!("computing messages root: {e}")))?;
        if computed != header.messages {
            return Err(Error::Validation(format!(
                "messages root mismatch: header {}, computed {computed}",
                header.messages
            )));
        }
        let computed = receipts_root(block.receipts())
            .map_err(|e| Error::Validation(format!("computing receipts root: {e}")))?;
        if computed != header.message_receipts {
            return Err(Error::Validation(format!(
                "receipts root mismatch: header {}, computed {computed}",
                header.message_receipts
            )));
        }
        Ok(())
    }

    fn validate_semantic(&self, child: &Block, parent: &Block) -> Result<(), Error> {
        let (child, parent_header) = (child.header(), parent.header());
        if child.epoch <= parent_header.epoch {
            return Err(Error::Validation(format!(
                "block epoch {} is not above parent epoch {}",
                child.epoch, parent_header.epoch
            )));
        }
        if !child.parents.contains(parent.cid()) {
            return Err(Error::Validation(format!(
                "block parents {} do not include {}",
                child.parents,
                parent.cid()
            )));
        }
        if child.timestamp < parent_header.timestamp {
            return Err(Error::Validation(format!(
                "block timestamp {} is earlier than parent timestamp {}",
                child.timestamp, parent_header.timestamp
            )));
        }
        Ok(())
    }
}
