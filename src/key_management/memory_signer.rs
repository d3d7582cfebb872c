// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, generate, new_address, sign, to_public};
use crate::fil_cns::TicketSigner;
use crate::shim::{address::Address, crypto::Signature};
use ahash::HashMap;
use parking_lot::RwLock;

/// Holds secp256k1 private keys in memory and signs on behalf of their
/// addresses.
#[derive(Debug, Default)]
pub struct MemorySigner {
    keys: RwLock<HashMap<Address, Vec<u8>>>,
}

impl MemorySigner {
    /// Creates a new key and returns its address.
    pub fn generate(&self) -> Result<Address, Error> {
        self.import(&generate())
    }

    /// Adds an existing private key and returns its address.
    pub fn import(&self, private_key: &[u8]) -> Result<Address, Error> {
        let addr = new_address(&to_public(private_key)?)?;
        let mut keys = self.keys.write();
        if keys.contains_key(&addr) {
            return Err(Error::KeyExists);
        }
        keys.insert(addr, private_key.to_vec());
        Ok(addr)
    }

    pub fn has_key(&self, addr: &Address) -> bool {
        self.keys.read().contains_key(addr)
    }

    pub fn public_key(&self, addr: &Address) -> Result<Vec<u8>, Error> {
        let keys = self.keys.read();
        let private_key = keys.get(addr).ok_or(Error::KeyNotExists)?;
        to_public(private_key)
    }

    pub fn sign(&self, data: &[u8], addr: &Address) -> Result<Signature, Error> {
        let keys = self.keys.read();
        let private_key = keys.get(addr).ok_or(Error::KeyNotExists)?;
        sign(private_key, data)
    }
}

impl TicketSigner for MemorySigner {
    fn address_for_pub_key(&self, pub_key: &[u8]) -> anyhow::Result<Address> {
        let addr = new_address(pub_key)?;
        if !self.has_key(&addr) {
            return Err(Error::KeyNotExists.into());
        }
        Ok(addr)
    }

    fn sign_bytes(&self, data: &[u8], addr: &Address) -> anyhow::Result<Signature> {
        Ok(self.sign(data, addr)?)
    }
}
