// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::errors::Error;
use crate::shim::{
    address::Address,
    crypto::{SECP_SIG_LEN, Signature},
};
use crate::utils::encoding::blake2b_256;
use anyhow::{Context as _, ensure};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};

fn signing_key(private_key: &[u8]) -> Result<SigningKey, Error> {
    SigningKey::from_slice(private_key).map_err(|err| Error::Other(err.to_string()))
}

/// Return the uncompressed secp256k1 public key for a given private key
pub fn to_public(private_key: &[u8]) -> Result<Vec<u8>, Error> {
    let key = signing_key(private_key)?;
    Ok(key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec())
}

/// Return a new secp256k1 Address that uses the supplied public key
pub fn new_address(public_key: &[u8]) -> Result<Address, Error> {
    Address::new_secp256k1(public_key).map_err(|err| Error::Other(err.to_string()))
}

/// Signs the `BLAKE2b-256` digest of `msg` with a deterministic, recoverable
/// secp256k1 signature: 64 bytes of `r || s` followed by the recovery id.
pub fn sign(private_key: &[u8], msg: &[u8]) -> Result<Signature, Error> {
    let key = signing_key(private_key)?;
    let msg_hash = blake2b_256(msg);
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&msg_hash)
        .map_err(|err| Error::Other(err.to_string()))?;
    let mut new_bytes = [0; SECP_SIG_LEN];
    new_bytes[..64].copy_from_slice(&sig.to_bytes());
    new_bytes[64] = recovery_id.to_byte();
    Ok(Signature::new_secp256k1(new_bytes.to_vec()))
}

/// Generate a new private key
pub fn generate() -> Vec<u8> {
    SigningKey::random(&mut rand::thread_rng())
        .to_bytes()
        .to_vec()
}

/// Checks that `signature` over `data` was produced by the key behind the
/// secp256k1 address `addr`.
pub fn verify_secp256k1(signature: &[u8], data: &[u8], addr: &Address) -> anyhow::Result<()> {
    ensure!(
        signature.len() == SECP_SIG_LEN,
        "invalid signature length {}",
        signature.len()
    );
    let (rs, v) = signature.split_at(64);
    let sig = EcdsaSignature::from_slice(rs)?;
    let recovery_id = v
        .first()
        .copied()
        .and_then(RecoveryId::from_byte)
        .context("invalid recovery id")?;
    let key = VerifyingKey::recover_from_prehash(&blake2b_256(data), &sig, recovery_id)?;
    let rec_addr = Address::new_secp256k1(key.to_encoded_point(false).as_bytes())?;
    ensure!(
        rec_addr == *addr,
        "signature did not match: recovered {rec_addr}, expected {addr}"
    );
    Ok(())
}
