// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::crypto::signature::{SECP_SIG_LEN, Signature, SignatureType};
