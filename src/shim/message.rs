// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::METHOD_SEND;
pub use super::fvm_shared_latest::message::Message;

/// Method number indicator for calling actor methods.
pub type MethodNum = u64;
