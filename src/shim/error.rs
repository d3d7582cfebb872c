// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::error::ExitCode;

/// Human readable name of an exit code, matching the names used by Lotus.
pub fn exit_code_name(code: ExitCode) -> Option<&'static str> {
    match code {
        ExitCode::OK => Some("Ok"),
        ExitCode::SYS_SENDER_INVALID => Some("SysErrSenderInvalid"),
        ExitCode::SYS_SENDER_STATE_INVALID => Some("SysErrSenderStateInvalid"),
        ExitCode::SYS_INVALID_RECEIVER => Some("SysErrInvalidReceiver"),
        ExitCode::SYS_INSUFFICIENT_FUNDS => Some("SysErrInsufficientFunds"),
        ExitCode::SYS_OUT_OF_GAS => Some("SysErrOutOfGas"),
        ExitCode::USR_ILLEGAL_ARGUMENT => Some("ErrIllegalArgument"),
        ExitCode::USR_NOT_FOUND => Some("ErrNotFound"),
        ExitCode::USR_SERIALIZATION => Some("ErrSerialization"),
        ExitCode::USR_UNHANDLED_MESSAGE => Some("ErrUnhandledMessage"),
        _ => None,
    }
}
