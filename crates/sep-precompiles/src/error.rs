//! Error taxonomy shared by both precompiles.

use crate::context::CallKind;
use alloy_evm::{revm::precompile::PrecompileError, EvmInternalsError};
use thiserror::Error;

/// Reasons a SEP precompile call can fail.
///
/// Every variant surfaces to the calling contract as a reverted call; none of
/// them is fatal to the node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SepError {
    /// The call kind is not permitted for the invoked function.
    #[error("unauthorized call kind: {kind}")]
    UnauthorizedCallKind {
        /// The rejected call kind.
        kind: CallKind,
    },
    /// SEP101 keys must be at least one byte long.
    #[error("key is empty")]
    KeyEmpty,
    /// The SEP101 key exceeds the maximum key length.
    #[error("key too large: {len} > {max}")]
    KeyTooLarge {
        /// Length of the rejected key.
        len: usize,
        /// Maximum permitted key length.
        max: usize,
    },
    /// The SEP101 value exceeds the maximum value length.
    #[error("value too large: {len} > {max}")]
    ValueTooLarge {
        /// Length of the rejected value.
        len: usize,
        /// Maximum permitted value length.
        max: usize,
    },
    /// The debited account holds less than the requested amount.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// The spender's allowance is below the requested amount.
    #[error("insufficient allowance")]
    InsufficientAllowance,
    /// The gas budget of the call frame was exhausted.
    #[error("out of gas")]
    OutOfGas,
    /// Calldata could not be decoded against the precompile interface.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No precompile is registered at the target address.
    #[error("no precompile registered at {0}")]
    UnknownPrecompile(alloy_primitives::Address),
    /// The host state backend reported an error.
    #[error("state access failed: {0}")]
    State(String),
}

impl SepError {
    /// Shorthand for [`SepError::UnauthorizedCallKind`].
    pub const fn unauthorized(kind: CallKind) -> Self {
        Self::UnauthorizedCallKind { kind }
    }
}

impl From<alloy_sol_types::Error> for SepError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<EvmInternalsError> for SepError {
    fn from(err: EvmInternalsError) -> Self {
        Self::State(err.to_string())
    }
}

impl From<SepError> for PrecompileError {
    fn from(err: SepError) -> Self {
        match err {
            SepError::OutOfGas => Self::OutOfGas,
            other => Self::Other(other.to_string().into()),
        }
    }
}
