//! Host state consumed by the precompiles.
//!
//! [`NativeState`] is the narrow view of the chain state the precompiles
//! need: native balances, 32-byte storage words and log emission.
//! [`crate::evm::EvmNativeState`] implements it over the revm journal.

use crate::error::SepError;
use alloy_primitives::{Address, Log, U256};

/// Native ledger, word storage and log sink of the surrounding engine.
///
/// Mutations are journaled by the implementation; reverting the enclosing
/// frame must undo all of them.
pub trait NativeState {
    /// Returns true if the account has been created in state.
    fn account_exists(&mut self, address: Address) -> Result<bool, SepError>;

    /// Native balance of `address`, zero for unknown accounts.
    fn balance(&mut self, address: Address) -> Result<U256, SepError>;

    /// Overwrites the native balance of `address`, creating the account if
    /// it does not exist yet.
    fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), SepError>;

    /// Loads a storage word, zero when unset.
    fn sload(&mut self, address: Address, slot: U256) -> Result<U256, SepError>;

    /// Stores a storage word. Storing zero clears the slot.
    fn sstore(&mut self, address: Address, slot: U256, value: U256) -> Result<(), SepError>;

    /// Appends a log to the current frame.
    fn log(&mut self, log: Log) -> Result<(), SepError>;
}
