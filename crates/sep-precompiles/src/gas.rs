//! Gas accounting seam between the precompiles and the host's gas meter.
//!
//! The precompiles only know what they are billing for: fixed per-function
//! work and the byte lengths of SEP101 keys and values. Turning those into
//! gas units is the job of a [`GasSchedule`]; deducting them is the job of
//! the host's [`GasMeter`].

use crate::error::SepError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The host facility that deducts gas from the current frame.
pub trait GasMeter {
    /// Charges `units` gas, failing with [`SepError::OutOfGas`] when the
    /// remaining budget is too small.
    fn charge(&mut self, units: u64) -> Result<(), SepError>;
}

/// A fixed gas budget, typically the `gas` field of a precompile input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasBudget {
    limit: u64,
    used: u64,
}

impl GasBudget {
    /// Creates a budget with `limit` units available.
    pub const fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Units charged so far.
    pub const fn used(&self) -> u64 {
        self.used
    }

    /// Units still available.
    pub const fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}

impl GasMeter for GasBudget {
    fn charge(&mut self, units: u64) -> Result<(), SepError> {
        if units > self.remaining() {
            return Err(SepError::OutOfGas);
        }
        self.used += units;
        Ok(())
    }
}

/// Billable work of a single precompile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billable {
    /// SEP101 `get` lookup of a key.
    KvRead {
        /// Key length in bytes.
        key_len: usize,
    },
    /// SEP101 `get` returning a stored value.
    KvReadValue {
        /// Value length in bytes.
        value_len: usize,
    },
    /// SEP101 `set`.
    KvWrite {
        /// Key length in bytes.
        key_len: usize,
        /// Value length in bytes.
        value_len: usize,
    },
    /// SEP206 metadata or ledger read.
    LedgerRead,
    /// SEP206 balance or allowance write.
    LedgerWrite,
}

/// Converts billable work into gas units.
pub trait GasSchedule: fmt::Debug {
    /// Gas units owed for `work`.
    fn cost(&self, work: Billable) -> u64;
}

/// Linear pricing: a base cost per access plus a per-32-byte-word cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearGasSchedule {
    /// Base cost of a SEP101 read.
    pub kv_read_base: u64,
    /// Base cost of a SEP101 write.
    pub kv_write_base: u64,
    /// Cost per 32-byte word read.
    pub read_per_word: u64,
    /// Cost per 32-byte word written.
    pub write_per_word: u64,
    /// Cost of a SEP206 read.
    pub ledger_read: u64,
    /// Cost of a SEP206 write.
    pub ledger_write: u64,
}

impl Default for LinearGasSchedule {
    /// Costs in line with cold `SLOAD` (2,100) and `SSTORE` (20,000) plus
    /// warm per-word accesses.
    fn default() -> Self {
        Self {
            kv_read_base: 2_100,
            kv_write_base: 20_000,
            read_per_word: 100,
            write_per_word: 5_000,
            ledger_read: 2_100,
            ledger_write: 9_000,
        }
    }
}

const fn words(len: usize) -> u64 {
    len.div_ceil(32) as u64
}

impl GasSchedule for LinearGasSchedule {
    fn cost(&self, work: Billable) -> u64 {
        match work {
            Billable::KvRead { key_len } => self
                .kv_read_base
                .saturating_add(self.read_per_word.saturating_mul(words(key_len))),
            Billable::KvReadValue { value_len } => {
                self.read_per_word.saturating_mul(words(value_len))
            }
            Billable::KvWrite { key_len, value_len } => self
                .kv_write_base
                .saturating_add(self.read_per_word.saturating_mul(words(key_len)))
                .saturating_add(self.write_per_word.saturating_mul(words(value_len))),
            Billable::LedgerRead => self.ledger_read,
            Billable::LedgerWrite => self.ledger_write,
        }
    }
}
