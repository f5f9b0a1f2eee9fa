//! Configuration of the SEP precompiles: addresses, coin metadata and gas
//! pricing.

use crate::{
    gas::LinearGasSchedule, sep101::SEP101_PRECOMPILE_ADDR, sep206::SEP206_PRECOMPILE_ADDR,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};
use thiserror::Error;

/// Environment variable overriding the SEP101 address.
pub const SEP101_ADDR_ENV: &str = "SEP_PRECOMPILE_SEP101_ADDR";
/// Environment variable overriding the SEP206 address.
pub const SEP206_ADDR_ENV: &str = "SEP_PRECOMPILE_SEP206_ADDR";
/// Environment variable overriding the coin name.
pub const COIN_NAME_ENV: &str = "SEP_COIN_NAME";
/// Environment variable overriding the coin symbol.
pub const COIN_SYMBOL_ENV: &str = "SEP_COIN_SYMBOL";
/// Environment variable overriding the coin decimals.
pub const COIN_DECIMALS_ENV: &str = "SEP_COIN_DECIMALS";
/// Environment variable overriding the total supply (decimal or `0x` hex).
pub const COIN_TOTAL_SUPPLY_ENV: &str = "SEP_COIN_TOTAL_SUPPLY";
/// Environment variable setting the balance `transferFrom` must leave behind.
pub const TRANSFER_FROM_MARGIN_ENV: &str = "SEP_TRANSFER_FROM_MIN_MARGIN";

/// Metadata of the native coin as reported by SEP206.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinMetadata {
    /// ERC-20 `name()`.
    pub name: String,
    /// ERC-20 `symbol()`.
    pub symbol: String,
    /// ERC-20 `decimals()`.
    pub decimals: u8,
    /// ERC-20 `totalSupply()`, in the smallest unit.
    pub total_supply: U256,
}

impl Default for CoinMetadata {
    /// BCH with 18 decimals and a fixed supply of 21 million coins.
    fn default() -> Self {
        Self {
            name: "BCH".to_string(),
            symbol: "BCH".to_string(),
            decimals: 18,
            total_supply: U256::from(21u64) * U256::from(10u64).pow(U256::from(24u64)),
        }
    }
}

/// Full configuration of both precompiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SepConfig {
    /// Address of the SEP101 key/value precompile.
    pub sep101_address: Address,
    /// Address of the SEP206 native coin precompile.
    pub sep206_address: Address,
    /// Native coin metadata.
    pub coin: CoinMetadata,
    /// Gas pricing of both precompiles.
    pub gas: LinearGasSchedule,
    /// Minimum balance a SEP206 `transferFrom` must leave in the owner's
    /// account. Zero disables the check.
    pub transfer_from_min_margin: U256,
}

impl Default for SepConfig {
    fn default() -> Self {
        Self {
            sep101_address: SEP101_PRECOMPILE_ADDR,
            sep206_address: SEP206_PRECOMPILE_ADDR,
            coin: CoinMetadata::default(),
            gas: LinearGasSchedule::default(),
            transfer_from_min_margin: U256::ZERO,
        }
    }
}

impl SepConfig {
    /// Loads the configuration from the environment, falling back to the
    /// defaults for every unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |var: &str| -> Result<Option<String>, ConfigError> {
            match lookup(var) {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Err(ConfigError::EmptyEnv { var: var.into() }),
                Some(raw) => Ok(Some(raw.trim().to_string())),
            }
        };

        if let Some(raw) = read(SEP101_ADDR_ENV)? {
            config.sep101_address = parse(SEP101_ADDR_ENV, &raw)?;
        }
        if let Some(raw) = read(SEP206_ADDR_ENV)? {
            config.sep206_address = parse(SEP206_ADDR_ENV, &raw)?;
        }
        if let Some(raw) = read(COIN_NAME_ENV)? {
            config.coin.name = raw;
        }
        if let Some(raw) = read(COIN_SYMBOL_ENV)? {
            config.coin.symbol = raw;
        }
        if let Some(raw) = read(COIN_DECIMALS_ENV)? {
            config.coin.decimals = parse(COIN_DECIMALS_ENV, &raw)?;
        }
        if let Some(raw) = read(COIN_TOTAL_SUPPLY_ENV)? {
            config.coin.total_supply = parse(COIN_TOTAL_SUPPLY_ENV, &raw)?;
        }
        if let Some(raw) = read(TRANSFER_FROM_MARGIN_ENV)? {
            config.transfer_from_min_margin = parse(TRANSFER_FROM_MARGIN_ENV, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the two precompiles do not share an address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sep101_address == self.sep206_address {
            return Err(ConfigError::AddressCollision(self.sep101_address));
        }
        Ok(())
    }
}

fn parse<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        var: var.into(),
        reason: err.to_string(),
    })
}

/// Errors that can occur while building a [`SepConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but empty or whitespace.
    #[error("environment variable {var} is empty")]
    EmptyEnv {
        /// Name of the variable.
        var: String,
    },
    /// A variable could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// Name of the variable.
        var: String,
        /// Parser error message.
        reason: String,
    },
    /// SEP101 and SEP206 were configured at the same address.
    #[error("SEP101 and SEP206 cannot share address {0}")]
    AddressCollision(Address),
}
