//! # SEP Precompiles
//!
//! Native precompiled contracts that give contracts arbitrary-length
//! key/value storage and expose the native coin as an ERC-20 token.
//!
//! ## Available Precompiles
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0x2712` | [`sep101`] | Key/value storage in the caller's namespace (delegated calls only) |
//! | `0x2711` | [`sep206`] | Native coin as ERC-20 over the native balance ledger |
//!
//! Both addresses can be moved through [`SepConfig`].
//!
//! ## Architecture
//!
//! Every call entering a reserved address goes through the same steps:
//!
//! 1. **Routing**: [`PrecompileDispatcher`] selects the precompile by address
//! 2. **Limits**: SEP101 keys and values are bounded by [`limits`]
//! 3. **Guard**: the [`CallKind`] and static flag of the frame are checked
//!    against the precompile's policy before any state is read
//! 4. **Gas**: the [`GasSchedule`] prices the work and the host [`GasMeter`]
//!    deducts it
//! 5. **State**: reads and writes go through [`NativeState`], journaled by
//!    the host so a failed call leaves nothing behind
//!
//! ## Integration
//!
//! [`SepPrecompile`] adapts the dispatcher to alloy-evm's `Precompile`
//! trait. The `sep-revm` crate installs both precompiles into an
//! `EthEvmFactory`:
//!
//! ```ignore
//! use sep_revm::SepEvmFactory;
//! use sep_precompiles::SepConfig;
//!
//! let factory = SepEvmFactory::new(EthEvmFactory::default(), SepConfig::from_env()?)?;
//! ```
//!
//! Other hosts implement [`NativeState`] over their own journal and drive
//! the dispatcher with a [`GasBudget`] or their own [`GasMeter`].

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod evm;
pub mod gas;
pub mod layout;
pub mod limits;
pub mod sep101;
pub mod sep206;
pub mod state;

#[cfg(test)]
mod test_utils;

pub use config::{CoinMetadata, ConfigError, SepConfig};
pub use context::{Access, CallContext, CallKind};
pub use dispatcher::{PrecompileDispatcher, SepKind};
pub use error::SepError;
pub use evm::{EvmNativeState, SepPrecompile};
pub use gas::{Billable, GasBudget, GasMeter, GasSchedule, LinearGasSchedule};
pub use layout::read_raw_value;
pub use sep101::SEP101_PRECOMPILE_ADDR;
pub use sep206::{NativeCoinLedger, SEP206_PRECOMPILE_ADDR};
pub use state::NativeState;
