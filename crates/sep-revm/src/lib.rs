//! SEP precompile installation for `revm` based EVMs.

pub mod factory;

pub use factory::{with_sep_precompiles, SepEvmFactory};
