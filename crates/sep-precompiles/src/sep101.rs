//! SEP101: arbitrary-length key/value storage for contracts.
//!
//! ## Overview
//!
//! Solidity storage is addressed by 32-byte words. SEP101 lets a contract
//! store values up to 24 KiB under keys up to 256 bytes without managing
//! slots itself. The precompile must be entered with `DELEGATECALL` (or
//! `CALLCODE`) so that it runs inside the caller's storage: every contract
//! gets its own namespace, and two contracts using the same key never see
//! each other's data.
//!
//! ## Interface
//!
//! ```solidity
//! interface ISEP101 {
//!     function set(bytes calldata key, bytes calldata value) external;
//!     function get(bytes calldata key) external returns (bytes memory);
//! }
//! ```
//!
//! ## Semantics
//!
//! - `set` with an empty value deletes the entry; deleting a missing entry
//!   succeeds.
//! - `get` of a missing key returns empty bytes.
//! - Under a static parent frame `get` still works and `set` is rejected.
//! - Keys are 1..=256 bytes, values 0..=24576 bytes.
//!
//! ## Storage Layout
//!
//! See [`crate::layout`]. The base slot is `sha256(key)` in the calling
//! contract's storage, so `eth_getStorageAt`-style inspection tools can
//! verify entries independently.
//!
//! ## Usage Example
//!
//! ```solidity
//! address constant SEP101 = address(0x2712);
//!
//! function put(bytes memory key, bytes memory value) internal {
//!     (bool ok,) = SEP101.delegatecall(
//!         abi.encodeCall(ISEP101.set, (key, value))
//!     );
//!     require(ok, "SEP101 set failed");
//! }
//! ```

use crate::{
    context::{ensure_sep101, Access, CallContext},
    error::SepError,
    gas::{Billable, GasMeter, GasSchedule},
    layout::{read_raw_value, value_slot, write_raw_value},
    limits::{check_key, check_value},
    state::NativeState,
};
use alloy_primitives::{address, Address, Bytes};
use alloy_sol_types::{sol, SolCall, SolInterface};

sol! {
    /// Key/value storage executed in the caller's storage context.
    interface ISEP101 {
        /// Store `value` under `key`; an empty value deletes the entry.
        function set(bytes key, bytes value) external;

        /// Load the value stored under `key`, empty if absent.
        function get(bytes key) external returns (bytes);
    }
}

/// Default SEP101 precompile address: 0x00..2712 (10002).
pub const SEP101_PRECOMPILE_ADDR: Address =
    address!("0x0000000000000000000000000000000000002712");

/// Stores `value` under `key` in the namespace of the calling contract.
pub fn set<S, M>(
    state: &mut S,
    meter: &mut M,
    schedule: &dyn GasSchedule,
    ctx: &CallContext,
    key: &[u8],
    value: &[u8],
) -> Result<(), SepError>
where
    S: NativeState,
    M: GasMeter,
{
    check_key(key)?;
    check_value(value)?;
    ensure_sep101(ctx, Access::Write)?;
    meter.charge(schedule.cost(Billable::KvWrite {
        key_len: key.len(),
        value_len: value.len(),
    }))?;

    let slot = value_slot(key);
    write_raw_value(state, ctx.namespace, slot, value)?;

    if value.is_empty() {
        tracing::debug!(
            target: "sep101",
            namespace = ?ctx.namespace,
            key_len = key.len(),
            %slot,
            "entry deleted"
        );
    } else {
        tracing::debug!(
            target: "sep101",
            namespace = ?ctx.namespace,
            key_len = key.len(),
            value_len = value.len(),
            %slot,
            "entry stored"
        );
    }
    Ok(())
}

/// Loads the value stored under `key` in the namespace of the calling
/// contract, empty when absent.
pub fn get<S, M>(
    state: &mut S,
    meter: &mut M,
    schedule: &dyn GasSchedule,
    ctx: &CallContext,
    key: &[u8],
) -> Result<Bytes, SepError>
where
    S: NativeState,
    M: GasMeter,
{
    check_key(key)?;
    ensure_sep101(ctx, Access::Read)?;
    meter.charge(schedule.cost(Billable::KvRead { key_len: key.len() }))?;

    let value = read_raw_value(state, ctx.namespace, value_slot(key))?;
    meter.charge(schedule.cost(Billable::KvReadValue {
        value_len: value.len(),
    }))?;

    tracing::debug!(
        target: "sep101",
        namespace = ?ctx.namespace,
        key_len = key.len(),
        value_len = value.len(),
        "entry loaded"
    );
    Ok(value)
}

/// Decodes SEP101 calldata and executes it, returning ABI-encoded output.
pub fn execute<S, M>(
    state: &mut S,
    meter: &mut M,
    schedule: &dyn GasSchedule,
    ctx: &CallContext,
    input: &[u8],
) -> Result<Bytes, SepError>
where
    S: NativeState,
    M: GasMeter,
{
    match ISEP101::ISEP101Calls::abi_decode(input)? {
        ISEP101::ISEP101Calls::set(call) => {
            set(state, meter, schedule, ctx, &call.key, &call.value)?;
            Ok(Bytes::new())
        }
        ISEP101::ISEP101Calls::get(call) => {
            let value = get(state, meter, schedule, ctx, &call.key)?;
            Ok(ISEP101::getCall::abi_encode_returns(&value).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::CallKind,
        gas::{GasBudget, LinearGasSchedule},
        test_utils::TestChain,
    };
    use alloy_primitives::{address, U256};

    const PROXY: Address = address!("0x00000000000000000000000000000000000000c1");
    const EOA: Address = address!("0x00000000000000000000000000000000000000a1");

    fn delegated() -> CallContext {
        CallContext::new(EOA, PROXY, CallKind::Delegate)
    }

    fn run(chain: &mut TestChain, ctx: &CallContext, data: &[u8]) -> Result<Bytes, SepError> {
        let mut budget = GasBudget::new(u64::MAX);
        chain.frame(SEP101_PRECOMPILE_ADDR, |state| {
            execute(state, &mut budget, &LinearGasSchedule::default(), ctx, data)
        })
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut chain = TestChain::new();
        let key = Bytes::from_static(&[0xAB, 0xCD]);
        let value = Bytes::from([0x12u8, 0x34].repeat(500));

        let set_data = ISEP101::setCall {
            key: key.clone(),
            value: value.clone(),
        }
        .abi_encode();
        run(&mut chain, &delegated(), &set_data).expect("set succeeds");

        let get_data = ISEP101::getCall { key }.abi_encode();
        let output = run(&mut chain, &delegated(), &get_data).expect("get succeeds");
        let decoded = ISEP101::getCall::abi_decode_returns(&output).expect("output decodes");
        assert_eq!(decoded, value);
    }

    #[test]
    fn raw_storage_matches_get() {
        let mut chain = TestChain::new();
        let schedule = LinearGasSchedule::default();
        let ctx = delegated();

        let (raw, loaded, length) = chain
            .frame(SEP101_PRECOMPILE_ADDR, |state| {
                let mut budget = GasBudget::new(u64::MAX);
                set(state, &mut budget, &schedule, &ctx, b"key", b"value")?;
                let raw = read_raw_value(state, PROXY, value_slot(b"key"))?;
                let loaded = get(state, &mut budget, &schedule, &ctx, b"key")?;
                let length = state.sload(PROXY, value_slot(b"key"))?;
                Ok((raw, loaded, length))
            })
            .unwrap();
        assert_eq!(raw, loaded);
        assert_eq!(raw, Bytes::from_static(b"value"));
        assert_eq!(length, U256::from(5));
    }

    #[test]
    fn plain_calls_are_rejected() {
        let mut chain = TestChain::new();
        let data = ISEP101::getCall {
            key: Bytes::from_static(b"k"),
        }
        .abi_encode();

        for kind in [CallKind::Direct, CallKind::Call, CallKind::Static] {
            let ctx = CallContext::new(EOA, SEP101_PRECOMPILE_ADDR, kind);
            assert_eq!(
                run(&mut chain, &ctx, &data),
                Err(SepError::UnauthorizedCallKind { kind })
            );
        }
    }

    #[test]
    fn static_parent_blocks_set_only() {
        let mut chain = TestChain::new();
        let set_data = ISEP101::setCall {
            key: Bytes::from_static(b"k"),
            value: Bytes::from_static(b"v"),
        }
        .abi_encode();
        run(&mut chain, &delegated(), &set_data).unwrap();

        let nested = delegated().with_static(true);
        assert_eq!(
            run(&mut chain, &nested, &set_data),
            Err(SepError::UnauthorizedCallKind {
                kind: CallKind::Static
            })
        );

        let get_data = ISEP101::getCall {
            key: Bytes::from_static(b"k"),
        }
        .abi_encode();
        let output = run(&mut chain, &nested, &get_data).unwrap();
        assert_eq!(
            ISEP101::getCall::abi_decode_returns(&output).unwrap(),
            Bytes::from_static(b"v")
        );
    }

    #[test]
    fn namespaces_are_isolated() {
        let other = address!("0x00000000000000000000000000000000000000c2");
        let mut chain = TestChain::new();
        let schedule = LinearGasSchedule::default();

        let theirs = chain
            .frame(SEP101_PRECOMPILE_ADDR, |state| {
                let mut budget = GasBudget::new(u64::MAX);
                set(state, &mut budget, &schedule, &delegated(), b"k", b"mine")?;
                let ctx = CallContext::new(EOA, other, CallKind::CallCode);
                get(state, &mut budget, &schedule, &ctx, b"k")
            })
            .unwrap();
        assert!(theirs.is_empty());
    }

    #[test]
    fn gas_scales_with_entry_size() {
        let mut chain = TestChain::new();
        let schedule = LinearGasSchedule::default();
        let ctx = delegated();

        let mut small = GasBudget::new(u64::MAX);
        let mut large = GasBudget::new(u64::MAX);
        chain
            .frame(SEP101_PRECOMPILE_ADDR, |state| {
                set(state, &mut small, &schedule, &ctx, b"a", b"b")?;
                set(state, &mut large, &schedule, &ctx, &[1; 200], &[2; 2_000])
            })
            .unwrap();
        assert!(large.used() > small.used());

        let mut tight = GasBudget::new(small.used() - 1);
        let result = chain.frame(SEP101_PRECOMPILE_ADDR, |state| {
            set(state, &mut tight, &schedule, &ctx, b"a", b"b")
        });
        assert_eq!(result, Err(SepError::OutOfGas));
    }
}
