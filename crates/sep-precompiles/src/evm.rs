//! Adapter between the SEP precompiles and revm through alloy-evm.
//!
//! [`SepPrecompile`] is registered at a reserved address of a
//! `PrecompilesMap`. Every call builds a [`CallContext`] from the
//! [`PrecompileInput`], runs the [`PrecompileDispatcher`] against the
//! journaled state behind [`EvmInternals`], and reports the gas charged by
//! the schedule.
//!
//! ## Call Kind Resolution
//!
//! `PrecompileInput` exposes the caller, the storage account and the code
//! account of the frame, which tells `CALL`, `CALLCODE` and `DELEGATECALL`
//! apart, plus the static flag revm carries down from any enclosing
//! `STATICCALL`. A plain frame under that flag is [`CallKind::Static`]; a
//! delegated frame keeps its kind and is marked static in the context.
//!
//! ## Atomicity
//!
//! All writes go through the revm journal. A precompile error fails the
//! frame and revm reverts the frame checkpoint, so a failed call leaves no
//! partial balance, allowance or storage change behind.

use crate::{
    context::{CallContext, CallKind},
    dispatcher::{PrecompileDispatcher, SepKind},
    error::SepError,
    gas::GasBudget,
    state::NativeState,
};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileId, PrecompileResult},
    EvmInternals,
};
use alloy_primitives::{Address, Bytes, Log, U256};
use revm::{bytecode::Bytecode, precompile::PrecompileOutput};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// [`NativeState`] over the revm journal of the current frame.
pub struct EvmNativeState<'a, 'b> {
    internals: &'a mut EvmInternals<'b>,
    precompile: Address,
}

impl fmt::Debug for EvmNativeState<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmNativeState")
            .field("precompile", &self.precompile)
            .finish_non_exhaustive()
    }
}

impl<'a, 'b> EvmNativeState<'a, 'b> {
    /// Wraps `internals` for the precompile installed at `precompile`.
    pub fn new(internals: &'a mut EvmInternals<'b>, precompile: Address) -> Self {
        Self {
            internals,
            precompile,
        }
    }

    /// Bytecode marker for the precompile account.
    ///
    /// The precompile account holds allowance storage, so it must not look
    /// empty to state clearing. The invalid instruction `0xFE` keeps it
    /// alive while making it unusable as a normal contract.
    fn marker() -> &'static Bytecode {
        static BYTECODE: OnceLock<Bytecode> = OnceLock::new();
        BYTECODE.get_or_init(|| Bytecode::new_raw(Bytes::from_static(&[0xFE])))
    }

    fn ensure_account_created(&mut self, address: Address) -> Result<(), SepError> {
        let account = self.internals.load_account(address)?;
        let untouched = account.is_loaded_as_not_existing_not_touched();
        let needs_marker = address == self.precompile && account.info.is_empty_code_hash();

        if needs_marker {
            self.internals.set_code(address, Self::marker().clone())?;
            self.internals.bump_nonce(address)?;
        }
        if untouched {
            self.internals.touch_account(address)?;
        }
        Ok(())
    }
}

impl NativeState for EvmNativeState<'_, '_> {
    fn account_exists(&mut self, address: Address) -> Result<bool, SepError> {
        let account = self.internals.load_account(address)?;
        Ok(!account.is_loaded_as_not_existing_not_touched())
    }

    fn balance(&mut self, address: Address) -> Result<U256, SepError> {
        let account = self.internals.load_account(address)?;
        Ok(account.info.balance)
    }

    fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), SepError> {
        self.ensure_account_created(address)?;
        self.internals.set_balance(address, balance)?;
        self.internals.touch_account(address)?;
        Ok(())
    }

    fn sload(&mut self, address: Address, slot: U256) -> Result<U256, SepError> {
        // the journal only serves slots of loaded accounts
        self.internals.load_account(address)?;
        let value = self.internals.sload(address, slot)?;
        Ok(*value)
    }

    fn sstore(&mut self, address: Address, slot: U256, value: U256) -> Result<(), SepError> {
        self.ensure_account_created(address)?;
        self.internals.sstore(address, slot, value)?;
        self.internals.touch_account(address)?;
        Ok(())
    }

    fn log(&mut self, log: Log) -> Result<(), SepError> {
        self.internals.log(log);
        Ok(())
    }
}

/// A SEP precompile bound to one reserved address.
#[derive(Debug, Clone)]
pub struct SepPrecompile {
    address: Address,
    kind: SepKind,
    dispatcher: Arc<PrecompileDispatcher>,
}

impl SepPrecompile {
    /// Lazily-initialized precompile IDs.
    pub fn id(kind: SepKind) -> &'static PrecompileId {
        static SEP101: OnceLock<PrecompileId> = OnceLock::new();
        static SEP206: OnceLock<PrecompileId> = OnceLock::new();
        match kind {
            SepKind::Sep101 => SEP101.get_or_init(|| PrecompileId::custom("sep101")),
            SepKind::Sep206 => SEP206.get_or_init(|| PrecompileId::custom("sep206")),
        }
    }

    /// Creates the precompile served by `dispatcher` at `address`.
    ///
    /// Returns `None` if `address` is not reserved by the dispatcher.
    pub fn new(dispatcher: Arc<PrecompileDispatcher>, address: Address) -> Option<Self> {
        let kind = dispatcher.kind_of(address)?;
        Some(Self {
            address,
            kind,
            dispatcher,
        })
    }

    /// Creates the SEP101 precompile of `dispatcher`.
    pub fn sep101(dispatcher: Arc<PrecompileDispatcher>) -> Self {
        Self {
            address: dispatcher.sep101_address(),
            kind: SepKind::Sep101,
            dispatcher,
        }
    }

    /// Creates the SEP206 precompile of `dispatcher`.
    pub fn sep206(dispatcher: Arc<PrecompileDispatcher>) -> Self {
        Self {
            address: dispatcher.sep206_address(),
            kind: SepKind::Sep206,
            dispatcher,
        }
    }

    /// Address the precompile is installed at.
    pub const fn address(&self) -> Address {
        self.address
    }

    fn call_context(input: &PrecompileInput<'_>) -> CallContext {
        let is_static = input.is_static_call();
        let kind = CallKind::infer(
            input.caller,
            input.target_address,
            input.bytecode_address,
            is_static,
        );
        CallContext::new(input.caller, input.target_address, kind).with_static(is_static)
    }
}

impl Precompile for SepPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id(self.kind)
    }

    fn call(&self, mut input: PrecompileInput<'_>) -> PrecompileResult {
        let ctx = Self::call_context(&input);
        let data = input.data;
        let mut budget = GasBudget::new(input.gas);

        tracing::debug!(
            target: "sep_dispatch",
            precompile = ?self.address,
            caller = ?ctx.caller,
            namespace = ?ctx.namespace,
            call_kind = %ctx.kind,
            is_static = ctx.is_static,
            gas = input.gas,
            calldata_len = data.len(),
            "precompile call invoked"
        );

        let internals = input.internals_mut();
        let mut state = EvmNativeState::new(internals, self.address);
        let output = self
            .dispatcher
            .dispatch(self.address, &ctx, data, &mut state, &mut budget)?;

        Ok(PrecompileOutput::new(budget.used(), output))
    }

    fn is_pure(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::{read_raw_value, value_slot},
        sep101::{ISEP101, SEP101_PRECOMPILE_ADDR},
        sep206::{ISEP206, SEP206_PRECOMPILE_ADDR},
        test_utils::TestChain,
    };
    use alloy_evm::revm::precompile::PrecompileError;
    use alloy_primitives::address;
    use alloy_sol_types::SolCall;

    const GAS_LIMIT: u64 = 1_000_000;
    const PROXY: Address = address!("0x00000000000000000000000000000000000000c1");
    const EOA: Address = address!("0x00000000000000000000000000000000000000a1");

    struct Frame {
        caller: Address,
        target: Address,
        is_static: bool,
        gas: u64,
    }

    impl Frame {
        const fn new(caller: Address, target: Address) -> Self {
            Self {
                caller,
                target,
                is_static: false,
                gas: GAS_LIMIT,
            }
        }

        const fn in_static(mut self) -> Self {
            self.is_static = true;
            self
        }
    }

    fn run_call(
        chain: &mut TestChain,
        precompile: &SepPrecompile,
        frame: Frame,
        data: &[u8],
    ) -> PrecompileResult {
        let input = PrecompileInput {
            data,
            gas: frame.gas,
            caller: frame.caller,
            value: U256::ZERO,
            target_address: frame.target,
            is_static: frame.is_static,
            bytecode_address: precompile.address(),
            internals: chain.internals(),
        };

        precompile.call(input)
    }

    fn dispatcher() -> Arc<PrecompileDispatcher> {
        Arc::new(PrecompileDispatcher::default())
    }

    fn expect_revert(result: PrecompileResult, expected: &str) {
        match result {
            Err(PrecompileError::Other(msg)) => assert_eq!(msg, expected),
            other => panic!("expected revert `{expected}`, got {other:?}"),
        }
    }

    fn transfer(to: Address, value: u64) -> Vec<u8> {
        ISEP206::transferCall {
            to,
            value: U256::from(value),
        }
        .abi_encode()
    }

    #[test]
    fn delegated_set_and_get_round_trip() {
        let precompile = SepPrecompile::sep101(dispatcher());
        let mut chain = TestChain::new();
        let key = Bytes::from_static(&[0xAB, 0xCD]);
        let value = Bytes::from(vec![0x42; 70]);

        let set = ISEP101::setCall {
            key: key.clone(),
            value: value.clone(),
        }
        .abi_encode();
        let output = run_call(&mut chain, &precompile, Frame::new(EOA, PROXY), &set)
            .expect("delegated set succeeds");
        assert!(output.gas_used > 0, "set must be billed");

        let get = ISEP101::getCall { key: key.clone() }.abi_encode();
        let output = run_call(&mut chain, &precompile, Frame::new(EOA, PROXY), &get)
            .expect("delegated get succeeds");
        assert_eq!(
            ISEP101::getCall::abi_decode_returns(&output.bytes).unwrap(),
            value
        );

        let raw = chain
            .frame(SEP101_PRECOMPILE_ADDR, |state| {
                read_raw_value(state, PROXY, value_slot(&key))
            })
            .unwrap();
        assert_eq!(raw, value, "raw storage must match get");
    }

    #[test]
    fn plain_call_to_sep101_is_denied() {
        let precompile = SepPrecompile::sep101(dispatcher());
        let mut chain = TestChain::new();
        let get = ISEP101::getCall {
            key: Bytes::from_static(b"k"),
        }
        .abi_encode();

        let result = run_call(
            &mut chain,
            &precompile,
            Frame::new(PROXY, SEP101_PRECOMPILE_ADDR),
            &get,
        );
        expect_revert(result, "unauthorized call kind: CALL");

        let result = run_call(
            &mut chain,
            &precompile,
            Frame::new(PROXY, SEP101_PRECOMPILE_ADDR).in_static(),
            &get,
        );
        expect_revert(result, "unauthorized call kind: STATICCALL");
    }

    #[test]
    fn delegated_sep101_under_static_parent_reads_but_cannot_write() {
        let precompile = SepPrecompile::sep101(dispatcher());
        let mut chain = TestChain::new();
        let key = Bytes::from_static(b"k");

        let set = ISEP101::setCall {
            key: key.clone(),
            value: Bytes::from_static(b"v"),
        }
        .abi_encode();
        run_call(&mut chain, &precompile, Frame::new(EOA, PROXY), &set).unwrap();

        let get = ISEP101::getCall { key: key.clone() }.abi_encode();
        let output = run_call(&mut chain, &precompile, Frame::new(EOA, PROXY).in_static(), &get)
            .expect("static-nested get succeeds");
        assert_eq!(
            ISEP101::getCall::abi_decode_returns(&output.bytes).unwrap(),
            Bytes::from_static(b"v")
        );

        let overwrite = ISEP101::setCall {
            key,
            value: Bytes::from_static(b"w"),
        }
        .abi_encode();
        let result = run_call(
            &mut chain,
            &precompile,
            Frame::new(EOA, PROXY).in_static(),
            &overwrite,
        );
        expect_revert(result, "unauthorized call kind: STATICCALL");
        assert_eq!(chain.storage_len(PROXY), 2, "length word and one chunk");
    }

    #[test]
    fn static_transfer_is_rejected() {
        let precompile = SepPrecompile::sep206(dispatcher());
        let mut chain = TestChain::new().with_balance(PROXY, U256::from(10));

        let result = run_call(
            &mut chain,
            &precompile,
            Frame::new(PROXY, SEP206_PRECOMPILE_ADDR).in_static(),
            &transfer(EOA, 1),
        );
        expect_revert(result, "unauthorized call kind: STATICCALL");
        assert_eq!(chain.balance(PROXY), U256::from(10));

        let balance = ISEP206::balanceOfCall { owner: PROXY }.abi_encode();
        let output = run_call(
            &mut chain,
            &precompile,
            Frame::new(PROXY, SEP206_PRECOMPILE_ADDR).in_static(),
            &balance,
        )
        .expect("static balance view succeeds");
        assert_eq!(
            ISEP206::balanceOfCall::abi_decode_returns(&output.bytes).unwrap(),
            U256::from(10)
        );
    }

    #[test]
    fn transfer_moves_native_balance() {
        let precompile = SepPrecompile::sep206(dispatcher());
        let mut chain = TestChain::new().with_balance(EOA, U256::from(1_000));
        let recipient = address!("0x00000000000000000000000000000000000000d1");

        let output = run_call(
            &mut chain,
            &precompile,
            Frame::new(EOA, SEP206_PRECOMPILE_ADDR),
            &transfer(recipient, 100),
        )
        .expect("transfer succeeds");

        assert!(ISEP206::transferCall::abi_decode_returns(&output.bytes).unwrap());
        assert_eq!(chain.balance(EOA), U256::from(900));
        assert_eq!(chain.balance(recipient), U256::from(100));
    }

    #[test]
    fn approve_stores_allowance_in_precompile_account() {
        let precompile = SepPrecompile::sep206(dispatcher());
        let mut chain = TestChain::new();

        let approve = ISEP206::approveCall {
            spender: PROXY,
            value: U256::from(500),
        }
        .abi_encode();
        run_call(
            &mut chain,
            &precompile,
            Frame::new(EOA, SEP206_PRECOMPILE_ADDR),
            &approve,
        )
        .expect("approve succeeds");

        let allowance = ISEP206::allowanceCall {
            owner: EOA,
            spender: PROXY,
        }
        .abi_encode();
        let output = run_call(
            &mut chain,
            &precompile,
            Frame::new(PROXY, SEP206_PRECOMPILE_ADDR),
            &allowance,
        )
        .expect("allowance view succeeds");
        assert_eq!(
            ISEP206::allowanceCall::abi_decode_returns(&output.bytes).unwrap(),
            U256::from(500)
        );

        let account = chain
            .journal
            .inner
            .state
            .get(&SEP206_PRECOMPILE_ADDR)
            .expect("precompile account exists");
        assert!(account.info.code.is_some(), "precompile account carries a marker");
        assert_eq!(account.info.nonce, 1);

        // a second write keeps the marker without bumping the nonce again
        run_call(
            &mut chain,
            &precompile,
            Frame::new(EOA, SEP206_PRECOMPILE_ADDR),
            &approve,
        )
        .unwrap();
        assert_eq!(chain.journal.inner.state[&SEP206_PRECOMPILE_ADDR].info.nonce, 1);
    }

    #[test]
    fn out_of_gas_is_reported_natively() {
        let precompile = SepPrecompile::sep101(dispatcher());
        let mut chain = TestChain::new();
        let set = ISEP101::setCall {
            key: Bytes::from_static(b"k"),
            value: Bytes::from_static(b"v"),
        }
        .abi_encode();

        let mut frame = Frame::new(EOA, PROXY);
        frame.gas = 10;
        assert!(matches!(
            run_call(&mut chain, &precompile, frame, &set),
            Err(PrecompileError::OutOfGas)
        ));
    }

    #[test]
    fn new_rejects_unreserved_address() {
        assert!(SepPrecompile::new(dispatcher(), PROXY).is_none());
        let sep206 = SepPrecompile::new(dispatcher(), SEP206_PRECOMPILE_ADDR).unwrap();
        assert_eq!(sep206.precompile_id(), SepPrecompile::id(SepKind::Sep206));
    }
}
