//! SEP206: the native coin as an ERC-20 token.
//!
//! ## Overview
//!
//! SEP206 exposes the chain's native coin through the standard ERC-20
//! surface without wrapping it. Balances are the native account balances
//! tracked by the state itself; the precompile never keeps a copy, so the
//! ERC-20 view and the native ledger cannot drift apart. Only allowances
//! are stored by the precompile, in its own account.
//!
//! ## Interface
//!
//! ```solidity
//! interface ISEP206 {
//!     function name() external view returns (string memory);
//!     function symbol() external view returns (string memory);
//!     function decimals() external view returns (uint8);
//!     function totalSupply() external view returns (uint256);
//!     function balanceOf(address owner) external view returns (uint256);
//!     function allowance(address owner, address spender) external view returns (uint256);
//!     function transfer(address to, uint256 value) external returns (bool);
//!     function transferFrom(address from, address to, uint256 value) external returns (bool);
//!     function approve(address spender, uint256 value) external returns (bool);
//!     function increaseAllowance(address spender, uint256 delta) external returns (bool);
//!     function decreaseAllowance(address spender, uint256 delta) external returns (bool);
//! }
//! ```
//!
//! ## Call Kinds
//!
//! Views may be reached with any call kind, `STATICCALL` included. State
//! changes need a plain call (from an EOA or a contract) so that
//! `msg.sender` is the account whose coins or allowances change.
//!
//! ## Allowance Arithmetic
//!
//! - `increaseAllowance` saturates at `2^256 - 1`.
//! - `decreaseAllowance` clamps at zero instead of failing.
//!
//! ## Storage Layout
//!
//! | Slot | Description |
//! |------|-------------|
//! | `keccak256(owner ‖ spender)` | Allowance of `spender` over `owner`'s coins |
//!
//! Both addresses are left-padded to 32 bytes before hashing.

use crate::{
    config::CoinMetadata,
    context::{ensure_sep206, Access, CallContext},
    error::SepError,
    gas::{Billable, GasMeter, GasSchedule},
    state::NativeState,
};
use alloy_primitives::{address, keccak256, Address, Bytes, Log, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolInterface};

sol! {
    /// ERC-20 view over the native coin.
    interface ISEP206 {
        /// Emitted on every successful `transfer` and `transferFrom`.
        event Transfer(address indexed from, address indexed to, uint256 value);

        /// Emitted whenever an allowance is set or adjusted.
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function increaseAllowance(address spender, uint256 delta) external returns (bool);
        function decreaseAllowance(address spender, uint256 delta) external returns (bool);
    }
}

/// Default SEP206 precompile address: 0x00..2711 (10001).
pub const SEP206_PRECOMPILE_ADDR: Address =
    address!("0x0000000000000000000000000000000000002711");

/// Storage slot of the allowance `owner` granted to `spender`.
pub fn allowance_slot(owner: Address, spender: Address) -> U256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(owner.into_word().as_slice());
    preimage[32..].copy_from_slice(spender.into_word().as_slice());
    keccak256(preimage).into()
}

/// ERC-20 operations over the native coin ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCoinLedger {
    address: Address,
    metadata: CoinMetadata,
    transfer_from_margin: U256,
}

impl NativeCoinLedger {
    /// Creates a ledger view whose allowances live in the storage of
    /// `address`.
    pub const fn new(address: Address, metadata: CoinMetadata) -> Self {
        Self {
            address,
            metadata,
            transfer_from_margin: U256::ZERO,
        }
    }

    /// Requires `transferFrom` to leave at least `margin` in the owner's
    /// balance.
    pub const fn with_transfer_from_margin(mut self, margin: U256) -> Self {
        self.transfer_from_margin = margin;
        self
    }

    /// Balance `transferFrom` must leave behind in the owner's account.
    pub const fn transfer_from_margin(&self) -> U256 {
        self.transfer_from_margin
    }

    /// The precompile address holding the allowance storage.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Coin metadata returned by the views.
    pub const fn metadata(&self) -> &CoinMetadata {
        &self.metadata
    }

    // === Views ===

    /// Native balance of `owner`.
    pub fn balance_of<S: NativeState>(&self, state: &mut S, owner: Address) -> Result<U256, SepError> {
        state.balance(owner)
    }

    /// Remaining allowance of `spender` over `owner`'s coins.
    pub fn allowance<S: NativeState>(
        &self,
        state: &mut S,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SepError> {
        state.sload(self.address, allowance_slot(owner, spender))
    }

    // === State Changes ===

    /// Moves `amount` from the caller to `to`.
    pub fn transfer<S: NativeState>(
        &self,
        state: &mut S,
        ctx: &CallContext,
        to: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        ensure_sep206(ctx, Access::Write)?;
        self.move_coins(state, ctx.caller, to, amount)
    }

    /// Moves `amount` from `from` to `to`, spending the caller's allowance.
    ///
    /// The allowance is checked before the balance, so a spender without
    /// enough allowance always sees [`SepError::InsufficientAllowance`].
    /// An owner that does not exist in state, or whose balance would drop
    /// below the configured margin, fails with
    /// [`SepError::InsufficientBalance`] even for a zero amount.
    pub fn transfer_from<S: NativeState>(
        &self,
        state: &mut S,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        ensure_sep206(ctx, Access::Write)?;
        let spender = ctx.caller;
        let allowance = self.allowance(state, from, spender)?;
        let remaining = allowance
            .checked_sub(amount)
            .ok_or(SepError::InsufficientAllowance)?;
        if !state.account_exists(from)? {
            return Err(SepError::InsufficientBalance);
        }
        let required = amount
            .checked_add(self.transfer_from_margin)
            .ok_or(SepError::InsufficientBalance)?;
        if state.balance(from)? < required {
            return Err(SepError::InsufficientBalance);
        }

        if remaining != allowance {
            self.store_allowance(state, from, spender, remaining)?;
        }
        self.move_coins(state, from, to, amount)
    }

    /// Sets the caller's allowance for `spender` to `amount`.
    pub fn approve<S: NativeState>(
        &self,
        state: &mut S,
        ctx: &CallContext,
        spender: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        ensure_sep206(ctx, Access::Write)?;
        self.set_allowance(state, ctx.caller, spender, amount)
    }

    /// Raises the caller's allowance for `spender` by `delta`, saturating at
    /// the maximum value.
    pub fn increase_allowance<S: NativeState>(
        &self,
        state: &mut S,
        ctx: &CallContext,
        spender: Address,
        delta: U256,
    ) -> Result<(), SepError> {
        ensure_sep206(ctx, Access::Write)?;
        let current = self.allowance(state, ctx.caller, spender)?;
        self.set_allowance(state, ctx.caller, spender, current.saturating_add(delta))
    }

    /// Lowers the caller's allowance for `spender` by `delta`, clamping at
    /// zero.
    pub fn decrease_allowance<S: NativeState>(
        &self,
        state: &mut S,
        ctx: &CallContext,
        spender: Address,
        delta: U256,
    ) -> Result<(), SepError> {
        ensure_sep206(ctx, Access::Write)?;
        let current = self.allowance(state, ctx.caller, spender)?;
        self.set_allowance(state, ctx.caller, spender, current.saturating_sub(delta))
    }

    // === Dispatch ===

    /// Decodes SEP206 calldata and executes it, returning ABI-encoded output.
    pub fn execute<S, M>(
        &self,
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
        use ISEP206::ISEP206Calls as Calls;

        let call = Calls::abi_decode(input)?;
        let work = match call {
            Calls::name(_)
            | Calls::symbol(_)
            | Calls::decimals(_)
            | Calls::totalSupply(_)
            | Calls::balanceOf(_)
            | Calls::allowance(_) => Billable::LedgerRead,
            _ => Billable::LedgerWrite,
        };
        meter.charge(schedule.cost(work))?;

        let output = match call {
            Calls::name(_) => ISEP206::nameCall::abi_encode_returns(&self.metadata.name),
            Calls::symbol(_) => ISEP206::symbolCall::abi_encode_returns(&self.metadata.symbol),
            Calls::decimals(_) => {
                ISEP206::decimalsCall::abi_encode_returns(&self.metadata.decimals)
            }
            Calls::totalSupply(_) => {
                ISEP206::totalSupplyCall::abi_encode_returns(&self.metadata.total_supply)
            }
            Calls::balanceOf(call) => {
                ISEP206::balanceOfCall::abi_encode_returns(&self.balance_of(state, call.owner)?)
            }
            Calls::allowance(call) => {
                let allowance = self.allowance(state, call.owner, call.spender)?;
                ISEP206::allowanceCall::abi_encode_returns(&allowance)
            }
            Calls::transfer(call) => {
                self.transfer(state, ctx, call.to, call.value)?;
                ISEP206::transferCall::abi_encode_returns(&true)
            }
            Calls::transferFrom(call) => {
                self.transfer_from(state, ctx, call.from, call.to, call.value)?;
                ISEP206::transferFromCall::abi_encode_returns(&true)
            }
            Calls::approve(call) => {
                self.approve(state, ctx, call.spender, call.value)?;
                ISEP206::approveCall::abi_encode_returns(&true)
            }
            Calls::increaseAllowance(call) => {
                self.increase_allowance(state, ctx, call.spender, call.delta)?;
                ISEP206::increaseAllowanceCall::abi_encode_returns(&true)
            }
            Calls::decreaseAllowance(call) => {
                self.decrease_allowance(state, ctx, call.spender, call.delta)?;
                ISEP206::decreaseAllowanceCall::abi_encode_returns(&true)
            }
        };
        Ok(output.into())
    }

    // === Internals ===

    fn move_coins<S: NativeState>(
        &self,
        state: &mut S,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        let from_balance = state.balance(from)?;
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(SepError::InsufficientBalance)?;

        if !amount.is_zero() && from != to {
            state.set_balance(from, debited)?;
            let credited = state
                .balance(to)?
                .checked_add(amount)
                .ok_or_else(|| SepError::State("balance overflow".to_string()))?;
            state.set_balance(to, credited)?;
        }

        tracing::info!(target: "sep206", ?from, ?to, %amount, "transfer");
        self.emit(
            state,
            ISEP206::Transfer {
                from,
                to,
                value: amount,
            },
        )
    }

    fn set_allowance<S: NativeState>(
        &self,
        state: &mut S,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        self.store_allowance(state, owner, spender, amount)?;
        tracing::info!(target: "sep206", ?owner, ?spender, %amount, "allowance set");
        self.emit(
            state,
            ISEP206::Approval {
                owner,
                spender,
                value: amount,
            },
        )
    }

    fn store_allowance<S: NativeState>(
        &self,
        state: &mut S,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), SepError> {
        state.sstore(self.address, allowance_slot(owner, spender), amount)
    }

    fn emit<S: NativeState, E: SolEvent>(&self, state: &mut S, event: E) -> Result<(), SepError> {
        state.log(Log {
            address: self.address,
            data: event.encode_log_data(),
        })
    }
}
