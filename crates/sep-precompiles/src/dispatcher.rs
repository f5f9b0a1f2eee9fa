//! Routing of reserved-address calls to SEP101 and SEP206.

use crate::{
    config::{ConfigError, SepConfig},
    context::CallContext,
    error::SepError,
    gas::{GasMeter, GasSchedule, LinearGasSchedule},
    sep101,
    sep206::NativeCoinLedger,
    state::NativeState,
};
use alloy_primitives::{Address, Bytes};
use std::sync::Arc;

/// Which SEP precompile lives at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SepKind {
    /// Key/value storage.
    Sep101,
    /// Native coin ERC-20 view.
    Sep206,
}

/// Entry point the interpreter calls for every frame entering a reserved
/// address.
#[derive(Debug, Clone)]
pub struct PrecompileDispatcher {
    sep101_address: Address,
    ledger: NativeCoinLedger,
    schedule: Arc<dyn GasSchedule + Send + Sync>,
}

impl PrecompileDispatcher {
    /// Creates a dispatcher from configuration.
    ///
    /// Fails with [`ConfigError::AddressCollision`] if both precompiles are
    /// configured at the same address.
    pub fn new(config: SepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: SepConfig) -> Self {
        let SepConfig {
            sep101_address,
            sep206_address,
            coin,
            gas,
            transfer_from_min_margin,
        } = config;
        Self {
            sep101_address,
            ledger: NativeCoinLedger::new(sep206_address, coin)
                .with_transfer_from_margin(transfer_from_min_margin),
            schedule: Arc::new(gas),
        }
    }

    /// Replaces the gas schedule.
    pub fn with_schedule(mut self, schedule: impl GasSchedule + Send + Sync + 'static) -> Self {
        self.schedule = Arc::new(schedule);
        self
    }

    /// Address of the SEP101 precompile.
    pub const fn sep101_address(&self) -> Address {
        self.sep101_address
    }

    /// Address of the SEP206 precompile.
    pub const fn sep206_address(&self) -> Address {
        self.ledger.address()
    }

    /// The SEP206 ledger view.
    pub const fn ledger(&self) -> &NativeCoinLedger {
        &self.ledger
    }

    /// Classifies `address`, `None` if it is not reserved for a SEP
    /// precompile.
    pub fn kind_of(&self, address: Address) -> Option<SepKind> {
        if address == self.sep101_address {
            Some(SepKind::Sep101)
        } else if address == self.ledger.address() {
            Some(SepKind::Sep206)
        } else {
            None
        }
    }

    /// Executes a call to the precompile whose code lives at `address`.
    ///
    /// On error the caller must revert the frame; the dispatcher performs
    /// no rollback of its own.
    pub fn dispatch<S, M>(
        &self,
        address: Address,
        ctx: &CallContext,
        input: &[u8],
        state: &mut S,
        meter: &mut M,
    ) -> Result<Bytes, SepError>
    where
        S: NativeState,
        M: GasMeter,
    {
        let kind = self
            .kind_of(address)
            .ok_or(SepError::UnknownPrecompile(address))?;
        tracing::trace!(
            target: "sep_dispatch",
            ?address,
            ?kind,
            caller = ?ctx.caller,
            call_kind = %ctx.kind,
            is_static = ctx.is_static,
            calldata_len = input.len(),
            "dispatching precompile call"
        );

        let schedule = self.schedule.as_ref();
        let result = match kind {
            SepKind::Sep101 => sep101::execute(state, meter, schedule, ctx, input),
            SepKind::Sep206 => self.ledger.execute(state, meter, schedule, ctx, input),
        };

        if let Err(err) = &result {
            tracing::debug!(target: "sep_dispatch", ?address, %err, "precompile call reverted");
        }
        result
    }
}

impl Default for PrecompileDispatcher {
    fn default() -> Self {
        Self::from_validated(SepConfig::default())
    }
}

impl From<LinearGasSchedule> for PrecompileDispatcher {
    fn from(schedule: LinearGasSchedule) -> Self {
        Self::default().with_schedule(schedule)
    }
}
