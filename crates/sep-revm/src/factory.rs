//! Helpers for wrapping Reth EVM factories with the SEP precompiles.

use alloy_evm::{
    eth::{EthBlockExecutorFactory, EthEvm, EthEvmContext, EthEvmFactory},
    precompiles::{DynPrecompile, Precompile, PrecompilesMap},
    Database, Evm, EvmEnv, EvmFactory,
};
use reth_evm_ethereum::EthEvmConfig;
use reth_revm::{
    inspector::NoOpInspector,
    revm::{
        context::{
            result::{EVMError, HaltReason},
            BlockEnv, TxEnv,
        },
        context_interface::result::InvalidTransaction,
        primitives::hardfork::SpecId,
        Inspector,
    },
};
use sep_precompiles::{ConfigError, PrecompileDispatcher, SepConfig, SepPrecompile};
use std::sync::Arc;

/// Wrapper around an existing `EvmFactory` that installs SEP101 and SEP206
/// into every EVM it creates, with or without an inspector.
#[derive(Debug, Clone)]
pub struct SepEvmFactory<F> {
    inner: F,
    dispatcher: Arc<PrecompileDispatcher>,
}

impl<F> SepEvmFactory<F> {
    /// Creates a factory wrapper serving the precompiles described by
    /// `config`.
    pub fn new(inner: F, config: SepConfig) -> Result<Self, ConfigError> {
        let dispatcher = PrecompileDispatcher::new(config)?;
        Ok(Self::with_dispatcher(inner, Arc::new(dispatcher)))
    }

    /// Creates a factory wrapper around an existing dispatcher.
    pub const fn with_dispatcher(inner: F, dispatcher: Arc<PrecompileDispatcher>) -> Self {
        Self { inner, dispatcher }
    }

    /// Dispatcher shared by all EVMs of this factory.
    pub const fn dispatcher(&self) -> &Arc<PrecompileDispatcher> {
        &self.dispatcher
    }

    fn install_sep_precompiles(&self, precompiles: &mut PrecompilesMap) {
        let installed = [
            SepPrecompile::sep101(Arc::clone(&self.dispatcher)),
            SepPrecompile::sep206(Arc::clone(&self.dispatcher)),
        ];

        for precompile in installed {
            let precompile = Arc::new(precompile);
            let address = precompile.address();
            let id = precompile.precompile_id().clone();

            precompiles.apply_precompile(&address, move |_| {
                let precompile_for_call = Arc::clone(&precompile);
                Some(DynPrecompile::new_stateful(id, move |input| {
                    precompile_for_call.call(input)
                }))
            });
        }
    }
}

impl EvmFactory for SepEvmFactory<EthEvmFactory> {
    type Evm<DB: Database, I: Inspector<Self::Context<DB>>> = EthEvm<DB, I, PrecompilesMap>;
    type Context<DB: Database> = EthEvmContext<DB>;
    type Tx = TxEnv;
    type Error<DBError: std::error::Error + Send + Sync + 'static> =
        EVMError<DBError, InvalidTransaction>;
    type HaltReason = HaltReason;
    type Spec = SpecId;
    type BlockEnv = BlockEnv;
    type Precompiles = PrecompilesMap;

    fn create_evm<DB: Database>(
        &self,
        db: DB,
        evm_env: EvmEnv<Self::Spec, Self::BlockEnv>,
    ) -> Self::Evm<DB, NoOpInspector> {
        let mut evm = self.inner.create_evm(db, evm_env);
        self.install_sep_precompiles(evm.precompiles_mut());
        evm
    }

    fn create_evm_with_inspector<DB: Database, I: Inspector<Self::Context<DB>>>(
        &self,
        db: DB,
        input: EvmEnv<Self::Spec, Self::BlockEnv>,
        inspector: I,
    ) -> Self::Evm<DB, I> {
        let mut evm = self.inner.create_evm_with_inspector(db, input, inspector);
        self.install_sep_precompiles(evm.precompiles_mut());
        evm
    }
}

/// Wraps an [`EthEvmConfig`] so that its EVMs serve the SEP precompiles.
pub fn with_sep_precompiles<ChainSpec>(
    config: EthEvmConfig<ChainSpec, EthEvmFactory>,
    sep: SepConfig,
) -> Result<EthEvmConfig<ChainSpec, SepEvmFactory<EthEvmFactory>>, ConfigError> {
    let EthEvmConfig {
        executor_factory,
        block_assembler,
    } = config;
    let wrapped_factory = SepEvmFactory::new(*executor_factory.evm_factory(), sep)?;
    let new_executor_factory = EthBlockExecutorFactory::new(
        *executor_factory.receipt_builder(),
        executor_factory.spec().clone(),
        wrapped_factory,
    );

    Ok(EthEvmConfig {
        executor_factory: new_executor_factory,
        block_assembler,
    })
}
