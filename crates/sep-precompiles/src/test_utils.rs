//! In-memory revm journal for unit tests.

use crate::{error::SepError, evm::EvmNativeState};
use alloy_evm::EvmInternals;
use alloy_primitives::{Address, Log, U256};
use revm::{
    context::{
        journal::{Journal, JournalInner},
        BlockEnv, CfgEnv, TxEnv,
    },
    context_interface::JournalTr,
    database::{CacheDB, EmptyDB},
    primitives::hardfork::SpecId,
    state::AccountInfo,
};

pub(crate) type TestJournal = Journal<CacheDB<EmptyDB>>;

/// A journal plus the environment needed to hand out [`EvmInternals`].
#[derive(Debug)]
pub(crate) struct TestChain {
    pub(crate) journal: TestJournal,
    pub(crate) block: BlockEnv,
    cfg: CfgEnv,
    tx: TxEnv,
}

impl TestChain {
    pub(crate) fn new() -> Self {
        let mut journal = Journal::new_with_inner(CacheDB::default(), JournalInner::new());
        journal.inner.set_spec_id(SpecId::PRAGUE);
        Self {
            journal,
            block: BlockEnv::default(),
            cfg: CfgEnv::default(),
            tx: TxEnv::default(),
        }
    }

    pub(crate) fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.journal.inner.state.entry(address).or_default().info =
            AccountInfo::from_balance(balance);
        self
    }

    pub(crate) fn internals(&mut self) -> EvmInternals<'_> {
        EvmInternals::new(&mut self.journal, &self.block, &self.cfg, &self.tx)
    }

    /// Runs `f` as one frame on behalf of the precompile at `precompile`,
    /// reverting everything it journaled when it fails.
    pub(crate) fn frame<T>(
        &mut self,
        precompile: Address,
        f: impl FnOnce(&mut EvmNativeState<'_, '_>) -> Result<T, SepError>,
    ) -> Result<T, SepError> {
        let checkpoint = self.journal.checkpoint();
        let result = {
            let mut internals = self.internals();
            let mut state = EvmNativeState::new(&mut internals, precompile);
            f(&mut state)
        };
        match result {
            Ok(_) => self.journal.checkpoint_commit(),
            Err(_) => self.journal.checkpoint_revert(checkpoint),
        }
        result
    }

    pub(crate) fn logs(&self) -> &[Log] {
        &self.journal.inner.logs
    }

    pub(crate) fn balance(&self, address: Address) -> U256 {
        self.journal
            .inner
            .state
            .get(&address)
            .map(|account| account.info.balance)
            .unwrap_or_default()
    }

    /// Number of non-zero storage words held by `address`.
    pub(crate) fn storage_len(&self, address: Address) -> usize {
        self.journal.inner.state.get(&address).map_or(0, |account| {
            account
                .storage
                .values()
                .filter(|slot| !slot.present_value.is_zero())
                .count()
        })
    }
}
