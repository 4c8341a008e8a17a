use std::collections::{BTreeMap, BTreeSet};

#[cfg(not(target_arch = "wasm32"))]
use async_trait::async_trait;
use mandate_call::{BlockNumber, Call, CallHash, CallIndices, Weight};
use mandate_common::{AccountId, SharedCell};

use crate::{
    AnnouncementList, ChainState, ChainStateError, DepositConstants, PendingMultisig, ProxyList,
};

/// A [`ChainState`] held in memory.
///
/// Entries that were never set read as empty. Reads concerning an account
/// passed to [`fail_reads_for`](MemoryChainState::fail_reads_for) fail, to
/// exercise degraded paths. Calls are numbered like the Polkadot runtime
/// unless [`with_call_indices`](MemoryChainState::with_call_indices) says
/// otherwise.
#[derive(Debug, Default)]
pub struct MemoryChainState {
    constants: DepositConstants,
    indices: CallIndices,
    weight: Weight,
    block: SharedCell<BlockNumber>,
    multisigs: SharedCell<BTreeMap<(AccountId, CallHash), PendingMultisig>>,
    proxies: SharedCell<BTreeMap<AccountId, ProxyList>>,
    announcements: SharedCell<BTreeMap<AccountId, AnnouncementList>>,
    failing: SharedCell<BTreeSet<AccountId>>,
}

impl MemoryChainState {
    /// Creates an empty chain with the given deposit parameters.
    pub fn new(constants: DepositConstants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    /// Sets the weight reported for every call.
    pub fn with_call_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the runtime's call numbering.
    pub fn with_call_indices(mut self, indices: CallIndices) -> Self {
        self.indices = indices;
        self
    }

    /// Sets the best block.
    pub fn set_block_number(&self, block: BlockNumber) {
        *self.block.write() = block;
    }

    /// Records a pending multisig operation.
    pub fn set_multisig(&self, multisig: AccountId, call_hash: CallHash, pending: PendingMultisig) {
        self.multisigs.write().insert((multisig, call_hash), pending);
    }

    /// Replaces the proxies of `real`.
    pub fn set_proxies(&self, real: AccountId, proxies: ProxyList) {
        self.proxies.write().insert(real, proxies);
    }

    /// Replaces the announcements of `delegate`.
    pub fn set_announcements(&self, delegate: AccountId, announcements: AnnouncementList) {
        self.announcements.write().insert(delegate, announcements);
    }

    /// Makes every read keyed by `account` fail.
    pub fn fail_reads_for(&self, account: AccountId) {
        self.failing.write().insert(account);
    }

    fn check(&self, account: &AccountId) -> Result<(), ChainStateError> {
        if self.failing.read().contains(account) {
            return Err(ChainStateError::Unavailable(format!(
                "reads for {account} are failing"
            )));
        }
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl ChainState for MemoryChainState {
    async fn multisig(
        &self,
        multisig: &AccountId,
        call_hash: &CallHash,
    ) -> Result<Option<PendingMultisig>, ChainStateError> {
        self.check(multisig)?;
        Ok(self.multisigs.read().get(&(*multisig, *call_hash)).cloned())
    }

    async fn proxies(&self, real: &AccountId) -> Result<ProxyList, ChainStateError> {
        self.check(real)?;
        Ok(self.proxies.read().get(real).cloned().unwrap_or_default())
    }

    async fn announcements(&self, delegate: &AccountId) -> Result<AnnouncementList, ChainStateError> {
        self.check(delegate)?;
        Ok(self
            .announcements
            .read()
            .get(delegate)
            .cloned()
            .unwrap_or_default())
    }

    async fn constants(&self) -> Result<DepositConstants, ChainStateError> {
        Ok(self.constants)
    }

    async fn call_indices(&self) -> Result<CallIndices, ChainStateError> {
        Ok(self.indices.clone())
    }

    async fn call_weight(&self, _call: &Call) -> Result<Weight, ChainStateError> {
        Ok(self.weight)
    }

    async fn block_number(&self) -> Result<BlockNumber, ChainStateError> {
        Ok(*self.block.read())
    }
}
