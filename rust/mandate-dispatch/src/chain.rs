#[cfg(not(target_arch = "wasm32"))]
use async_trait::async_trait;
use mandate_call::{Balance, BlockNumber, Call, CallHash, CallIndices, ProxyType, Timepoint, Weight};
use mandate_common::{AccountId, SharedSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a [`ChainState`] reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainStateError {
    /// The node could not be queried.
    #[error("Chain state unavailable: {0}")]
    Unavailable(String),

    /// A storage entry did not have the expected shape.
    #[error("Failed to decode chain state: {0}")]
    Decode(String),
}

/// Deposit parameters of the multisig and proxy pallets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositConstants {
    /// Base multisig deposit.
    pub deposit_base: Balance,
    /// Multisig deposit per threshold unit.
    pub deposit_factor: Balance,
    /// Base deposit for holding any proxies.
    pub proxy_deposit_base: Balance,
    /// Deposit per proxy.
    pub proxy_deposit_factor: Balance,
    /// Base deposit for holding any announcements.
    pub announcement_deposit_base: Balance,
    /// Deposit per announcement.
    pub announcement_deposit_factor: Balance,
}

impl DepositConstants {
    /// Deposit of a new multisig operation.
    pub fn multisig_deposit(&self, threshold: u16) -> Balance {
        self.deposit_base
            .saturating_add(self.deposit_factor.saturating_mul(Balance::from(threshold)))
    }

    /// Deposit change of adding or removing one proxy. The first proxy
    /// added, or the last removed, also moves the base.
    pub fn proxy_deposit(&self, with_base: bool) -> Balance {
        if with_base {
            self.proxy_deposit_base
                .saturating_add(self.proxy_deposit_factor)
        } else {
            self.proxy_deposit_factor
        }
    }

    /// Deposit change of adding or removing one announcement.
    pub fn announcement_deposit(&self, with_base: bool) -> Balance {
        if with_base {
            self.announcement_deposit_base
                .saturating_add(self.announcement_deposit_factor)
        } else {
            self.announcement_deposit_factor
        }
    }
}

/// A multisig operation awaiting approvals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMultisig {
    /// Timepoint of the first approval.
    pub when: Timepoint,
    /// Deposit reserved by the depositor.
    pub deposit: Balance,
    /// The member that opened the operation.
    pub depositor: AccountId,
    /// Members that approved so far.
    pub approvals: Vec<AccountId>,
}

/// One registered proxy of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyDefinition {
    /// The proxy.
    pub delegate: AccountId,
    /// Its permission scope.
    pub proxy_type: ProxyType,
    /// Its announcement delay.
    pub delay: BlockNumber,
}

/// The proxies of an account and the deposit held for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyList {
    /// Registered proxies.
    pub definitions: Vec<ProxyDefinition>,
    /// Deposit held.
    pub deposit: Balance,
}

/// A call hash announced by a delayed proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    /// The account the call will be dispatched for.
    pub real: AccountId,
    /// Hash of the announced call.
    pub call_hash: CallHash,
    /// Block the announcement was made at.
    pub height: BlockNumber,
}

/// The announcements of a delegate and the deposit held for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementList {
    /// Outstanding announcements.
    pub announcements: Vec<Announcement>,
    /// Deposit held.
    pub deposit: Balance,
}

/// Read access to the chain state composition and deposit accounting
/// depend on.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait ChainState: SharedSource {
    /// The pending operation of `multisig` for `call_hash`, if any.
    async fn multisig(
        &self,
        multisig: &AccountId,
        call_hash: &CallHash,
    ) -> Result<Option<PendingMultisig>, ChainStateError>;

    /// The proxies registered for `real`.
    async fn proxies(&self, real: &AccountId) -> Result<ProxyList, ChainStateError>;

    /// The announcements made by `delegate`.
    async fn announcements(&self, delegate: &AccountId) -> Result<AnnouncementList, ChainStateError>;

    /// The pallets' deposit parameters.
    async fn constants(&self) -> Result<DepositConstants, ChainStateError>;

    /// Pallet and proxy type numbering of the runtime, read from its
    /// metadata. Call hashes are computed against it.
    async fn call_indices(&self) -> Result<CallIndices, ChainStateError>;

    /// Estimated dispatch weight of `call`.
    async fn call_weight(&self, call: &Call) -> Result<Weight, ChainStateError>;

    /// The current best block.
    async fn block_number(&self) -> Result<BlockNumber, ChainStateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_charges_the_base_only_at_the_edges() {
        let constants = DepositConstants {
            deposit_base: 100,
            deposit_factor: 10,
            proxy_deposit_base: 50,
            proxy_deposit_factor: 5,
            announcement_deposit_base: 20,
            announcement_deposit_factor: 2,
        };

        assert_eq!(constants.multisig_deposit(3), 130);
        assert_eq!(constants.proxy_deposit(true), 55);
        assert_eq!(constants.proxy_deposit(false), 5);
        assert_eq!(constants.announcement_deposit(true), 22);
        assert_eq!(constants.announcement_deposit(false), 2);
    }
}
