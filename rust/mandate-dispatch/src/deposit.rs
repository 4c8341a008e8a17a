//! Predicted collateral movements of a call.
//!
//! The multisig and proxy pallets lock a deposit on whoever opens an
//! operation, registers a proxy or announces a call, and release it when
//! the operation completes. [`deposit_effects`] walks a call tree the way
//! the runtime would dispatch it and reports what each account will have
//! reserved and unreserved.
//!
//! The walk is breadth first: every call at one nesting level issues its
//! chain reads concurrently, and the level's inner calls are inspected once
//! all of them resolved. Effects are applied in call order, so batches
//! accumulate deterministically.

use std::collections::BTreeMap;
use std::iter::once;
use std::sync::Arc;

use futures::future::join_all;
use mandate_call::{Balance, BlockNumber, Call, CallIndices, MultisigCall, ProxyCall};
use mandate_common::{AccountId, Latest, multisig_address};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{ChainState, ChainStateError, DepositConstants};

/// Why a deposit moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReserveCause {
    /// A multisig operation was opened or closed.
    MultisigDeposit,
    /// A proxy or pure account was registered or removed.
    ProxyDeposit,
    /// An announcement was made or withdrawn.
    AnnouncementDeposit,
}

/// Accumulated deposit movement of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReserveEntry {
    /// Total amount.
    pub amount: Balance,
    /// Cause of the first movement recorded.
    pub cause: ReserveCause,
}

/// Deposit movements a call will cause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepositEffects {
    /// Amounts newly reserved, by account.
    pub reserve: BTreeMap<AccountId, ReserveEntry>,
    /// Amounts released, by account.
    pub unreserve: BTreeMap<AccountId, ReserveEntry>,
    /// Announcement delays that apply, by the account acted for.
    pub delay: BTreeMap<AccountId, BlockNumber>,
}

impl DepositEffects {
    /// Whether the call moves no deposit and waits on no delay.
    pub fn is_empty(&self) -> bool {
        self.reserve.is_empty() && self.unreserve.is_empty() && self.delay.is_empty()
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Reserve(who, amount, cause) => accumulate(&mut self.reserve, who, amount, cause),
            Effect::Unreserve(who, amount, cause) => {
                accumulate(&mut self.unreserve, who, amount, cause)
            }
            Effect::Delay(real, delay) => {
                let entry = self.delay.entry(real).or_default();
                *entry = (*entry).max(delay);
            }
        }
    }
}

fn accumulate(
    entries: &mut BTreeMap<AccountId, ReserveEntry>,
    who: AccountId,
    amount: Balance,
    cause: ReserveCause,
) {
    if amount == 0 {
        return;
    }
    entries
        .entry(who)
        .and_modify(|entry| entry.amount = entry.amount.saturating_add(amount))
        .or_insert(ReserveEntry { amount, cause });
}

enum Effect {
    Reserve(AccountId, Balance, ReserveCause),
    Unreserve(AccountId, Balance, ReserveCause),
    Delay(AccountId, BlockNumber),
}

#[derive(Default)]
struct Inspection<'c> {
    effects: Vec<Effect>,
    inner: Vec<(AccountId, &'c Call)>,
}

/// Computes the deposit movements of `call` submitted by `signer`.
///
/// Best effort: a chain read that fails is logged and the movement that
/// depended on it is left out.
pub async fn deposit_effects<C>(chain: &C, signer: &AccountId, call: &Call) -> DepositEffects
where
    C: ChainState + ?Sized,
{
    let mut effects = DepositEffects::default();
    let (constants, indices) = match futures::join!(chain.constants(), chain.call_indices()) {
        (Ok(constants), Ok(indices)) => (constants, indices),
        (Err(error), _) | (_, Err(error)) => {
            warn!(%error, "Runtime parameters unavailable");
            return effects;
        }
    };

    let mut level = vec![(*signer, call)];
    while !level.is_empty() {
        let inspections = join_all(
            level
                .iter()
                .map(|&(who, call)| inspect(chain, &constants, &indices, who, call)),
        )
        .await;

        level = Vec::new();
        for inspection in inspections {
            for effect in inspection.effects {
                effects.apply(effect);
            }
            level.extend(inspection.inner);
        }
    }

    effects
}

fn read<T>(result: Result<T, ChainStateError>, what: &str, key: &AccountId) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%error, %key, what, "Chain read failed, leaving its deposit out");
            None
        }
    }
}

async fn inspect<'c, C>(
    chain: &C,
    constants: &DepositConstants,
    indices: &CallIndices,
    who: AccountId,
    call: &'c Call,
) -> Inspection<'c>
where
    C: ChainState + ?Sized,
{
    let mut inspection = Inspection::default();

    match call {
        Call::Multisig(MultisigCall::AsMulti {
            threshold,
            other_signatories,
            call: inner,
            ..
        }) => {
            let multisig = multisig_address(other_signatories.iter().chain(once(&who)), *threshold);
            let call_hash = match inner.hash_with(indices) {
                Ok(call_hash) => call_hash,
                Err(error) => {
                    warn!(%error, %multisig, "Cannot hash multisig call, leaving its deposit out");
                    return inspection;
                }
            };
            let pending = chain.multisig(&multisig, &call_hash).await;
            match read(pending, "multisig", &multisig) {
                Some(None) => inspection.effects.push(Effect::Reserve(
                    who,
                    constants.multisig_deposit(*threshold),
                    ReserveCause::MultisigDeposit,
                )),
                Some(Some(pending))
                    if pending.approvals.len() + 1 >= usize::from(*threshold) =>
                {
                    debug!(%multisig, "Final approval, dispatching inner call");
                    inspection.effects.push(Effect::Unreserve(
                        pending.depositor,
                        pending.deposit,
                        ReserveCause::MultisigDeposit,
                    ));
                    inspection.inner.push((multisig, &**inner));
                }
                Some(Some(_)) | None => {}
            }
        }
        Call::Multisig(MultisigCall::ApproveAsMulti {
            threshold,
            other_signatories,
            call_hash,
            ..
        }) => {
            let multisig = multisig_address(other_signatories.iter().chain(once(&who)), *threshold);
            let pending = chain.multisig(&multisig, call_hash).await;
            if let Some(None) = read(pending, "multisig", &multisig) {
                inspection.effects.push(Effect::Reserve(
                    who,
                    constants.multisig_deposit(*threshold),
                    ReserveCause::MultisigDeposit,
                ));
            }
        }
        Call::Multisig(MultisigCall::AsMultiThreshold1 {
            other_signatories,
            call: inner,
        }) => {
            let multisig = multisig_address(other_signatories.iter().chain(once(&who)), 1);
            inspection.inner.push((multisig, &**inner));
        }
        Call::Multisig(MultisigCall::CancelAsMulti {
            threshold,
            other_signatories,
            call_hash,
            ..
        }) => {
            let multisig = multisig_address(other_signatories.iter().chain(once(&who)), *threshold);
            let pending = chain.multisig(&multisig, call_hash).await;
            if let Some(Some(pending)) = read(pending, "multisig", &multisig) {
                inspection.effects.push(Effect::Unreserve(
                    pending.depositor,
                    pending.deposit,
                    ReserveCause::MultisigDeposit,
                ));
            }
        }

        Call::Proxy(ProxyCall::Proxy {
            real, call: inner, ..
        }) => inspection.inner.push((*real, &**inner)),
        Call::Proxy(ProxyCall::Announce { real, .. }) => {
            let (announcements, proxies) =
                futures::join!(chain.announcements(&who), chain.proxies(real));
            if let Some(announcements) = read(announcements, "announcements", &who) {
                inspection.effects.push(Effect::Reserve(
                    who,
                    constants.announcement_deposit(announcements.announcements.is_empty()),
                    ReserveCause::AnnouncementDeposit,
                ));
            }
            if let Some(proxies) = read(proxies, "proxies", real) {
                let delay = proxies
                    .definitions
                    .iter()
                    .filter(|definition| definition.delegate == who)
                    .map(|definition| definition.delay)
                    .max();
                if let Some(delay) = delay.filter(|delay| *delay > 0) {
                    inspection.effects.push(Effect::Delay(*real, delay));
                }
            }
        }
        Call::Proxy(ProxyCall::ProxyAnnounced {
            delegate,
            real,
            call: inner,
            ..
        }) => {
            let announcements = chain.announcements(delegate).await;
            if let Some(announcements) = read(announcements, "announcements", delegate) {
                inspection
                    .effects
                    .push(release_announcement(constants, *delegate, announcements.announcements.len()));
            }
            inspection.inner.push((*real, &**inner));
        }
        Call::Proxy(ProxyCall::RemoveAnnouncement { .. }) => {
            let announcements = chain.announcements(&who).await;
            if let Some(announcements) = read(announcements, "announcements", &who) {
                inspection
                    .effects
                    .push(release_announcement(constants, who, announcements.announcements.len()));
            }
        }
        Call::Proxy(ProxyCall::RejectAnnouncement { delegate, .. }) => {
            let announcements = chain.announcements(delegate).await;
            if let Some(announcements) = read(announcements, "announcements", delegate) {
                inspection
                    .effects
                    .push(release_announcement(constants, *delegate, announcements.announcements.len()));
            }
        }
        Call::Proxy(ProxyCall::CreatePure { .. }) => inspection.effects.push(Effect::Reserve(
            who,
            constants.proxy_deposit(true),
            ReserveCause::ProxyDeposit,
        )),
        Call::Proxy(ProxyCall::AddProxy { .. }) => {
            let proxies = chain.proxies(&who).await;
            if let Some(proxies) = read(proxies, "proxies", &who) {
                inspection.effects.push(Effect::Reserve(
                    who,
                    constants.proxy_deposit(proxies.definitions.is_empty()),
                    ReserveCause::ProxyDeposit,
                ));
            }
        }
        Call::Proxy(ProxyCall::RemoveProxy { .. }) => {
            let proxies = chain.proxies(&who).await;
            if let Some(proxies) = read(proxies, "proxies", &who) {
                inspection.effects.push(Effect::Unreserve(
                    who,
                    constants.proxy_deposit(proxies.definitions.len() <= 1),
                    ReserveCause::ProxyDeposit,
                ));
            }
        }
        Call::Proxy(ProxyCall::RemoveProxies) => {
            let proxies = chain.proxies(&who).await;
            if let Some(proxies) = read(proxies, "proxies", &who) {
                inspection.effects.push(Effect::Unreserve(
                    who,
                    proxies.deposit,
                    ReserveCause::ProxyDeposit,
                ));
            }
        }
        Call::Proxy(ProxyCall::KillPure { spawner, .. }) => {
            // Sent by the pure account; its proxy deposit returns to the spawner.
            let proxies = chain.proxies(&who).await;
            if let Some(proxies) = read(proxies, "proxies", &who) {
                inspection.effects.push(Effect::Unreserve(
                    *spawner,
                    proxies.deposit,
                    ReserveCause::ProxyDeposit,
                ));
            }
        }

        Call::Utility(_) | Call::Other(_) => {
            if let Some(calls) = call.batched() {
                inspection
                    .inner
                    .extend(calls.iter().map(|inner| (who, inner)));
            }
        }
    }

    inspection
}

fn release_announcement(constants: &DepositConstants, delegate: AccountId, outstanding: usize) -> Effect {
    Effect::Unreserve(
        delegate,
        constants.announcement_deposit(outstanding <= 1),
        ReserveCause::AnnouncementDeposit,
    )
}

/// Keeps the deposit effects of the most recently requested call.
///
/// A computation started before a newer one never publishes, so a slow
/// chain read cannot overwrite the effects of the call now on screen.
#[derive(Debug, Default)]
pub struct DepositWatch {
    latest: Latest<DepositEffects>,
}

impl DepositWatch {
    /// Creates an empty watch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the effects of `call`, superseding any computation in
    /// flight. Returns `None` when a newer computation started meanwhile.
    pub async fn compute<C>(
        &self,
        chain: &C,
        signer: &AccountId,
        call: &Call,
    ) -> Option<Arc<DepositEffects>>
    where
        C: ChainState + ?Sized,
    {
        let ticket = self.latest.begin();
        let effects = deposit_effects(chain, signer, call).await;
        if self.latest.commit(&ticket, effects) {
            self.latest.get()
        } else {
            debug!(generation = ticket.value(), "Discarding superseded deposit effects");
            None
        }
    }

    /// The last published effects.
    pub fn current(&self) -> Option<Arc<DepositEffects>> {
        self.latest.get()
    }
}
