use std::collections::{BTreeMap, BTreeSet};

use mandate_account::{AccountGraph, FilterPath, Path, ResolveError, resolve_paths};
use mandate_call::{
    BlockNumber, Call, CallHash, CallIndices, EncodeError, MultisigCall, ProxyCall, call_filter,
};
use mandate_common::{AccountId, SharedCell};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{ChainState, ChainStateError};

/// Errors raised while composing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// A proxy step may not dispatch the call.
    #[error(transparent)]
    Filter(#[from] mandate_call::FilterError),

    /// No signer can act for the origin.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Chain state needed for wrapping could not be read.
    #[error(transparent)]
    ChainState(#[from] ChainStateError),

    /// A call cannot be encoded for the runtime.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Neither the registry nor a pending transaction holds the call.
    #[error("No call known for hash {0}")]
    UnknownCall(CallHash),

    /// The route has no steps.
    #[error("Signing path is empty")]
    EmptyPath,
}

/// How a call reaches the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `signer` dispatches the call itself.
    Direct(AccountId),
    /// The call is wrapped along a signing path.
    Path(Path),
}

/// A transaction ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composed {
    /// The outermost call.
    pub transaction: Call,
    /// The account that signs it.
    pub signer: AccountId,
}

/// A transaction started earlier that a new one may continue, as reported
/// by the transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    /// The account acted for.
    pub real: AccountId,
    /// The proxy that acted, if it was a proxy step.
    pub delegate: Option<AccountId>,
    /// Hash of the call.
    pub call_hash: CallHash,
    /// The call itself, when the history recorded it.
    pub call: Option<Call>,
    /// Block the call was announced at, for delayed proxies.
    pub announced_at: Option<BlockNumber>,
}

/// Calls known by hash.
///
/// Announcements and hash-only multisig approvals put only a call's hash on
/// chain; the registry keeps the full call so it can be dispatched later.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: SharedCell<BTreeMap<CallHash, Call>>,
}

impl CallRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers `call` under `call_hash`.
    pub fn register(&self, call_hash: CallHash, call: Call) {
        self.calls.write().insert(call_hash, call);
    }

    /// The call with `hash`, if registered.
    pub fn get(&self, hash: &CallHash) -> Option<Call> {
        self.calls.read().get(hash).cloned()
    }
}

/// Wraps calls for dispatch along signing paths.
pub struct Composer<C> {
    chain: C,
    registry: CallRegistry,
    pending: SharedCell<Vec<PendingTransaction>>,
}

impl<C: ChainState> Composer<C> {
    /// Creates a composer reading from `chain`.
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            registry: CallRegistry::new(),
            pending: SharedCell::default(),
        }
    }

    /// The chain state reader.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Calls registered by announcements.
    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    /// Replaces the known pending transactions.
    pub fn set_pending(&self, pending: Vec<PendingTransaction>) {
        *self.pending.write() = pending;
    }

    /// Wraps `call` for `route`.
    ///
    /// Path steps are applied from the origin side back to the signer, so
    /// the step at index 0 produces the outermost call. Proxy steps are
    /// checked against their permission scope before wrapping.
    pub async fn build_tx(&self, call: Call, route: Route) -> Result<Composed, ComposeError> {
        let path = match route {
            Route::Direct(signer) => {
                return Ok(Composed {
                    transaction: call,
                    signer,
                });
            }
            Route::Path(path) => path,
        };
        let signer = *path.first().ok_or(ComposeError::EmptyPath)?.address();
        let indices = self.chain.call_indices().await?;

        let mut call = call;
        for step in path.iter().rev() {
            call = self.wrap(step, call, &indices).await?;
        }

        Ok(Composed {
            transaction: call,
            signer,
        })
    }

    /// Continues an action of which only the hash is at hand, such as an
    /// announcement found on chain or a multisig operation approved by hash.
    ///
    /// The call is taken from the registry, or else from a pending
    /// transaction that recorded it, and wrapped for `route` like
    /// [`build_tx`](Composer::build_tx) would. A delayed proxy step whose
    /// announcement has matured therefore yields `proxy.proxyAnnounced`.
    pub async fn continue_tx(
        &self,
        call_hash: &CallHash,
        route: Route,
    ) -> Result<Composed, ComposeError> {
        let call = self
            .known_call(call_hash)
            .ok_or(ComposeError::UnknownCall(*call_hash))?;
        debug!(%call_hash, method = call.method(), "Continuing known call");
        self.build_tx(call, route).await
    }

    /// Resolves a signer for the origin of `graph` among `controlled` and
    /// wraps `call` along the first path found.
    pub async fn build_for(
        &self,
        graph: &AccountGraph,
        controlled: &BTreeSet<AccountId>,
        call: Call,
    ) -> Result<Composed, ComposeError> {
        let path = resolve_paths(graph, controlled)?
            .into_iter()
            .next()
            .ok_or(ComposeError::EmptyPath)?;
        self.build_tx(call, Route::Path(path)).await
    }

    async fn wrap(
        &self,
        step: &FilterPath,
        call: Call,
        indices: &CallIndices,
    ) -> Result<Call, ComposeError> {
        match step {
            FilterPath::Origin { .. } => Ok(call),
            FilterPath::Multisig {
                threshold: 1,
                other_signatories,
                ..
            } => Ok(MultisigCall::AsMultiThreshold1 {
                other_signatories: other_signatories.clone(),
                call: Box::new(call),
            }
            .into()),
            FilterPath::Multisig {
                multisig_address,
                threshold,
                other_signatories,
                ..
            } => {
                let call_hash = call.hash_with(indices)?;
                let pending = self.chain.multisig(multisig_address, &call_hash).await?;
                let max_weight = self.chain.call_weight(&call).await?;
                Ok(MultisigCall::AsMulti {
                    threshold: *threshold,
                    other_signatories: other_signatories.clone(),
                    maybe_timepoint: pending.map(|pending| pending.when),
                    call: Box::new(call),
                    max_weight,
                }
                .into())
            }
            FilterPath::Proxy {
                real,
                proxy_type,
                delay,
                address,
            } => {
                call_filter(*proxy_type, real, &call)?;

                if *delay == 0 {
                    return Ok(ProxyCall::Proxy {
                        real: *real,
                        force_proxy_type: Some(*proxy_type),
                        call: Box::new(call),
                    }
                    .into());
                }

                let call_hash = call.hash_with(indices)?;
                if self.announcement_ready(real, address, &call_hash, *delay).await? {
                    debug!(%real, delegate = %address, %call_hash, "Executing announced call");
                    return Ok(ProxyCall::ProxyAnnounced {
                        delegate: *address,
                        real: *real,
                        force_proxy_type: Some(*proxy_type),
                        call: Box::new(call),
                    }
                    .into());
                }

                self.registry.register(call_hash, call);
                debug!(%real, delegate = %address, %call_hash, delay, "Announcing delayed call");
                Ok(ProxyCall::Announce {
                    real: *real,
                    call_hash,
                }
                .into())
            }
        }
    }

    fn known_call(&self, call_hash: &CallHash) -> Option<Call> {
        self.registry.get(call_hash).or_else(|| {
            self.pending
                .read()
                .iter()
                .filter(|pending| pending.call_hash == *call_hash)
                .find_map(|pending| pending.call.clone())
        })
    }

    async fn announcement_ready(
        &self,
        real: &AccountId,
        delegate: &AccountId,
        call_hash: &CallHash,
        delay: BlockNumber,
    ) -> Result<bool, ChainStateError> {
        let announced_at = self
            .pending
            .read()
            .iter()
            .filter(|pending| {
                pending.real == *real
                    && pending.delegate.as_ref() == Some(delegate)
                    && pending.call_hash == *call_hash
            })
            .find_map(|pending| pending.announced_at);

        let Some(announced_at) = announced_at else {
            return Ok(false);
        };
        let now = self.chain.block_number().await?;
        Ok(announced_at.saturating_add(delay) <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DepositConstants, MemoryChainState, PendingMultisig};
    use mandate_call::{FilterError, ProxyType, Timepoint, Weight};
    use mandate_common::multisig_address;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn account(byte: u8) -> AccountId {
        AccountId([byte; 32])
    }

    fn transfer() -> Call {
        Call::other("balances", "transferKeepAlive", [5, 3, 0, 9])
    }

    fn hash(call: &Call) -> CallHash {
        call.hash_with(&CallIndices::default()).unwrap()
    }

    fn composer() -> Composer<MemoryChainState> {
        let weight = Weight {
            ref_time: 1_000,
            proof_size: 64,
        };
        Composer::new(MemoryChainState::new(DepositConstants::default()).with_call_weight(weight))
    }

    fn proxy_step(real: AccountId, proxy_type: ProxyType, delay: BlockNumber, address: AccountId) -> FilterPath {
        FilterPath::Proxy {
            real,
            proxy_type,
            delay,
            address,
        }
    }

    #[tokio::test]
    async fn it_passes_direct_calls_through() -> TestResult {
        let composed = composer().build_tx(transfer(), Route::Direct(account(1))).await?;
        assert_eq!(
            composed,
            Composed {
                transaction: transfer(),
                signer: account(1),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_continues_a_pending_multisig_operation() -> TestResult {
        let composer = composer();
        let (a, b) = (account(1), account(2));
        let multisig = multisig_address([&a, &b], 2);
        let when = Timepoint {
            height: 40,
            index: 2,
        };
        composer.chain().set_multisig(
            multisig,
            hash(&transfer()),
            PendingMultisig {
                when,
                deposit: 10,
                depositor: b,
                approvals: vec![b],
            },
        );

        let path = vec![FilterPath::Multisig {
            multisig_address: multisig,
            threshold: 2,
            other_signatories: vec![b],
            address: a,
        }];
        let composed = composer.build_tx(transfer(), Route::Path(path)).await?;

        assert_eq!(composed.signer, a);
        assert_eq!(
            composed.transaction,
            Call::from(MultisigCall::AsMulti {
                threshold: 2,
                other_signatories: vec![b],
                maybe_timepoint: Some(when),
                call: Box::new(transfer()),
                max_weight: Weight {
                    ref_time: 1_000,
                    proof_size: 64,
                },
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_wraps_from_the_origin_outwards() -> TestResult {
        let (a, b, multisig, pure) = (account(1), account(2), account(3), account(4));
        let path = vec![
            FilterPath::Multisig {
                multisig_address: multisig,
                threshold: 1,
                other_signatories: vec![b],
                address: a,
            },
            proxy_step(pure, ProxyType::Any, 0, multisig),
        ];

        let composed = composer().build_tx(transfer(), Route::Path(path)).await?;

        assert_eq!(composed.signer, a);
        assert_eq!(
            composed.transaction,
            Call::from(MultisigCall::AsMultiThreshold1 {
                other_signatories: vec![b],
                call: Box::new(
                    ProxyCall::Proxy {
                        real: pure,
                        force_proxy_type: Some(ProxyType::Any),
                        call: Box::new(transfer()),
                    }
                    .into()
                ),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_announces_then_executes_delayed_calls() -> TestResult {
        let composer = composer();
        let (delegate, real) = (account(1), account(2));
        let path = vec![proxy_step(real, ProxyType::Any, 10, delegate)];

        let announced = composer
            .build_tx(transfer(), Route::Path(path.clone()))
            .await?;
        assert_eq!(
            announced.transaction,
            Call::from(ProxyCall::Announce {
                real,
                call_hash: hash(&transfer()),
            })
        );
        assert_eq!(composer.registry().get(&hash(&transfer())), Some(transfer()));

        composer.set_pending(vec![PendingTransaction {
            real,
            delegate: Some(delegate),
            call_hash: hash(&transfer()),
            call: Some(transfer()),
            announced_at: Some(100),
        }]);

        composer.chain().set_block_number(105);
        let early = composer
            .build_tx(transfer(), Route::Path(path.clone()))
            .await?;
        assert!(matches!(
            early.transaction,
            Call::Proxy(ProxyCall::Announce { .. })
        ));

        composer.chain().set_block_number(110);
        let executed = composer.build_tx(transfer(), Route::Path(path)).await?;
        assert_eq!(
            executed.transaction,
            Call::from(ProxyCall::ProxyAnnounced {
                delegate,
                real,
                force_proxy_type: Some(ProxyType::Any),
                call: Box::new(transfer()),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_executes_a_matured_announcement_from_its_hash() -> TestResult {
        let composer = composer();
        let (delegate, real) = (account(1), account(2));
        let path = vec![proxy_step(real, ProxyType::Any, 10, delegate)];

        composer
            .build_tx(transfer(), Route::Path(path.clone()))
            .await?;
        composer.set_pending(vec![PendingTransaction {
            real,
            delegate: Some(delegate),
            call_hash: hash(&transfer()),
            call: None,
            announced_at: Some(100),
        }]);
        composer.chain().set_block_number(120);

        let executed = composer
            .continue_tx(&hash(&transfer()), Route::Path(path))
            .await?;

        assert_eq!(executed.signer, delegate);
        assert_eq!(
            executed.transaction,
            Call::from(ProxyCall::ProxyAnnounced {
                delegate,
                real,
                force_proxy_type: Some(ProxyType::Any),
                call: Box::new(transfer()),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_continues_calls_recorded_by_the_history() -> TestResult {
        let composer = composer();
        let (a, b, pure) = (account(1), account(2), account(3));
        let multisig = multisig_address([&a, &b], 2);
        let proxied = Call::from(ProxyCall::Proxy {
            real: pure,
            force_proxy_type: Some(ProxyType::Any),
            call: Box::new(transfer()),
        });
        let when = Timepoint {
            height: 12,
            index: 1,
        };
        composer.chain().set_multisig(
            multisig,
            hash(&proxied),
            PendingMultisig {
                when,
                deposit: 10,
                depositor: b,
                approvals: vec![b],
            },
        );
        composer.set_pending(vec![PendingTransaction {
            real: multisig,
            delegate: None,
            call_hash: hash(&proxied),
            call: Some(proxied.clone()),
            announced_at: None,
        }]);

        // The member approving second only knows the operation's hash.
        let path = vec![FilterPath::Multisig {
            multisig_address: multisig,
            threshold: 2,
            other_signatories: vec![b],
            address: a,
        }];
        let composed = composer
            .continue_tx(&hash(&proxied), Route::Path(path.clone()))
            .await?;

        assert_eq!(
            composed.transaction,
            Call::from(MultisigCall::AsMulti {
                threshold: 2,
                other_signatories: vec![b],
                maybe_timepoint: Some(when),
                call: Box::new(proxied),
                max_weight: Weight {
                    ref_time: 1_000,
                    proof_size: 64,
                },
            })
        );

        let unknown = hash(&Call::other("system", "remark", [0, 0, 0]));
        assert_eq!(
            composer.continue_tx(&unknown, Route::Path(path)).await,
            Err(ComposeError::UnknownCall(unknown))
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_refuses_scopes_the_runtime_does_not_define() {
        let (a, b, multisig, real) = (account(1), account(2), account(3), account(4));
        let path = vec![
            FilterPath::Multisig {
                multisig_address: multisig,
                threshold: 2,
                other_signatories: vec![b],
                address: a,
            },
            proxy_step(real, ProxyType::Assets, 0, multisig),
        ];
        let call = Call::other("assets", "transfer", [50, 8]);

        let result = composer().build_tx(call, Route::Path(path)).await;

        assert!(matches!(result, Err(ComposeError::Encode(_))));
    }

    #[tokio::test]
    async fn it_fails_fast_on_denied_proxy_steps() {
        let (delegate, real) = (account(1), account(2));
        let path = vec![proxy_step(real, ProxyType::Governance, 0, delegate)];

        let result = composer().build_tx(transfer(), Route::Path(path)).await;

        assert!(matches!(
            result,
            Err(ComposeError::Filter(FilterError::PermissionDenied { .. }))
        ));
    }

    #[tokio::test]
    async fn it_rejects_empty_paths() {
        let result = composer().build_tx(transfer(), Route::Path(Vec::new())).await;
        assert_eq!(result, Err(ComposeError::EmptyPath));
    }
}
