use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use async_trait::async_trait;
use mandate_common::{AccountId, SharedSource, Latest, NetworkSettings, SharedCell};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{AccountGraph, AccountRecord, ChainScope, MetaStore, Path, ResolveError, resolve_paths};

/// Errors reported by an [`AccountSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The service could not be reached or refused the request.
    #[error("Account service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something that is not an account list.
    #[error("Malformed account service response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Supplies account records for a set of wallet-controlled addresses.
///
/// The records describe every origin the addresses may act for, each as a
/// nested [`AccountRecord`].
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait AccountSource: SharedSource {
    /// Fetches the records of every account `addresses` take part in.
    async fn fetch(&self, addresses: &[AccountId]) -> Result<Vec<AccountRecord>, SourceError>;
}

/// Graphs keyed by their origin.
pub type GraphMap = BTreeMap<AccountId, AccountGraph>;

/// Keeps the authority graphs of the controlled addresses current.
///
/// Each [`refresh`](Refresher::refresh) supersedes any refresh still in
/// flight; only the newest one publishes its graphs and merges their
/// metadata into the shared [`MetaStore`].
pub struct Refresher<S> {
    source: S,
    settings: NetworkSettings,
    metas: Arc<MetaStore>,
    controlled: SharedCell<BTreeSet<AccountId>>,
    graphs: Latest<GraphMap>,
}

impl<S: AccountSource> Refresher<S> {
    /// Creates a refresher with no controlled addresses.
    pub fn new(source: S, settings: NetworkSettings, metas: Arc<MetaStore>) -> Self {
        Self {
            source,
            settings,
            metas,
            controlled: SharedCell::default(),
            graphs: Latest::new(),
        }
    }

    /// The network graphs are built for.
    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    /// The shared metadata store.
    pub fn metas(&self) -> &Arc<MetaStore> {
        &self.metas
    }

    /// Replaces the set of wallet-controlled addresses.
    pub fn set_controlled(&self, controlled: BTreeSet<AccountId>) {
        self.metas.mark_injected(&controlled);
        *self.controlled.write() = controlled;
    }

    /// The wallet-controlled addresses.
    pub fn controlled(&self) -> BTreeSet<AccountId> {
        self.controlled.read().clone()
    }

    /// Fetches and rebuilds every graph.
    ///
    /// Returns `Ok(false)` when a newer refresh started while this one was
    /// waiting on the source; its results are then discarded.
    pub async fn refresh(&self) -> Result<bool, SourceError> {
        let ticket = self.graphs.begin();
        let controlled = self.controlled();
        let addresses: Vec<AccountId> = controlled.iter().copied().collect();

        let records = self.source.fetch(&addresses).await?;

        let scope = ChainScope::of(&self.settings);
        let graphs: GraphMap = records
            .iter()
            .filter_map(|record| AccountGraph::build(record, self.settings.ss58_prefix, scope))
            .map(|graph| (graph.root().id, graph))
            .collect();

        if !ticket.is_current() {
            debug!(generation = ticket.value(), "Discarding superseded account refresh");
            return Ok(false);
        }

        self.metas.merge(graphs.values());
        self.metas.mark_injected(&controlled);
        debug!(origins = graphs.len(), "Account graphs refreshed");
        Ok(self.graphs.commit(&ticket, graphs))
    }

    /// The graphs of the last successful refresh.
    pub fn graphs(&self) -> Option<Arc<GraphMap>> {
        self.graphs.get()
    }

    /// The graph rooted at `origin`.
    pub fn graph(&self, origin: &AccountId) -> Option<AccountGraph> {
        self.graphs.get()?.get(origin).cloned()
    }

    /// Every path by which a controlled address can act for `origin`.
    pub fn paths(&self, origin: &AccountId) -> Result<Vec<Path>, ResolveError> {
        match self.graph(origin) {
            Some(graph) => resolve_paths(&graph, &self.controlled.read()),
            None => Err(ResolveError::UnresolvedPath { origin: *origin }),
        }
    }

    /// Refreshes on the configured poll interval, forever.
    ///
    /// Failures are logged and retried on the next tick.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn run(&self) {
        let mut ticks = tokio::time::interval(self.settings.poll_interval());
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            if let Err(error) = self.refresh().await {
                warn!(%error, "Account refresh failed");
            }
        }
    }
}
