//! Per-address capability metadata.
//!
//! A single address can play several roles across graphs: a member of one
//! multisig, a proxy of a pure account, the origin of another graph. Each
//! role sets its own attributes on the address' [`AddressMeta`], so flags
//! are independent and merges never clear what another traversal found.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use mandate_call::{BlockNumber, ProxyType};
use mandate_common::{AccountId, ChainId, SharedCell};
use serde::Serialize;
use tokio::sync::watch;

use crate::{AccountGraph, AccountKind, NodeId};

/// Flattened capabilities of one address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMeta {
    /// Display name, first non-empty wins.
    pub name: Option<String>,
    /// Registered through the wallet service, first set wins.
    pub is_mimir: bool,

    /// Controlled by a key held in the connected wallet.
    pub is_injected: bool,

    /// Is a multisig account.
    pub is_multisig: bool,
    /// Multisig threshold (or, for a pure account controlled by a single
    /// multisig, that multisig's threshold).
    pub threshold: Option<u16>,
    /// Multisig members (or those of a pure account's single multisig).
    pub who: Vec<AccountId>,

    /// Is a pure proxy account.
    pub is_pure: bool,
    /// Pure account creator.
    pub creator: Option<AccountId>,
    /// Pure account creation block.
    pub created_block: Option<BlockNumber>,
    /// Pure account creation extrinsic index.
    pub created_extrinsic_index: Option<u32>,
    /// Pure account disambiguation index.
    pub disambiguation_index: Option<u16>,
    /// Chain the pure account was created on.
    pub pure_network: Option<ChainId>,

    /// Has at least one delegatee.
    pub is_proxied: bool,
    /// Chains the account's proxy relations are registered on.
    pub proxy_networks: BTreeSet<ChainId>,
    /// More than one delegatee is a multisig.
    pub multiple_multisig: bool,

    /// Is a delegatee of some account.
    pub is_proxy: bool,
    /// Scope of the (last seen) proxy relation.
    pub proxy_type: Option<ProxyType>,
    /// Chain of the (last seen) proxy relation.
    pub network: Option<ChainId>,
    /// Delay of the (last seen) proxy relation.
    pub delay: Option<BlockNumber>,
}

/// Metadata keyed by address.
pub type MetaMap = BTreeMap<AccountId, AddressMeta>;

impl AddressMeta {
    fn merge_identity(&mut self, name: Option<&str>, is_mimir: bool) {
        if self.name.as_deref().is_none_or(str::is_empty) {
            if let Some(name) = name.filter(|name| !name.is_empty()) {
                self.name = Some(name.to_string());
            }
        }
        self.is_mimir |= is_mimir;
    }

    /// Folds `other`, derived by another traversal, into this record.
    ///
    /// Flags accumulate, name and `is_mimir` keep the first non-empty
    /// value, `proxy_networks` is a union and every other attribute takes
    /// `other`'s value when `other` has one.
    pub fn merge(&mut self, other: &AddressMeta) {
        self.merge_identity(other.name.as_deref(), other.is_mimir);
        self.is_injected |= other.is_injected;

        if other.is_multisig || other.threshold.is_some() {
            self.is_multisig |= other.is_multisig;
            self.threshold = other.threshold;
            self.who = other.who.clone();
        }

        if other.is_pure {
            self.is_pure = true;
            self.creator = other.creator;
            self.created_block = other.created_block;
            self.created_extrinsic_index = other.created_extrinsic_index;
            self.disambiguation_index = other.disambiguation_index;
            self.pure_network = other.pure_network.clone();
        }

        if other.is_proxied {
            self.is_proxied = true;
            self.proxy_networks
                .extend(other.proxy_networks.iter().cloned());
            self.multiple_multisig = other.multiple_multisig;
        }

        if other.is_proxy {
            self.is_proxy = true;
            self.proxy_type = other.proxy_type;
            self.network = other.network.clone();
            self.delay = other.delay;
        }
    }
}

/// Derives metadata for every account reachable from the graph's origin
/// into `metas`.
pub fn derive_meta(graph: &AccountGraph, metas: &mut MetaMap) {
    let mut visited = HashSet::new();
    derive_node(graph, graph.root_id(), metas, &mut visited);
}

fn derive_node(
    graph: &AccountGraph,
    node: NodeId,
    metas: &mut MetaMap,
    visited: &mut HashSet<NodeId>,
) {
    if !visited.insert(node) {
        return;
    }

    let account = graph.node(node);
    let meta = metas.entry(account.id).or_default();
    meta.merge_identity(account.name.as_deref(), account.is_mimir);

    match &account.kind {
        AccountKind::Multisig { threshold, members } => {
            meta.is_multisig = true;
            meta.threshold = Some(*threshold);
            meta.who = members.iter().map(|member| graph.node(*member).id).collect();

            for member in members {
                let derived = metas
                    .get(&graph.node(*member).id)
                    .is_some_and(|meta| meta.is_multisig && !meta.who.is_empty());
                if !derived {
                    derive_node(graph, *member, metas, visited);
                }
            }
        }
        AccountKind::Pure {
            creator,
            creation_block,
            creation_extrinsic,
            disambiguation_index,
            origin_network,
        } => {
            meta.is_pure = true;
            meta.creator = Some(*creator);
            meta.created_block = Some(*creation_block);
            meta.created_extrinsic_index = Some(*creation_extrinsic);
            meta.disambiguation_index = Some(*disambiguation_index);
            meta.pure_network = Some(origin_network.clone());

            let mut multisigs = account
                .delegatees
                .iter()
                .map(|delegatee| graph.node(delegatee.node))
                .filter(|delegatee| delegatee.threshold().is_some());
            // Only collapse a single controlling multisig into the pure
            // account; with several there is no one threshold to show.
            if let (Some(multisig), None) = (multisigs.next(), multisigs.next()) {
                meta.threshold = multisig.threshold();
                meta.who = multisig
                    .members()
                    .iter()
                    .map(|member| graph.node(*member).id)
                    .collect();
            }
        }
        AccountKind::Plain => {}
    }

    if !account.delegatees.is_empty() {
        let meta = metas.entry(account.id).or_default();
        meta.is_proxied = true;
        meta.proxy_networks.extend(
            account
                .delegatees
                .iter()
                .map(|delegatee| delegatee.proxy_network.clone()),
        );
        meta.multiple_multisig = account
            .delegatees
            .iter()
            .filter(|delegatee| graph.node(delegatee.node).threshold().is_some())
            .count()
            > 1;
    }

    for delegatee in &account.delegatees {
        let proxy = graph.node(delegatee.node);
        let meta = metas.entry(proxy.id).or_default();
        meta.is_proxy = true;
        meta.proxy_type = Some(delegatee.proxy_type);
        meta.network = Some(delegatee.proxy_network.clone());
        meta.delay = Some(delegatee.proxy_delay);

        derive_node(graph, delegatee.node, metas, visited);
    }
}

/// The merged metadata of every known account.
///
/// Readers take cheap [`snapshot`](MetaStore::snapshot)s; writers merge a
/// whole graph at once, so a reader never observes a half-applied
/// traversal. Every change bumps a version observable through
/// [`subscribe`](MetaStore::subscribe).
#[derive(Debug)]
pub struct MetaStore {
    entries: SharedCell<Arc<MetaMap>>,
    version: watch::Sender<u64>,
}

impl Default for MetaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: SharedCell::new(Arc::new(MetaMap::new())),
            version: watch::Sender::new(0),
        }
    }

    /// The current metadata.
    pub fn snapshot(&self) -> Arc<MetaMap> {
        self.entries.read().clone()
    }

    /// The current metadata of one address.
    pub fn get(&self, id: &AccountId) -> Option<AddressMeta> {
        self.entries.read().get(id).cloned()
    }

    /// Derives metadata from every graph and merges it per address.
    pub fn merge<'a, I>(&self, graphs: I)
    where
        I: IntoIterator<Item = &'a AccountGraph>,
    {
        let mut scratch = MetaMap::new();
        for graph in graphs {
            derive_meta(graph, &mut scratch);
        }
        self.apply(|entries| {
            for (id, derived) in scratch {
                entries.entry(id).or_default().merge(&derived);
            }
        });
    }

    /// Flags exactly `controlled` as wallet-controlled.
    pub fn mark_injected(&self, controlled: &BTreeSet<AccountId>) {
        self.apply(|entries| {
            for (id, meta) in entries.iter_mut() {
                meta.is_injected = controlled.contains(id);
            }
            for id in controlled {
                entries.entry(*id).or_default().is_injected = true;
            }
        });
    }

    /// Observes the store version, bumped on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn apply(&self, change: impl FnOnce(&mut MetaMap)) {
        self.entries.update(|entries| {
            let mut next = MetaMap::clone(entries);
            change(&mut next);
            *entries = Arc::new(next);
        });
        self.version.send_modify(|version| *version += 1);
    }
}
