use std::collections::{HashMap, HashSet};

use mandate_call::{BlockNumber, ProxyType};
use mandate_common::{AccountId, ChainId, NetworkSettings, RemoteRelations, Ss58Prefix};
use tracing::{debug, warn};

use crate::{
    Account, AccountGraph, AccountKind, AccountRecord, Delegatee, NodeId, Proposer, RecordKind,
};

/// Which delegatees a graph keeps.
#[derive(Debug, Clone, Copy)]
pub enum ChainScope<'a> {
    /// Keep every delegatee regardless of the chain it is registered on.
    Unfiltered,
    /// Keep delegatees that can act on `chain`: those registered on it, and
    /// those registered on a related chain that have no local equivalent.
    Chain {
        /// The chain being viewed.
        chain: &'a ChainId,
        /// Declared remote proxy relations.
        relations: &'a RemoteRelations,
    },
}

impl<'a> ChainScope<'a> {
    /// Scopes to the chain described by `settings`.
    pub fn of(settings: &'a NetworkSettings) -> Self {
        ChainScope::Chain {
            chain: &settings.chain,
            relations: &settings.remote_relations,
        }
    }
}

impl AccountGraph {
    /// Builds a graph rooted at `record`.
    ///
    /// Every address is re-encoded with `prefix`. Parts of the record that
    /// cannot be interpreted (bad addresses, unknown proxy types, thresholds
    /// outside `1..=members`) are dropped or downgraded to a plain account.
    /// Returns `None` only when the origin's own address is unreadable.
    pub fn build(record: &AccountRecord, prefix: Ss58Prefix, scope: ChainScope<'_>) -> Option<Self> {
        let mut builder = Builder {
            prefix,
            scope,
            nodes: Vec::new(),
            index: HashMap::new(),
            in_progress: HashSet::new(),
        };

        let root = builder.insert(record)?;
        Some(AccountGraph {
            prefix,
            root,
            nodes: builder.nodes,
            index: builder.index,
        })
    }
}

struct Builder<'a> {
    prefix: Ss58Prefix,
    scope: ChainScope<'a>,
    nodes: Vec<Account>,
    index: HashMap<AccountId, NodeId>,
    in_progress: HashSet<NodeId>,
}

/// A delegatee that survived parsing, before chain filtering.
struct Candidate<'r> {
    id: AccountId,
    proxy_type: ProxyType,
    proxy_network: &'r ChainId,
    proxy_delay: BlockNumber,
    record: &'r AccountRecord,
}

impl Candidate<'_> {
    fn equivalent(&self, other: &Candidate<'_>) -> bool {
        self.id == other.id
            && self.proxy_delay == other.proxy_delay
            && self.proxy_type == other.proxy_type
    }
}

fn parse_address(address: &str) -> Option<AccountId> {
    match address.parse() {
        Ok(id) => Some(id),
        Err(error) => {
            warn!(address, %error, "Skipping account with unreadable address");
            None
        }
    }
}

impl Builder<'_> {
    fn insert(&mut self, record: &AccountRecord) -> Option<NodeId> {
        let id = parse_address(&record.address)?;

        let node = match self.index.get(&id) {
            Some(&node) => {
                self.merge_identity(node, record);
                // Only a bare occurrence may be upgraded by a richer one, and
                // never while it is still being built further up the stack.
                let existing = &self.nodes[node.0];
                if self.in_progress.contains(&node) || !existing.is_bare() || is_bare(record) {
                    return Some(node);
                }
                node
            }
            None => {
                let node = NodeId(self.nodes.len());
                self.nodes
                    .push(Account::bare(id, id.to_ss58(self.prefix)));
                self.index.insert(id, node);
                self.merge_identity(node, record);
                node
            }
        };

        self.in_progress.insert(node);
        let kind = self.kind(id, record);
        let delegatees = self.delegatees(record);
        let proposers = record.proposers.as_ref().map(|proposers| {
            proposers
                .iter()
                .filter_map(|proposer| {
                    Some(Proposer {
                        proposer: parse_address(&proposer.proposer)?,
                        creator: parse_address(&proposer.creator)?,
                        created_at: proposer.created_at,
                        network: proposer.network.clone(),
                    })
                })
                .collect()
        });
        self.in_progress.remove(&node);

        let account = &mut self.nodes[node.0];
        account.kind = kind;
        account.delegatees = delegatees;
        account.proposers = proposers;
        Some(node)
    }

    fn merge_identity(&mut self, node: NodeId, record: &AccountRecord) {
        let account = &mut self.nodes[node.0];
        if account.name.as_deref().is_none_or(str::is_empty) {
            if let Some(name) = record.name.as_ref().filter(|name| !name.is_empty()) {
                account.name = Some(name.clone());
            }
        }
        account.is_mimir |= record.is_mimir;
    }

    fn kind(&mut self, id: AccountId, record: &AccountRecord) -> AccountKind {
        match record.kind {
            RecordKind::Multisig => {
                let members: Vec<NodeId> = record
                    .members
                    .iter()
                    .filter_map(|member| self.insert(member))
                    .collect();
                match record.threshold {
                    Some(threshold) if threshold >= 1 && threshold as usize <= members.len() => {
                        AccountKind::Multisig { threshold, members }
                    }
                    threshold => {
                        warn!(
                            address = %id,
                            ?threshold,
                            members = members.len(),
                            "Multisig threshold out of range, treating as plain"
                        );
                        AccountKind::Plain
                    }
                }
            }
            RecordKind::Pure => {
                let creator = record.creator.as_deref().and_then(parse_address);
                match (
                    creator,
                    record.created_block,
                    record.created_extrinsic_index,
                    &record.network,
                ) {
                    (Some(creator), Some(creation_block), Some(creation_extrinsic), Some(network)) => {
                        AccountKind::Pure {
                            creator,
                            creation_block,
                            creation_extrinsic,
                            disambiguation_index: record.disambiguation_index.unwrap_or_default(),
                            origin_network: network.clone(),
                        }
                    }
                    _ => {
                        warn!(address = %id, "Pure account without creation data, treating as plain");
                        AccountKind::Plain
                    }
                }
            }
            RecordKind::Account | RecordKind::Unknown => AccountKind::Plain,
        }
    }

    fn delegatees(&mut self, record: &AccountRecord) -> Vec<Delegatee> {
        let candidates: Vec<Candidate<'_>> = record
            .delegatees
            .iter()
            .filter_map(|delegatee| {
                let proxy_type = match delegatee.proxy_type.parse::<ProxyType>() {
                    Ok(proxy_type) => proxy_type,
                    Err(error) => {
                        warn!(%error, "Skipping delegatee with unknown proxy type");
                        return None;
                    }
                };
                Some(Candidate {
                    id: parse_address(&delegatee.account.address)?,
                    proxy_type,
                    proxy_network: &delegatee.proxy_network,
                    proxy_delay: delegatee.proxy_delay,
                    record: &delegatee.account,
                })
            })
            .collect();

        let mut kept: Vec<(&Candidate<'_>, bool)> = Vec::new();
        match self.scope {
            ChainScope::Unfiltered => kept.extend(candidates.iter().map(|c| (c, false))),
            ChainScope::Chain { chain, relations } => {
                let local: Vec<&Candidate<'_>> = candidates
                    .iter()
                    .filter(|c| c.proxy_network == chain)
                    .collect();
                for candidate in &candidates {
                    if candidate.proxy_network == chain {
                        kept.push((candidate, false));
                    } else if !relations.is_related(candidate.proxy_network, chain) {
                        debug!(delegatee = %candidate.id, network = %candidate.proxy_network, "Dropping delegatee from unrelated chain");
                    } else if local.iter().any(|l| l.equivalent(candidate))
                        || kept.iter().any(|(k, _)| k.equivalent(candidate))
                    {
                        debug!(delegatee = %candidate.id, "Dropping remote delegatee with local equivalent");
                    } else {
                        kept.push((candidate, true));
                    }
                }
            }
        }

        kept.into_iter()
            .filter_map(|(candidate, is_remote_proxy)| {
                Some(Delegatee {
                    node: self.insert(candidate.record)?,
                    proxy_type: candidate.proxy_type,
                    proxy_network: candidate.proxy_network.clone(),
                    proxy_delay: candidate.proxy_delay,
                    is_remote_proxy,
                })
            })
            .collect()
    }
}

fn is_bare(record: &AccountRecord) -> bool {
    matches!(record.kind, RecordKind::Account | RecordKind::Unknown) && record.delegatees.is_empty()
}
