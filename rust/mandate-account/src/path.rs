use std::collections::{BTreeSet, HashSet};

use mandate_call::{BlockNumber, ProxyType};
use mandate_common::{AccountId, other_signatories};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{AccountGraph, AccountKind, NodeId};

/// One delegation step on the way from a signer to an origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FilterPath {
    /// The origin signs for itself.
    Origin {
        /// The origin.
        address: AccountId,
    },
    /// `address` approves on behalf of `multisig_address`.
    Multisig {
        /// The multisig being acted for.
        multisig_address: AccountId,
        /// The multisig threshold.
        threshold: u16,
        /// The multisig members other than `address`, sorted.
        other_signatories: Vec<AccountId>,
        /// The approving member.
        address: AccountId,
    },
    /// `address` dispatches as a proxy of `real`.
    Proxy {
        /// The account being acted for.
        real: AccountId,
        /// Scope of the relation.
        proxy_type: ProxyType,
        /// Announcement delay in blocks.
        delay: BlockNumber,
        /// The proxy.
        address: AccountId,
    },
}

impl FilterPath {
    /// The account that acts at this step.
    pub fn address(&self) -> &AccountId {
        match self {
            FilterPath::Origin { address }
            | FilterPath::Multisig { address, .. }
            | FilterPath::Proxy { address, .. } => address,
        }
    }

    /// The account this step acts for, `None` for [`FilterPath::Origin`].
    pub fn acts_for(&self) -> Option<&AccountId> {
        match self {
            FilterPath::Origin { .. } => None,
            FilterPath::Multisig {
                multisig_address, ..
            } => Some(multisig_address),
            FilterPath::Proxy { real, .. } => Some(real),
        }
    }
}

/// An ordered sequence of steps, from the signer (index 0) to the origin.
pub type Path = Vec<FilterPath>;

/// Errors raised when resolving a signer for an origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No wallet-controlled address can act for the origin.
    #[error("No controlled account can act for {origin}")]
    UnresolvedPath {
        /// The origin that could not be reached.
        origin: AccountId,
    },
}

/// Enumerates every distinct path from a controlled address to the graph's
/// origin.
///
/// Exploration continues below a controlled account, so a controlled member
/// of a multisig that is itself controlled yields both paths. Paths are
/// returned in discovery order: members before delegatees, record order
/// within each.
pub fn filter_paths(graph: &AccountGraph, controlled: &BTreeSet<AccountId>) -> Vec<Path> {
    let mut walk = Walk {
        graph,
        controlled,
        branch: HashSet::new(),
        steps: Vec::new(),
        paths: Vec::new(),
    };
    walk.visit(graph.root_id());
    walk.paths
}

/// Like [`filter_paths`], failing when the origin cannot be reached.
pub fn resolve_paths(
    graph: &AccountGraph,
    controlled: &BTreeSet<AccountId>,
) -> Result<Vec<Path>, ResolveError> {
    let paths = filter_paths(graph, controlled);
    if paths.is_empty() {
        return Err(ResolveError::UnresolvedPath {
            origin: graph.root().id,
        });
    }
    Ok(paths)
}

struct Walk<'g> {
    graph: &'g AccountGraph,
    controlled: &'g BTreeSet<AccountId>,
    branch: HashSet<NodeId>,
    /// Steps taken so far, origin side first.
    steps: Vec<FilterPath>,
    paths: Vec<Path>,
}

impl Walk<'_> {
    fn visit(&mut self, node: NodeId) {
        let graph = self.graph;
        if !self.branch.insert(node) {
            debug!(address = %graph.node(node).id, "Cycle in authority graph");
            return;
        }

        let account = graph.node(node);
        if self.controlled.contains(&account.id) {
            self.emit(account.id);
        }

        if let AccountKind::Multisig { threshold, members } = &account.kind {
            let ids: Vec<AccountId> = members
                .iter()
                .map(|member| graph.node(*member).id)
                .collect();
            for member in members {
                let member_id = graph.node(*member).id;
                self.descend(
                    *member,
                    FilterPath::Multisig {
                        multisig_address: account.id,
                        threshold: *threshold,
                        other_signatories: other_signatories(&member_id, &ids),
                        address: member_id,
                    },
                );
            }
        }

        for delegatee in &account.delegatees {
            self.descend(
                delegatee.node,
                FilterPath::Proxy {
                    real: account.id,
                    proxy_type: delegatee.proxy_type,
                    delay: delegatee.proxy_delay,
                    address: graph.node(delegatee.node).id,
                },
            );
        }

        self.branch.remove(&node);
    }

    fn descend(&mut self, node: NodeId, step: FilterPath) {
        self.steps.push(step);
        self.visit(node);
        self.steps.pop();
    }

    fn emit(&mut self, signer: AccountId) {
        let path: Path = if self.steps.is_empty() {
            vec![FilterPath::Origin { address: signer }]
        } else {
            self.steps.iter().rev().cloned().collect()
        };
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountRecord, ChainScope};
    use mandate_common::Ss58Prefix;
    use pretty_assertions::assert_eq;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
    const CHARLIE: &str = "5FLSigC9HGRKVhB9FiEo4Y3koPsNmBmLJbpXg2mp1hXcS59Y";
    const DAVE: &str = "5DAAnrj7VHTznn2AWBemMuyBwZWs6FNFjdyVXUeYum3PTXFy";
    const EVE: &str = "5HGjWAeFDfFCWPsjFQdVV2Msvz2XtMktvgocEZcCj68kUMaw";

    fn id(address: &str) -> AccountId {
        address.parse().unwrap()
    }

    fn controlled(addresses: &[&str]) -> BTreeSet<AccountId> {
        addresses.iter().map(|address| id(address)).collect()
    }

    fn graph(record: &AccountRecord) -> AccountGraph {
        AccountGraph::build(record, Ss58Prefix::GENERIC, ChainScope::Unfiltered).unwrap()
    }

    #[test]
    fn it_signs_directly_for_a_controlled_origin() {
        let paths = filter_paths(&graph(&AccountRecord::plain(ALICE)), &controlled(&[ALICE]));
        assert_eq!(paths, vec![vec![FilterPath::Origin { address: id(ALICE) }]]);
    }

    #[test]
    fn it_reaches_a_pure_account_through_its_multisig() {
        let record = AccountRecord::plain(EVE).with_delegatee(
            AccountRecord::multisig(
                DAVE,
                2,
                vec![
                    AccountRecord::plain(ALICE),
                    AccountRecord::plain(BOB),
                    AccountRecord::plain(CHARLIE),
                ],
            ),
            "Any",
            "hub",
            0,
        );

        let paths = filter_paths(&graph(&record), &controlled(&[ALICE]));

        let mut others = vec![id(BOB), id(CHARLIE)];
        others.sort();
        assert_eq!(
            paths,
            vec![vec![
                FilterPath::Multisig {
                    multisig_address: id(DAVE),
                    threshold: 2,
                    other_signatories: others,
                    address: id(ALICE),
                },
                FilterPath::Proxy {
                    real: id(EVE),
                    proxy_type: ProxyType::Any,
                    delay: 0,
                    address: id(DAVE),
                },
            ]]
        );
        assert_eq!(paths[0][0].address(), &id(ALICE));
        assert_eq!(paths[0][1].acts_for(), Some(&id(EVE)));
    }

    #[test]
    fn it_keeps_exploring_below_controlled_accounts() {
        // Bob is controlled and is also proxied by the controlled Alice.
        let record = AccountRecord::multisig(
            CHARLIE,
            1,
            vec![
                AccountRecord::plain(BOB).with_delegatee(AccountRecord::plain(ALICE), "Any", "hub", 5),
                AccountRecord::plain(DAVE),
            ],
        );

        let paths = filter_paths(&graph(&record), &controlled(&[ALICE, BOB]));

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0][0].address(), &id(BOB));
        assert_eq!(paths[1][0].address(), &id(ALICE));
        assert!(matches!(paths[1][0], FilterPath::Proxy { delay: 5, .. }));
    }

    #[test]
    fn it_survives_cycles_and_reports_unresolved_origins() {
        let record = AccountRecord::plain(ALICE).with_delegatee(
            AccountRecord::plain(BOB).with_delegatee(AccountRecord::plain(ALICE), "Any", "hub", 0),
            "Any",
            "hub",
            0,
        );
        let graph = graph(&record);

        assert_eq!(
            resolve_paths(&graph, &controlled(&[CHARLIE])),
            Err(ResolveError::UnresolvedPath { origin: id(ALICE) })
        );
        assert_eq!(resolve_paths(&graph, &controlled(&[BOB])).unwrap().len(), 1);
    }

    #[test]
    fn it_serializes_steps_with_a_type_tag() {
        let step = FilterPath::Origin { address: id(ALICE) };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "origin");
        assert_eq!(json["address"], ALICE);
    }
}
