use std::collections::HashMap;

use mandate_call::{BlockNumber, ProxyType};
use mandate_common::{AccountId, ChainId, Ss58Prefix};

/// Index of an [`Account`] within an [`AccountGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// An account in an authority graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Address rendered for the graph's network.
    pub address: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the account was registered through the wallet service.
    pub is_mimir: bool,
    /// Account shape.
    pub kind: AccountKind,
    /// Proxies that may act for this account, in record order.
    pub delegatees: Vec<Delegatee>,
    /// Remote-creation provenance.
    pub proposers: Option<Vec<Proposer>>,
}

/// The shape of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    /// Controlled by a key.
    Plain,
    /// Controlled by `threshold` of `members`.
    ///
    /// Always `1 <= threshold <= members.len()`.
    Multisig {
        /// Approvals needed.
        threshold: u16,
        /// Member accounts.
        members: Vec<NodeId>,
    },
    /// Keyless account created by `creator` through the proxy pallet.
    Pure {
        /// The spawning account.
        creator: AccountId,
        /// Creation block.
        creation_block: BlockNumber,
        /// Creation extrinsic index.
        creation_extrinsic: u32,
        /// Disambiguation index.
        disambiguation_index: u16,
        /// Chain the account was created on.
        origin_network: ChainId,
    },
}

/// A proxy relation from an account to one of its delegatees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegatee {
    /// The delegatee account.
    pub node: NodeId,
    /// Permission scope.
    pub proxy_type: ProxyType,
    /// Chain the relation is registered on.
    pub proxy_network: ChainId,
    /// Announcement delay in blocks.
    pub proxy_delay: BlockNumber,
    /// Whether the relation is registered on another chain and exercised
    /// through a remote proxy relation.
    pub is_remote_proxy: bool,
}

/// Provenance of an account proposed from another chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposer {
    /// The proposing account.
    pub proposer: AccountId,
    /// The account that created the proposal.
    pub creator: AccountId,
    /// Creation time, in milliseconds since the epoch.
    pub created_at: u64,
    /// Chain the proposal was made on.
    pub network: ChainId,
}

impl Account {
    /// A plain account with nothing attached.
    pub(crate) fn bare(id: AccountId, address: String) -> Self {
        Self {
            id,
            address,
            name: None,
            is_mimir: false,
            kind: AccountKind::Plain,
            delegatees: Vec::new(),
            proposers: None,
        }
    }

    /// Whether the account carries no structure (plain, no delegatees).
    pub fn is_bare(&self) -> bool {
        matches!(self.kind, AccountKind::Plain) && self.delegatees.is_empty()
    }

    /// The multisig threshold, if this is a multisig.
    pub fn threshold(&self) -> Option<u16> {
        match &self.kind {
            AccountKind::Multisig { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }

    /// The multisig members, empty for other shapes.
    pub fn members(&self) -> &[NodeId] {
        match &self.kind {
            AccountKind::Multisig { members, .. } => members,
            _ => &[],
        }
    }
}

/// An arena of accounts reachable from one origin.
///
/// Accounts are keyed by address: an address that appears several times in
/// a record (as a member of two multisigs, say) is stored once and
/// referenced by [`NodeId`]. Proxy relations may therefore form cycles;
/// traversals guard against them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountGraph {
    pub(crate) prefix: Ss58Prefix,
    pub(crate) root: NodeId,
    pub(crate) nodes: Vec<Account>,
    pub(crate) index: HashMap<AccountId, NodeId>,
}

impl AccountGraph {
    /// The origin account.
    pub fn root(&self) -> &Account {
        self.node(self.root)
    }

    /// The origin's node id.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The SS58 prefix addresses are rendered with.
    pub fn prefix(&self) -> Ss58Prefix {
        self.prefix
    }

    /// Resolves a node id.
    ///
    /// Node ids are only ever produced by the graph they index, so a
    /// foreign id is a caller bug.
    pub fn node(&self, node: NodeId) -> &Account {
        &self.nodes[node.0]
    }

    /// Looks up an account by identifier.
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.index.get(id).map(|node| self.node(*node))
    }

    /// Every account in the graph.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.nodes.iter()
    }

    /// The number of distinct accounts.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty. A built graph always holds its origin.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
