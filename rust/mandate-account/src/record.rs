//! Raw account records as produced by the account service.
//!
//! Records are deliberately permissive: every field except the address is
//! optional so that a partially populated response still yields a partial
//! graph instead of a deserialization failure.

use mandate_common::ChainId;
use serde::{Deserialize, Serialize};

/// Account shape declared by a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A key-controlled account.
    #[default]
    Account,
    /// A multisig account.
    Multisig,
    /// A pure proxy account.
    Pure,
    /// A shape this version does not understand, treated as plain.
    #[serde(other)]
    Unknown,
}

/// A nested account record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Address in any SS58 format or `0x` hex.
    pub address: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Whether the account was registered through the wallet service.
    #[serde(default)]
    pub is_mimir: bool,

    /// Declared shape.
    #[serde(default, rename = "type")]
    pub kind: RecordKind,

    /// Multisig threshold.
    #[serde(default)]
    pub threshold: Option<u16>,

    /// Multisig members.
    #[serde(default)]
    pub members: Vec<AccountRecord>,

    /// Proxies of this account.
    #[serde(default)]
    pub delegatees: Vec<DelegateeRecord>,

    /// Remote-creation provenance.
    #[serde(default)]
    pub proposers: Option<Vec<ProposerRecord>>,

    /// Pure account creator.
    #[serde(default)]
    pub creator: Option<String>,

    /// Pure account creation block.
    #[serde(default)]
    pub created_block: Option<u32>,

    /// Pure account creation extrinsic index.
    #[serde(default)]
    pub created_extrinsic_index: Option<u32>,

    /// Pure account disambiguation index.
    #[serde(default)]
    pub disambiguation_index: Option<u16>,

    /// Chain the pure account was created on.
    #[serde(default)]
    pub network: Option<ChainId>,
}

/// A proxy relation: the delegatee's own record plus the relation's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateeRecord {
    /// The delegatee account.
    #[serde(flatten)]
    pub account: AccountRecord,

    /// Proxy type name, e.g. `Any`.
    pub proxy_type: String,

    /// Chain the relation is registered on.
    pub proxy_network: ChainId,

    /// Announcement delay in blocks.
    #[serde(default)]
    pub proxy_delay: u32,
}

/// Provenance of an account proposed from another chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposerRecord {
    /// The proposing account.
    pub proposer: String,
    /// The account that created the proposal.
    pub creator: String,
    /// Creation time, in milliseconds since the epoch.
    #[serde(default)]
    pub created_at: u64,
    /// Chain the proposal was made on.
    pub network: ChainId,
}

impl AccountRecord {
    /// Parses a record from the account service's JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Creates a plain account record.
    pub fn plain(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Creates a multisig account record.
    pub fn multisig(address: impl Into<String>, threshold: u16, members: Vec<AccountRecord>) -> Self {
        Self {
            address: address.into(),
            kind: RecordKind::Multisig,
            threshold: Some(threshold),
            members,
            ..Self::default()
        }
    }

    /// Adds a delegatee to this record.
    pub fn with_delegatee(
        mut self,
        account: AccountRecord,
        proxy_type: impl Into<String>,
        proxy_network: impl Into<ChainId>,
        proxy_delay: u32,
    ) -> Self {
        self.delegatees.push(DelegateeRecord {
            account,
            proxy_type: proxy_type.into(),
            proxy_network: proxy_network.into(),
            proxy_delay,
        });
        self
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
