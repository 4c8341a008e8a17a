//! Network identity and configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Ss58Prefix;

/// Identifies a chain, conventionally by its genesis hash.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    /// Creates a chain id from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.0)
    }
}

/// Declared equivalences between proxy setups on distinct chains.
///
/// A relation `a -> b` states that a proxy registered on chain `a` can also
/// be exercised from chain `b` (for example a relay chain proxy used through
/// the remote proxy pallet on its asset hub).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRelations(BTreeMap<ChainId, ChainId>);

impl RemoteRelations {
    /// Creates an empty relation table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that proxies registered on `from` are usable on `to`.
    pub fn relate(mut self, from: impl Into<ChainId>, to: impl Into<ChainId>) -> Self {
        self.0.insert(from.into(), to.into());
        self
    }

    /// Whether proxies registered on `from` are usable on `to`.
    pub fn is_related(&self, from: &ChainId, to: &ChainId) -> bool {
        self.0.get(from) == Some(to)
    }
}

/// Settings for the network a session operates on.
///
/// ```
/// use mandate_common::NetworkSettings;
///
/// let settings = NetworkSettings::from_json(r#"{
///     "chain": "0x91b1",
///     "ss58Prefix": 0,
///     "remoteRelations": { "0xb0a8": "0x91b1" }
/// }"#).unwrap();
///
/// assert_eq!(settings.ss58_prefix.get(), 0);
/// assert_eq!(settings.poll_interval().as_millis(), 6_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    /// The chain transactions are composed for.
    pub chain: ChainId,

    /// SS58 prefix used to render addresses.
    #[serde(default)]
    pub ss58_prefix: Ss58Prefix,

    /// Remote proxy relations between chains.
    #[serde(default)]
    pub remote_relations: RemoteRelations,

    /// Interval between account refreshes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    6_000
}

impl NetworkSettings {
    /// Creates settings for `chain` with defaults for everything else.
    pub fn new(chain: impl Into<ChainId>) -> Self {
        Self {
            chain: chain.into(),
            ss58_prefix: Ss58Prefix::GENERIC,
            remote_relations: RemoteRelations::default(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    /// Parses settings from JSON. A prefix outside the SS58 range is
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The account refresh interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
