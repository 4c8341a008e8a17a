//! Authority graphs for multisig and proxy accounts.
//!
//! An account service describes each account as a nested record: a multisig
//! lists its members, a proxied account lists its delegatees, and each of
//! those is a record of its own. This crate turns such records into an
//! [`AccountGraph`] and answers questions about it.
//!
//! # Building
//!
//! [`AccountGraph::build`] normalizes a raw [`AccountRecord`] into an arena
//! of [`Account`]s keyed by address, re-encoding addresses for the target
//! network and, under [`ChainScope::Chain`], keeping only the delegatees that
//! can act on that chain. Building never fails: malformed parts of a record
//! are dropped with a warning.
//!
//! ```text
//! origin (pure)
//!   └── delegatee: Any, delay 0
//!         └── multisig 2-of-3 ──┬── alice   (controlled)
//!                               ├── bob
//!                               └── charlie
//! ```
//!
//! # Deriving metadata
//!
//! [`derive_meta`] flattens a graph into per-address [`AddressMeta`]
//! records. The [`MetaStore`] owns the merged view across every graph and
//! notifies subscribers when it changes.
//!
//! # Finding signers
//!
//! [`filter_paths`] enumerates every [`Path`] from a wallet-controlled
//! address to the graph's origin. For the graph above that is
//!
//! ```text
//! [Multisig { multisig, 2, [bob, charlie], alice }, Proxy { origin, Any, 0, multisig }]
//! ```
//!
//! # Refreshing
//!
//! A [`Refresher`] polls an [`AccountSource`] and keeps the graphs and the
//! metadata store current, discarding results of superseded requests.

mod record;
pub use record::*;

mod account;
pub use account::*;

mod builder;
pub use builder::*;

mod meta;
pub use meta::*;

mod path;
pub use path::*;

mod refresh;
pub use refresh::*;
