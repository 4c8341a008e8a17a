//! Runtime calls as seen by a multisig/proxy signer.
//!
//! This crate models the subset of runtime calls that wrap, delegate or
//! collateralize other calls, and answers two questions about them:
//!
//! - **Who ultimately acts?** [`find_target_call`] peels `proxy.proxy`,
//!   `proxy.proxyAnnounced` and `multisig.asMulti*` wrappers and returns the
//!   account the innermost call is dispatched as.
//! - **Is a delegate allowed to dispatch it?** [`call_filter`] checks a call
//!   against a [`ProxyType`] permission scope, recursing through batches and
//!   nested proxy calls, and reports a [`FilterError`] otherwise.
//!
//! ```text
//! proxy.proxy(real = X)                     acting: X
//!   └── multisig.asMulti(2, [Y])            acting: multisig{X, Y}
//!         └── balances.transferKeepAlive    <- target call
//! ```
//!
//! Calls that are irrelevant to authority are carried as an
//! [`OpaqueCall`]: a section and method name for permission checks, plus
//! the call's full runtime encoding. Structured calls are encoded with the
//! pallet and proxy type numbering of a [`CallIndices`] table, so their
//! hashes match the ones the chain stores for announcements and multisig
//! operations.

mod error;
pub use error::*;

mod proxy_type;
pub use proxy_type::*;

mod indices;
pub use indices::*;

mod call;
pub use call::*;

mod filter;
pub use filter::*;

mod target;
pub use target::*;
