//! Deposit accounting and transaction composition.
//!
//! Given a call and a signing [`Path`](mandate_account::Path) found by
//! `mandate-account`, the [`Composer`] wraps the call in the multisig and
//! proxy calls each step requires and names the account that signs the
//! result. [`deposit_effects`] predicts the collateral the chain will lock
//! and release when a call is dispatched, so it can be shown before
//! signing.
//!
//! Both read live chain state through the [`ChainState`] trait;
//! [`MemoryChainState`] is an in-memory implementation for tests and
//! offline use.

mod chain;
pub use chain::*;

mod memory;
pub use memory::*;

mod deposit;
pub use deposit::*;

mod compose;
pub use compose::*;
