#![warn(missing_docs)]

//! Light weight building blocks shared by the other `mandate` crates:
//! account identifiers and their SS58 text form, the hashing used to derive
//! deterministic multisig accounts, network settings and generation tokens
//! used to discard superseded async work.

mod sync;
pub use sync::*;

mod hash;
pub use hash::*;

mod address;
pub use address::*;

mod multisig;
pub use multisig::*;

mod network;
pub use network::*;

mod generation;
pub use generation::*;
