use mandate_common::{AccountId, H256};
use parity_scale_codec::{Compact, Encode};
use serde::{Deserialize, Serialize};

use crate::{CallIndices, EncodeError, ProxyType};

/// Block number type of the runtime.
pub type BlockNumber = u32;

/// Balance type of the runtime.
pub type Balance = u128;

/// Hash identifying a call.
pub type CallHash = H256;

/// A point in the chain's history: the block height and the extrinsic index
/// within that block. Identifies the first approval of a multisig operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Encode, Serialize, Deserialize)]
pub struct Timepoint {
    /// Block height.
    pub height: BlockNumber,
    /// Extrinsic index within the block.
    pub index: u32,
}

/// Two dimensional execution weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Encode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    /// Computation time.
    #[codec(compact)]
    pub ref_time: u64,
    /// Proof size.
    #[codec(compact)]
    pub proof_size: u64,
}

/// A runtime call.
///
/// Only the calls that carry authority (multisig, proxy and batch wrappers)
/// are modelled structurally; everything else is an [`OpaqueCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", content = "call", rename_all = "camelCase")]
pub enum Call {
    /// `multisig.*`
    Multisig(MultisigCall),
    /// `proxy.*`
    Proxy(ProxyCall),
    /// `utility.batch*`
    Utility(UtilityCall),
    /// Any other call.
    Other(OpaqueCall),
}

/// Calls of the multisig pallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MultisigCall {
    /// Dispatch `call` from a single-member-threshold multisig immediately.
    AsMultiThreshold1 {
        /// The other members, sorted.
        other_signatories: Vec<AccountId>,
        /// The call to dispatch.
        call: Box<Call>,
    },
    /// Approve and, when the threshold is reached, dispatch `call`.
    AsMulti {
        /// Approvals needed.
        threshold: u16,
        /// The other members, sorted.
        other_signatories: Vec<AccountId>,
        /// The first approval's timepoint, absent for the first approval.
        maybe_timepoint: Option<Timepoint>,
        /// The call to dispatch.
        call: Box<Call>,
        /// Upper bound on the dispatch weight.
        max_weight: Weight,
    },
    /// Approve a call by hash without dispatching it.
    ApproveAsMulti {
        /// Approvals needed.
        threshold: u16,
        /// The other members, sorted.
        other_signatories: Vec<AccountId>,
        /// The first approval's timepoint, absent for the first approval.
        maybe_timepoint: Option<Timepoint>,
        /// Hash of the call being approved.
        call_hash: CallHash,
        /// Upper bound on the dispatch weight.
        max_weight: Weight,
    },
    /// Cancel a pending operation, releasing its deposit.
    CancelAsMulti {
        /// Approvals needed.
        threshold: u16,
        /// The other members, sorted.
        other_signatories: Vec<AccountId>,
        /// The first approval's timepoint.
        timepoint: Timepoint,
        /// Hash of the pending call.
        call_hash: CallHash,
    },
}

/// Calls of the proxy pallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProxyCall {
    /// Dispatch `call` as `real`.
    Proxy {
        /// The account acted for.
        real: AccountId,
        /// Restrict matching to a proxy of this type.
        force_proxy_type: Option<ProxyType>,
        /// The call to dispatch.
        call: Box<Call>,
    },
    /// Register a proxy.
    AddProxy {
        /// The new proxy.
        delegate: AccountId,
        /// Its permission scope.
        proxy_type: ProxyType,
        /// Announcement delay in blocks.
        delay: BlockNumber,
    },
    /// Unregister a proxy.
    RemoveProxy {
        /// The proxy to remove.
        delegate: AccountId,
        /// Its permission scope.
        proxy_type: ProxyType,
        /// Its announcement delay.
        delay: BlockNumber,
    },
    /// Unregister every proxy of the sender.
    RemoveProxies,
    /// Spawn a keyless account proxied by the sender.
    CreatePure {
        /// Scope granted to the sender.
        proxy_type: ProxyType,
        /// Announcement delay.
        delay: BlockNumber,
        /// Disambiguation index.
        index: u16,
    },
    /// Destroy a pure account. Sent by the pure account itself.
    KillPure {
        /// The account that created the pure account.
        spawner: AccountId,
        /// Scope used at creation.
        proxy_type: ProxyType,
        /// Disambiguation index used at creation.
        index: u16,
        /// Creation block.
        height: BlockNumber,
        /// Creation extrinsic index.
        ext_index: u32,
    },
    /// Publish the hash of a call to be dispatched after a delay.
    Announce {
        /// The account acted for.
        real: AccountId,
        /// Hash of the announced call.
        call_hash: CallHash,
    },
    /// Withdraw one of the sender's announcements.
    RemoveAnnouncement {
        /// The account acted for.
        real: AccountId,
        /// Hash of the announced call.
        call_hash: CallHash,
    },
    /// Reject an announcement made by one of the sender's proxies.
    RejectAnnouncement {
        /// The announcing proxy.
        delegate: AccountId,
        /// Hash of the announced call.
        call_hash: CallHash,
    },
    /// Dispatch a previously announced call as `real`.
    ProxyAnnounced {
        /// The proxy that announced the call.
        delegate: AccountId,
        /// The account acted for.
        real: AccountId,
        /// Restrict matching to a proxy of this type.
        force_proxy_type: Option<ProxyType>,
        /// The announced call.
        call: Box<Call>,
    },
}

/// Batch calls of the utility pallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UtilityCall {
    /// Dispatch in order, stopping at the first failure.
    Batch {
        /// Calls to dispatch.
        calls: Vec<Call>,
    },
    /// Dispatch in order, reverting everything on failure.
    BatchAll {
        /// Calls to dispatch.
        calls: Vec<Call>,
    },
    /// Dispatch in order, continuing past failures.
    ForceBatch {
        /// Calls to dispatch.
        calls: Vec<Call>,
    },
}

/// A call whose arguments are not interpreted.
///
/// The names drive permission checks; `encoded` is what the chain sees and
/// hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueCall {
    /// Pallet name in lower camel case, e.g. `balances`.
    pub section: String,
    /// Call name in lower camel case, e.g. `transferKeepAlive`.
    pub method: String,
    /// The full runtime encoding: pallet index, call index, arguments.
    pub encoded: Vec<u8>,
}

impl OpaqueCall {
    /// Creates an opaque call from its names and runtime encoding.
    pub fn new(
        section: impl Into<String>,
        method: impl Into<String>,
        encoded: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            encoded: encoded.into(),
        }
    }
}

/// Variant index of `MultiAddress::Id`, the form account arguments take.
const MULTI_ADDRESS_ID: u8 = 0;

fn encode_lookup(account: &AccountId, dest: &mut Vec<u8>) {
    dest.push(MULTI_ADDRESS_ID);
    account.encode_to(dest);
}

fn encode_proxy_type(
    proxy_type: ProxyType,
    indices: &CallIndices,
    dest: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    dest.push(indices.proxy_type(proxy_type)?);
    Ok(())
}

fn encode_force_proxy_type(
    proxy_type: Option<ProxyType>,
    indices: &CallIndices,
    dest: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match proxy_type {
        None => dest.push(0),
        Some(proxy_type) => {
            dest.push(1);
            encode_proxy_type(proxy_type, indices, dest)?;
        }
    }
    Ok(())
}

impl MultisigCall {
    fn encode_into(&self, indices: &CallIndices, dest: &mut Vec<u8>) -> Result<(), EncodeError> {
        dest.push(indices.multisig);
        match self {
            MultisigCall::AsMultiThreshold1 {
                other_signatories,
                call,
            } => {
                dest.push(0);
                other_signatories.encode_to(dest);
                call.encode_into(indices, dest)?;
            }
            MultisigCall::AsMulti {
                threshold,
                other_signatories,
                maybe_timepoint,
                call,
                max_weight,
            } => {
                dest.push(1);
                threshold.encode_to(dest);
                other_signatories.encode_to(dest);
                maybe_timepoint.encode_to(dest);
                call.encode_into(indices, dest)?;
                max_weight.encode_to(dest);
            }
            MultisigCall::ApproveAsMulti {
                threshold,
                other_signatories,
                maybe_timepoint,
                call_hash,
                max_weight,
            } => {
                dest.push(2);
                threshold.encode_to(dest);
                other_signatories.encode_to(dest);
                maybe_timepoint.encode_to(dest);
                call_hash.encode_to(dest);
                max_weight.encode_to(dest);
            }
            MultisigCall::CancelAsMulti {
                threshold,
                other_signatories,
                timepoint,
                call_hash,
            } => {
                dest.push(3);
                threshold.encode_to(dest);
                other_signatories.encode_to(dest);
                timepoint.encode_to(dest);
                call_hash.encode_to(dest);
            }
        }
        Ok(())
    }
}

impl ProxyCall {
    fn encode_into(&self, indices: &CallIndices, dest: &mut Vec<u8>) -> Result<(), EncodeError> {
        dest.push(indices.proxy);
        match self {
            ProxyCall::Proxy {
                real,
                force_proxy_type,
                call,
            } => {
                dest.push(0);
                encode_lookup(real, dest);
                encode_force_proxy_type(*force_proxy_type, indices, dest)?;
                call.encode_into(indices, dest)?;
            }
            ProxyCall::AddProxy {
                delegate,
                proxy_type,
                delay,
            } => {
                dest.push(1);
                encode_lookup(delegate, dest);
                encode_proxy_type(*proxy_type, indices, dest)?;
                delay.encode_to(dest);
            }
            ProxyCall::RemoveProxy {
                delegate,
                proxy_type,
                delay,
            } => {
                dest.push(2);
                encode_lookup(delegate, dest);
                encode_proxy_type(*proxy_type, indices, dest)?;
                delay.encode_to(dest);
            }
            ProxyCall::RemoveProxies => dest.push(3),
            ProxyCall::CreatePure {
                proxy_type,
                delay,
                index,
            } => {
                dest.push(4);
                encode_proxy_type(*proxy_type, indices, dest)?;
                delay.encode_to(dest);
                index.encode_to(dest);
            }
            ProxyCall::KillPure {
                spawner,
                proxy_type,
                index,
                height,
                ext_index,
            } => {
                dest.push(5);
                encode_lookup(spawner, dest);
                encode_proxy_type(*proxy_type, indices, dest)?;
                index.encode_to(dest);
                Compact(*height).encode_to(dest);
                Compact(*ext_index).encode_to(dest);
            }
            ProxyCall::Announce { real, call_hash } => {
                dest.push(6);
                encode_lookup(real, dest);
                call_hash.encode_to(dest);
            }
            ProxyCall::RemoveAnnouncement { real, call_hash } => {
                dest.push(7);
                encode_lookup(real, dest);
                call_hash.encode_to(dest);
            }
            ProxyCall::RejectAnnouncement {
                delegate,
                call_hash,
            } => {
                dest.push(8);
                encode_lookup(delegate, dest);
                call_hash.encode_to(dest);
            }
            ProxyCall::ProxyAnnounced {
                delegate,
                real,
                force_proxy_type,
                call,
            } => {
                dest.push(9);
                encode_lookup(delegate, dest);
                encode_lookup(real, dest);
                encode_force_proxy_type(*force_proxy_type, indices, dest)?;
                call.encode_into(indices, dest)?;
            }
        }
        Ok(())
    }
}

impl UtilityCall {
    fn encode_into(&self, indices: &CallIndices, dest: &mut Vec<u8>) -> Result<(), EncodeError> {
        let (index, calls) = match self {
            UtilityCall::Batch { calls } => (0, calls),
            UtilityCall::BatchAll { calls } => (2, calls),
            UtilityCall::ForceBatch { calls } => (4, calls),
        };
        dest.extend_from_slice(&[indices.utility, index]);
        Compact(calls.len() as u32).encode_to(dest);
        for call in calls {
            call.encode_into(indices, dest)?;
        }
        Ok(())
    }
}

impl Call {
    /// Shorthand for an [`OpaqueCall`].
    pub fn other(
        section: impl Into<String>,
        method: impl Into<String>,
        encoded: impl Into<Vec<u8>>,
    ) -> Self {
        Call::Other(OpaqueCall::new(section, method, encoded))
    }

    /// The pallet name in lower camel case.
    pub fn section(&self) -> &str {
        match self {
            Call::Multisig(_) => "multisig",
            Call::Proxy(_) => "proxy",
            Call::Utility(_) => "utility",
            Call::Other(call) => &call.section,
        }
    }

    /// The call name in lower camel case.
    pub fn method(&self) -> &str {
        match self {
            Call::Multisig(call) => match call {
                MultisigCall::AsMultiThreshold1 { .. } => "asMultiThreshold1",
                MultisigCall::AsMulti { .. } => "asMulti",
                MultisigCall::ApproveAsMulti { .. } => "approveAsMulti",
                MultisigCall::CancelAsMulti { .. } => "cancelAsMulti",
            },
            Call::Proxy(call) => match call {
                ProxyCall::Proxy { .. } => "proxy",
                ProxyCall::AddProxy { .. } => "addProxy",
                ProxyCall::RemoveProxy { .. } => "removeProxy",
                ProxyCall::RemoveProxies => "removeProxies",
                ProxyCall::CreatePure { .. } => "createPure",
                ProxyCall::KillPure { .. } => "killPure",
                ProxyCall::Announce { .. } => "announce",
                ProxyCall::RemoveAnnouncement { .. } => "removeAnnouncement",
                ProxyCall::RejectAnnouncement { .. } => "rejectAnnouncement",
                ProxyCall::ProxyAnnounced { .. } => "proxyAnnounced",
            },
            Call::Utility(call) => match call {
                UtilityCall::Batch { .. } => "batch",
                UtilityCall::BatchAll { .. } => "batchAll",
                UtilityCall::ForceBatch { .. } => "forceBatch",
            },
            Call::Other(call) => &call.method,
        }
    }

    /// The runtime encoding of this call: pallet index, call index, then
    /// the arguments, with accounts as `MultiAddress::Id`.
    pub fn encode_with(&self, indices: &CallIndices) -> Result<Vec<u8>, EncodeError> {
        let mut dest = Vec::new();
        self.encode_into(indices, &mut dest)?;
        Ok(dest)
    }

    /// The BLAKE2b-256 hash of [`Call::encode_with`], the hash the chain
    /// keys announcements and multisig operations by.
    pub fn hash_with(&self, indices: &CallIndices) -> Result<CallHash, EncodeError> {
        Ok(H256::hash(&self.encode_with(indices)?))
    }

    fn encode_into(&self, indices: &CallIndices, dest: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Call::Multisig(call) => call.encode_into(indices, dest),
            Call::Proxy(call) => call.encode_into(indices, dest),
            Call::Utility(call) => call.encode_into(indices, dest),
            Call::Other(call) => {
                dest.extend_from_slice(&call.encoded);
                Ok(())
            }
        }
    }

    /// The inner calls of a batch, if this is one.
    pub fn batched(&self) -> Option<&[Call]> {
        match self {
            Call::Utility(
                UtilityCall::Batch { calls }
                | UtilityCall::BatchAll { calls }
                | UtilityCall::ForceBatch { calls },
            ) => Some(calls),
            _ => None,
        }
    }
}

impl From<MultisigCall> for Call {
    fn from(call: MultisigCall) -> Self {
        Call::Multisig(call)
    }
}

impl From<ProxyCall> for Call {
    fn from(call: ProxyCall) -> Self {
        Call::Proxy(call)
    }
}

impl From<UtilityCall> for Call {
    fn from(call: UtilityCall) -> Self {
        Call::Utility(call)
    }
}

impl From<OpaqueCall> for Call {
    fn from(call: OpaqueCall) -> Self {
        Call::Other(call)
    }
}
