use mandate_common::{AccountId, multisig_address};

use crate::{Call, MultisigCall, ProxyCall};

/// Unwraps proxy and multisig wrappers around `call` submitted by `address`.
///
/// Returns the account the innermost call is dispatched as, together with
/// that call. Unwrapping stops at the first call that is not a
/// `proxy.proxy`, `proxy.proxyAnnounced`, `multisig.asMulti` or
/// `multisig.asMultiThreshold1`.
///
/// ```
/// use mandate_call::{Call, MultisigCall, Weight, find_target_call};
/// use mandate_common::{AccountId, multisig_address};
///
/// let (x, y) = (AccountId([1; 32]), AccountId([2; 32]));
/// let remark = Call::other("system", "remark", [0, 0, 0]);
/// let call = Call::from(MultisigCall::AsMulti {
///     threshold: 2,
///     other_signatories: vec![y],
///     maybe_timepoint: None,
///     call: Box::new(remark.clone()),
///     max_weight: Weight::default(),
/// });
///
/// let (target, inner) = find_target_call(&x, &call);
/// assert_eq!(target, multisig_address(&[x, y], 2));
/// assert_eq!(inner, &remark);
/// ```
pub fn find_target_call<'a>(address: &AccountId, call: &'a Call) -> (AccountId, &'a Call) {
    let mut address = *address;
    let mut call = call;

    loop {
        match call {
            Call::Proxy(
                ProxyCall::Proxy {
                    real, call: inner, ..
                }
                | ProxyCall::ProxyAnnounced {
                    real, call: inner, ..
                },
            ) => {
                address = *real;
                call = &**inner;
            }
            Call::Multisig(MultisigCall::AsMulti {
                threshold,
                other_signatories,
                call: inner,
                ..
            }) => {
                address = multisig_address(
                    other_signatories.iter().chain(std::iter::once(&address)),
                    *threshold,
                );
                call = &**inner;
            }
            Call::Multisig(MultisigCall::AsMultiThreshold1 {
                other_signatories,
                call: inner,
            }) => {
                address =
                    multisig_address(other_signatories.iter().chain(std::iter::once(&address)), 1);
                call = &**inner;
            }
            _ => return (address, call),
        }
    }
}
