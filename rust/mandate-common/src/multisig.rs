use parity_scale_codec::Encode;

use crate::{AccountId, blake2_256};

const MULTISIG_ENTROPY_PREFIX: &[u8; 16] = b"modlpy/utilisuba";

/// Derives the deterministic multisig account for a set of signatories.
///
/// The signatories are sorted and deduplicated before hashing, so the
/// result only depends on the member set and the threshold. This matches
/// the runtime's `multi_account_id`:
/// `blake2_256(b"modlpy/utilisuba" ++ SCALE(sorted members) ++ SCALE(threshold))`.
pub fn multisig_address<'a, I>(signatories: I, threshold: u16) -> AccountId
where
    I: IntoIterator<Item = &'a AccountId>,
{
    let mut members: Vec<AccountId> = signatories.into_iter().copied().collect();
    members.sort();
    members.dedup();

    let entropy = (MULTISIG_ENTROPY_PREFIX, members, threshold).using_encoded(blake2_256);
    AccountId(entropy)
}

/// Returns `others` sorted and without `signer`, the form the runtime
/// expects for `other_signatories`.
pub fn other_signatories<'a, I>(signer: &AccountId, members: I) -> Vec<AccountId>
where
    I: IntoIterator<Item = &'a AccountId>,
{
    let mut others: Vec<AccountId> = members
        .into_iter()
        .filter(|member| *member != signer)
        .copied()
        .collect();
    others.sort();
    others.dedup();
    others
}
