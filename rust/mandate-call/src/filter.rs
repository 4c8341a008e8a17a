//! Proxy permission scopes.
//!
//! Mirrors the runtime's `InstanceFilter` and `is_superset` for every
//! [`ProxyType`], so a call that a proxy is not allowed to dispatch is
//! rejected before it is signed rather than failing on chain.

use mandate_common::AccountId;
use tracing::debug;

use crate::{Call, FilterError, ProxyCall, ProxyType};

/// Sections whose calls move balances or assets.
const TRANSFER_SECTIONS: &[&str] = &[
    "balances",
    "assets",
    "foreignAssets",
    "poolAssets",
    "nfts",
    "uniques",
    "xcmPallet",
    "polkadotXcm",
    "xTokens",
    "tokens",
    "currencies",
    "assetConversion",
];

const ASSET_OWNER_METHODS: &[(&str, &[&str])] = &[
    (
        "assets",
        &[
            "create",
            "startDestroy",
            "destroyAccounts",
            "destroyApprovals",
            "finishDestroy",
            "transferOwnership",
            "setTeam",
            "setMetadata",
            "clearMetadata",
            "setMinBalance",
        ],
    ),
    (
        "nfts",
        &[
            "create",
            "destroy",
            "redeposit",
            "transferOwnership",
            "setTeam",
            "setCollectionMaxSupply",
            "lockCollection",
        ],
    ),
    (
        "uniques",
        &[
            "create",
            "destroy",
            "transferOwnership",
            "setTeam",
            "setMetadata",
            "setAttribute",
            "setCollectionMetadata",
            "clearMetadata",
            "clearAttribute",
            "clearCollectionMetadata",
            "setCollectionMaxSupply",
        ],
    ),
];

const ASSET_MANAGER_METHODS: &[(&str, &[&str])] = &[
    (
        "assets",
        &[
            "mint",
            "burn",
            "freeze",
            "block",
            "thaw",
            "freezeAsset",
            "thawAsset",
            "touchOther",
            "refundOther",
        ],
    ),
    (
        "nfts",
        &[
            "forceMint",
            "updateMintSettings",
            "mintPreSigned",
            "setAttributesPreSigned",
            "lockItemTransfer",
            "unlockItemTransfer",
            "lockItemProperties",
            "setMetadata",
            "clearMetadata",
            "setCollectionMetadata",
            "clearCollectionMetadata",
        ],
    ),
    (
        "uniques",
        &[
            "mint",
            "burn",
            "freeze",
            "thaw",
            "freezeCollection",
            "thawCollection",
            "setAttribute",
            "setMetadata",
            "clearMetadata",
            "clearAttribute",
        ],
    ),
];

fn allows_method(table: &[(&str, &[&str])], section: &str, method: &str) -> bool {
    table
        .iter()
        .any(|(allowed, methods)| *allowed == section && methods.contains(&method))
}

/// Whether a proxy of `proxy_type` may dispatch `section.method`.
///
/// Section and method names are the lower camel case names used by the
/// runtime metadata (`convictionVoting`, `transferKeepAlive`).
pub fn match_proxy_type(proxy_type: ProxyType, section: &str, method: &str) -> bool {
    match proxy_type {
        ProxyType::Any => true,
        ProxyType::NonTransfer => {
            !TRANSFER_SECTIONS.contains(&section)
                && !matches!(
                    (section, method),
                    ("vesting", "vestedTransfer") | ("indices", "transfer" | "forceTransfer")
                )
        }
        ProxyType::Governance => matches!(
            section,
            "convictionVoting"
                | "referenda"
                | "whitelist"
                | "treasury"
                | "bounties"
                | "childBounties"
                | "utility"
        ),
        ProxyType::Staking => matches!(
            section,
            "staking" | "session" | "utility" | "fastUnstake" | "voterList" | "nominationPools"
        ),
        ProxyType::IdentityJudgement => {
            matches!((section, method), ("identity", "provideJudgement") | ("utility", _))
        }
        ProxyType::CancelProxy => matches!(
            (section, method),
            ("proxy", "rejectAnnouncement") | ("utility", _) | ("multisig", _)
        ),
        ProxyType::Auction => matches!(section, "auctions" | "crowdloan" | "registrar" | "slots"),
        ProxyType::NominationPools => matches!(section, "nominationPools" | "utility"),
        ProxyType::ParaRegistration => matches!(
            (section, method),
            ("registrar", "reserve" | "register" | "swap" | "removeLock" | "addLock")
                | ("paras", "addTrustedValidationCode")
                | ("utility", _)
        ),
        ProxyType::Society => matches!(section, "society"),
        ProxyType::Spokesperson => {
            matches!((section, method), ("system", "remark" | "remarkWithEvent"))
        }
        ProxyType::Assets => matches!(
            section,
            "assets" | "nfts" | "uniques" | "utility" | "multisig"
        ),
        ProxyType::AssetOwner => {
            allows_method(ASSET_OWNER_METHODS, section, method)
                || matches!(section, "utility" | "multisig")
        }
        ProxyType::AssetManager => {
            allows_method(ASSET_MANAGER_METHODS, section, method)
                || matches!(section, "utility" | "multisig")
        }
        ProxyType::Collator => matches!(section, "collatorSelection" | "utility" | "multisig"),
        ProxyType::Alliance => matches!(
            section,
            "alliance" | "allianceMotion" | "utility" | "multisig"
        ),
        ProxyType::Fellowship => matches!(
            section,
            "fellowshipCollective"
                | "fellowshipReferenda"
                | "fellowshipCore"
                | "fellowshipSalary"
                | "fellowshipTreasury"
                | "utility"
                | "multisig"
        ),
        ProxyType::Ambassador => matches!(
            section,
            "ambassadorCollective"
                | "ambassadorReferenda"
                | "ambassadorContent"
                | "ambassadorCore"
                | "ambassadorSalary"
                | "utility"
                | "multisig"
        ),
    }
}

/// Whether a proxy of type `this` may grant or remove proxies of type `other`.
pub fn is_superset(this: ProxyType, other: ProxyType) -> bool {
    match (this, other) {
        (x, y) if x == y => true,
        (ProxyType::Any, _) => true,
        (_, ProxyType::Any) => false,
        (ProxyType::Assets, ProxyType::AssetOwner | ProxyType::AssetManager) => true,
        (ProxyType::NonTransfer, ProxyType::Collator) => true,
        _ => false,
    }
}

/// Checks that a proxy of `proxy_type` acting for `real` may dispatch `call`.
///
/// Batches are checked call by call under the same scope. A nested
/// `proxy.proxy` is checked against the acting scope first and its inner
/// call against the nested call's declared `force_proxy_type`; when none is
/// declared the chain picks the matching proxy and the inner call is left
/// to it.
pub fn call_filter(proxy_type: ProxyType, real: &AccountId, call: &Call) -> Result<(), FilterError> {
    let (section, method) = (call.section(), call.method());

    if !match_proxy_type(proxy_type, section, method) {
        debug!(%proxy_type, %real, section, method, "Call outside proxy scope");
        return Err(FilterError::PermissionDenied {
            proxy_type,
            real: *real,
            section: section.to_string(),
            method: method.to_string(),
        });
    }

    match call {
        Call::Proxy(
            ProxyCall::AddProxy {
                proxy_type: requested,
                ..
            }
            | ProxyCall::RemoveProxy {
                proxy_type: requested,
                ..
            },
        ) if !is_superset(proxy_type, *requested) => Err(FilterError::PermissionEscalation {
            proxy_type,
            real: *real,
            requested: *requested,
        }),
        Call::Proxy(ProxyCall::KillPure { .. } | ProxyCall::RemoveProxies)
            if proxy_type != ProxyType::Any =>
        {
            Err(FilterError::UnauthorizedManagement {
                proxy_type,
                real: *real,
                method: method.to_string(),
            })
        }
        Call::Proxy(ProxyCall::Proxy {
            real: nested,
            force_proxy_type: Some(nested_type),
            call,
        }) => call_filter(*nested_type, nested, call),
        _ => match call.batched() {
            Some(calls) => calls
                .iter()
                .try_for_each(|inner| call_filter(proxy_type, real, inner)),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpaqueCall, UtilityCall};
    use proptest::prelude::*;

    fn real() -> AccountId {
        AccountId([7; 32])
    }

    fn transfer() -> Call {
        Call::other("balances", "transferKeepAlive", [5, 3])
    }

    fn vote() -> Call {
        Call::other("referenda", "submit", [21, 0])
    }

    fn any_proxy_type() -> impl Strategy<Value = ProxyType> {
        proptest::sample::select(ProxyType::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn superset_is_reflexive(x in any_proxy_type()) {
            prop_assert!(is_superset(x, x));
        }

        #[test]
        fn any_is_superset_of_everything(y in any_proxy_type()) {
            prop_assert!(is_superset(ProxyType::Any, y));
        }

        #[test]
        fn only_any_covers_any(x in any_proxy_type()) {
            prop_assert_eq!(is_superset(x, ProxyType::Any), x == ProxyType::Any);
        }
    }

    #[test]
    fn it_lists_explicit_superset_pairs() {
        assert!(is_superset(ProxyType::Assets, ProxyType::AssetOwner));
        assert!(is_superset(ProxyType::Assets, ProxyType::AssetManager));
        assert!(is_superset(ProxyType::NonTransfer, ProxyType::Collator));
        assert!(!is_superset(ProxyType::AssetOwner, ProxyType::Assets));
        assert!(!is_superset(ProxyType::NonTransfer, ProxyType::Governance));
    }

    #[test]
    fn it_denies_transfers_to_governance() {
        let result = call_filter(ProxyType::Governance, &real(), &transfer());
        assert!(matches!(
            result,
            Err(FilterError::PermissionDenied { section, .. }) if section == "balances"
        ));
        assert_eq!(call_filter(ProxyType::Governance, &real(), &vote()), Ok(()));
    }

    #[test]
    fn it_denies_transfers_to_non_transfer() {
        assert!(!match_proxy_type(ProxyType::NonTransfer, "balances", "transferAll"));
        assert!(!match_proxy_type(ProxyType::NonTransfer, "vesting", "vestedTransfer"));
        assert!(match_proxy_type(ProxyType::NonTransfer, "vesting", "vest"));
        assert!(match_proxy_type(ProxyType::NonTransfer, "staking", "nominate"));
    }

    #[test]
    fn it_checks_asset_roles_per_method() {
        assert!(match_proxy_type(ProxyType::AssetOwner, "assets", "setTeam"));
        assert!(!match_proxy_type(ProxyType::AssetOwner, "assets", "mint"));
        assert!(match_proxy_type(ProxyType::AssetManager, "assets", "mint"));
        assert!(!match_proxy_type(ProxyType::AssetManager, "assets", "transfer"));
    }

    #[test]
    fn it_blocks_permission_escalation() {
        let grant_any = Call::from(ProxyCall::AddProxy {
            delegate: AccountId([1; 32]),
            proxy_type: ProxyType::Any,
            delay: 0,
        });
        assert!(matches!(
            call_filter(ProxyType::NonTransfer, &real(), &grant_any),
            Err(FilterError::PermissionEscalation {
                requested: ProxyType::Any,
                ..
            })
        ));

        let grant_collator = Call::from(ProxyCall::AddProxy {
            delegate: AccountId([1; 32]),
            proxy_type: ProxyType::Collator,
            delay: 0,
        });
        assert_eq!(
            call_filter(ProxyType::NonTransfer, &real(), &grant_collator),
            Ok(())
        );
    }

    #[test]
    fn it_requires_any_for_management() {
        let kill = Call::from(ProxyCall::RemoveProxies);
        assert!(matches!(
            call_filter(ProxyType::NonTransfer, &real(), &kill),
            Err(FilterError::UnauthorizedManagement { .. })
        ));
        assert_eq!(call_filter(ProxyType::Any, &real(), &kill), Ok(()));
    }

    #[test]
    fn it_checks_every_batched_call() {
        let batch = Call::from(UtilityCall::BatchAll {
            calls: vec![vote(), transfer()],
        });
        assert!(matches!(
            call_filter(ProxyType::Governance, &real(), &batch),
            Err(FilterError::PermissionDenied { .. })
        ));

        let votes = Call::from(UtilityCall::Batch {
            calls: vec![vote(), vote()],
        });
        assert_eq!(call_filter(ProxyType::Governance, &real(), &votes), Ok(()));
    }

    #[test]
    fn it_checks_nested_proxies_with_their_declared_type() {
        let nested = Call::from(ProxyCall::Proxy {
            real: AccountId([9; 32]),
            force_proxy_type: Some(ProxyType::Staking),
            call: Box::new(Call::Other(OpaqueCall::new("staking", "bond", [7, 0]))),
        });
        assert_eq!(call_filter(ProxyType::NonTransfer, &real(), &nested), Ok(()));

        let escaping = Call::from(ProxyCall::Proxy {
            real: AccountId([9; 32]),
            force_proxy_type: Some(ProxyType::Staking),
            call: Box::new(transfer()),
        });
        assert!(matches!(
            call_filter(ProxyType::NonTransfer, &real(), &escaping),
            Err(FilterError::PermissionDenied { real, .. }) if real == AccountId([9; 32])
        ));
    }
}
