use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A proxy permission scope.
///
/// The set is closed: every table in this crate matches on it exhaustively,
/// so adding a scope forces each table to decide what it allows. Runtimes
/// number the scopes they define differently; see
/// [`CallIndices`](crate::CallIndices) for their encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProxyType {
    /// Unrestricted.
    Any,
    /// Everything except moving balances or assets.
    NonTransfer,
    /// Voting, referenda and treasury.
    Governance,
    /// Staking, sessions and nomination pools.
    Staking,
    /// Registrar judgements only.
    IdentityJudgement,
    /// Rejecting announcements only.
    CancelProxy,
    /// Parachain auctions and crowdloans.
    Auction,
    /// Nomination pools only.
    NominationPools,
    /// Parachain registration.
    ParaRegistration,
    /// Society membership.
    Society,
    /// Remarks on behalf of the account.
    Spokesperson,
    /// All asset, NFT and unique operations.
    Assets,
    /// Asset class ownership operations.
    AssetOwner,
    /// Asset class management operations.
    AssetManager,
    /// Collator selection.
    Collator,
    /// Alliance membership and motions.
    Alliance,
    /// Fellowship collective, referenda, core and salary.
    Fellowship,
    /// Ambassador collective, referenda, core and salary.
    Ambassador,
}

impl ProxyType {
    /// Every scope, in declaration order.
    pub const ALL: [ProxyType; 18] = [
        ProxyType::Any,
        ProxyType::NonTransfer,
        ProxyType::Governance,
        ProxyType::Staking,
        ProxyType::IdentityJudgement,
        ProxyType::CancelProxy,
        ProxyType::Auction,
        ProxyType::NominationPools,
        ProxyType::ParaRegistration,
        ProxyType::Society,
        ProxyType::Spokesperson,
        ProxyType::Assets,
        ProxyType::AssetOwner,
        ProxyType::AssetManager,
        ProxyType::Collator,
        ProxyType::Alliance,
        ProxyType::Fellowship,
        ProxyType::Ambassador,
    ];

    /// The scope's name as used by the runtime metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyType::Any => "Any",
            ProxyType::NonTransfer => "NonTransfer",
            ProxyType::Governance => "Governance",
            ProxyType::Staking => "Staking",
            ProxyType::IdentityJudgement => "IdentityJudgement",
            ProxyType::CancelProxy => "CancelProxy",
            ProxyType::Auction => "Auction",
            ProxyType::NominationPools => "NominationPools",
            ProxyType::ParaRegistration => "ParaRegistration",
            ProxyType::Society => "Society",
            ProxyType::Spokesperson => "Spokesperson",
            ProxyType::Assets => "Assets",
            ProxyType::AssetOwner => "AssetOwner",
            ProxyType::AssetManager => "AssetManager",
            ProxyType::Collator => "Collator",
            ProxyType::Alliance => "Alliance",
            ProxyType::Fellowship => "Fellowship",
            ProxyType::Ambassador => "Ambassador",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized proxy type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown proxy type: {0}")]
pub struct UnknownProxyType(pub String);

impl FromStr for ProxyType {
    type Err = UnknownProxyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProxyType::ALL
            .into_iter()
            .find(|proxy_type| proxy_type.as_str() == s)
            .ok_or_else(|| UnknownProxyType(s.to_string()))
    }
}
