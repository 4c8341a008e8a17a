use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EncodeError, ProxyType};

/// Where a runtime places the pallets and proxy scopes that [`Call`]
/// encodes structurally.
///
/// Call indices inside the multisig, proxy and utility pallets are fixed by
/// the pallets themselves. The pallet indices and the numbering of the
/// runtime's `ProxyType` enum differ between networks and come from the
/// runtime metadata.
///
/// [`Call`]: crate::Call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallIndices {
    /// Index of the multisig pallet.
    pub multisig: u8,
    /// Index of the proxy pallet.
    pub proxy: u8,
    /// Index of the utility pallet.
    pub utility: u8,
    /// Variant index of every proxy scope the runtime defines.
    pub proxy_types: BTreeMap<ProxyType, u8>,
}

impl CallIndices {
    /// The Polkadot relay chain.
    pub fn polkadot() -> Self {
        Self {
            multisig: 30,
            proxy: 29,
            utility: 26,
            // 4 was `SudoBalances` and stays retired.
            proxy_types: BTreeMap::from([
                (ProxyType::Any, 0),
                (ProxyType::NonTransfer, 1),
                (ProxyType::Governance, 2),
                (ProxyType::Staking, 3),
                (ProxyType::IdentityJudgement, 5),
                (ProxyType::CancelProxy, 6),
                (ProxyType::Auction, 7),
                (ProxyType::NominationPools, 8),
                (ProxyType::ParaRegistration, 9),
            ]),
        }
    }

    /// The runtime's variant index for `proxy_type`.
    pub fn proxy_type(&self, proxy_type: ProxyType) -> Result<u8, EncodeError> {
        self.proxy_types
            .get(&proxy_type)
            .copied()
            .ok_or(EncodeError::UnsupportedProxyType(proxy_type))
    }
}

impl Default for CallIndices {
    fn default() -> Self {
        Self::polkadot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_numbers_proxy_types_like_the_polkadot_runtime() {
        let indices = CallIndices::polkadot();
        assert_eq!(indices.proxy_type(ProxyType::Staking), Ok(3));
        assert_eq!(indices.proxy_type(ProxyType::IdentityJudgement), Ok(5));
        assert_eq!(indices.proxy_type(ProxyType::ParaRegistration), Ok(9));
        assert_eq!(
            indices.proxy_type(ProxyType::Assets),
            Err(EncodeError::UnsupportedProxyType(ProxyType::Assets))
        );
    }

    #[test]
    fn it_reads_another_runtime_from_json() {
        let indices: CallIndices = serde_json::from_str(
            r#"{
                "multisig": 41,
                "proxy": 42,
                "utility": 40,
                "proxyTypes": { "Any": 0, "NonTransfer": 1, "CancelProxy": 2, "Assets": 3 }
            }"#,
        )
        .unwrap();
        assert_eq!(indices.proxy, 42);
        assert_eq!(indices.proxy_type(ProxyType::Assets), Ok(3));
        assert!(indices.proxy_type(ProxyType::Staking).is_err());
    }
}
