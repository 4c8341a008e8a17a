//! Account identifiers and their SS58 text representation.

use std::{fmt, str::FromStr};

use base58::{FromBase58, ToBase58};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::blake2_512;

/// The size of an account identifier in bytes.
pub const ACCOUNT_ID_SIZE: usize = 32;

/// Generic Substrate SS58 prefix.
pub const GENERIC_SS58_PREFIX: u16 = 42;

/// Largest prefix the two-byte SS58 form can carry.
pub const MAX_SS58_PREFIX: u16 = 0x3fff;

const SS58_CHECKSUM_PREIMAGE: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;

/// Error produced when parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The text is neither valid base58 nor valid hex.
    #[error("Invalid address encoding: {0}")]
    InvalidEncoding(String),

    /// The decoded payload has an unexpected length.
    #[error("Invalid address length: {0} bytes")]
    InvalidLength(usize),

    /// The SS58 checksum does not match the payload.
    #[error("Invalid SS58 checksum")]
    InvalidChecksum,

    /// The SS58 prefix is outside the 14-bit range or reserved.
    #[error("Invalid SS58 prefix: {0}")]
    InvalidPrefix(u16),
}

/// A network's SS58 address prefix, checked to fit the 14-bit range.
///
/// ```
/// use mandate_common::{AddressError, Ss58Prefix};
///
/// assert_eq!(Ss58Prefix::new(2_254).map(Ss58Prefix::get), Ok(2_254));
/// assert_eq!(Ss58Prefix::new(16_384), Err(AddressError::InvalidPrefix(16_384)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Ss58Prefix(u16);

impl Ss58Prefix {
    /// The generic Substrate prefix.
    pub const GENERIC: Ss58Prefix = Ss58Prefix(GENERIC_SS58_PREFIX);

    /// Checks that `prefix` can be encoded.
    pub fn new(prefix: u16) -> Result<Self, AddressError> {
        if prefix > MAX_SS58_PREFIX {
            return Err(AddressError::InvalidPrefix(prefix));
        }
        Ok(Self(prefix))
    }

    /// The numeric prefix.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for Ss58Prefix {
    fn default() -> Self {
        Self::GENERIC
    }
}

impl TryFrom<u16> for Ss58Prefix {
    type Error = AddressError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ss58Prefix> for u16 {
    fn from(value: Ss58Prefix) -> Self {
        value.0
    }
}

impl fmt::Display for Ss58Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 32-byte account identifier.
///
/// Identity, ordering and hashing are defined on the raw bytes, so the same
/// account parsed from two different SS58 networks compares equal. Use
/// [`AccountId::to_ss58`] to render it for a given network.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct AccountId(pub [u8; ACCOUNT_ID_SIZE]);

impl AccountId {
    /// Returns the raw identifier bytes.
    pub fn bytes(&self) -> &[u8; ACCOUNT_ID_SIZE] {
        &self.0
    }

    /// Encodes this identifier as an SS58 address for the given prefix.
    pub fn to_ss58(&self, prefix: Ss58Prefix) -> String {
        let mut payload = encode_prefix(prefix);
        payload.extend_from_slice(&self.0);
        let checksum = blake2_512([SS58_CHECKSUM_PREIMAGE, payload.as_slice()]);
        payload.extend_from_slice(&checksum[..SS58_CHECKSUM_LEN]);
        payload.to_base58()
    }

    /// Parses an SS58 address (any network prefix) or a `0x` hex identifier.
    ///
    /// Returns the identifier together with the network prefix it was
    /// encoded with (`None` for hex input).
    pub fn parse(text: &str) -> Result<(Self, Option<u16>), AddressError> {
        if let Some(digits) = text.strip_prefix("0x") {
            let bytes =
                hex::decode(digits).map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
            return Ok((Self::try_from(bytes.as_slice())?, None));
        }

        let data = text
            .from_base58()
            .map_err(|e| AddressError::InvalidEncoding(format!("{e:?}")))?;

        let (prefix, prefix_len) = decode_prefix(&data)?;
        let body_len = prefix_len + ACCOUNT_ID_SIZE;
        if data.len() != body_len + SS58_CHECKSUM_LEN {
            return Err(AddressError::InvalidLength(data.len()));
        }

        let checksum = blake2_512([SS58_CHECKSUM_PREIMAGE, &data[..body_len]]);
        if checksum[..SS58_CHECKSUM_LEN] != data[body_len..] {
            return Err(AddressError::InvalidChecksum);
        }

        Ok((Self::try_from(&data[prefix_len..body_len])?, Some(prefix)))
    }
}

/// Re-encodes `address` for the network identified by `prefix`.
///
/// Re-encoding is idempotent: applying it to its own output returns the
/// output unchanged.
pub fn reencode(address: &str, prefix: u16) -> Result<String, AddressError> {
    let prefix = Ss58Prefix::new(prefix)?;
    let (account, _) = AccountId::parse(address)?;
    Ok(account.to_ss58(prefix))
}

fn encode_prefix(prefix: Ss58Prefix) -> Vec<u8> {
    let prefix = prefix.get();
    match prefix {
        0..=63 => vec![prefix as u8],
        _ => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first | 0b0100_0000, second]
        }
    }
}

fn decode_prefix(data: &[u8]) -> Result<(u16, usize), AddressError> {
    match data.first() {
        Some(&first) if first < 64 => Ok((first as u16, 1)),
        Some(&first) if first < 128 => {
            let second = *data.get(1).ok_or(AddressError::InvalidLength(data.len()))?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            Ok(((lower as u16) | ((upper as u16) << 8), 2))
        }
        Some(&first) => Err(AddressError::InvalidPrefix(first as u16)),
        None => Err(AddressError::InvalidLength(0)),
    }
}

impl TryFrom<&[u8]> for AccountId {
    type Error = AddressError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ACCOUNT_ID_SIZE] = value
            .try_into()
            .map_err(|_| AddressError::InvalidLength(value.len()))?;
        Ok(AccountId(bytes))
    }
}

impl From<[u8; ACCOUNT_ID_SIZE]> for AccountId {
    fn from(value: [u8; ACCOUNT_ID_SIZE]) -> Self {
        AccountId(value)
    }
}

impl FromStr for AccountId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s)?.0)
    }
}

/// Renders with the generic Substrate prefix.
impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ss58(Ss58Prefix::GENERIC))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    // Well known development account (//Alice).
    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_POLKADOT: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";

    #[test]
    fn it_parses_generic_ss58() {
        let (account, prefix) = AccountId::parse(ALICE).unwrap();
        assert_eq!(prefix, Some(42));
        assert_eq!(format!("0x{}", hex::encode(account.bytes())), ALICE_HEX);
    }

    #[test]
    fn it_reencodes_for_another_network() {
        assert_eq!(reencode(ALICE, 0).unwrap(), ALICE_POLKADOT);
        assert_eq!(reencode(ALICE_HEX, 42).unwrap(), ALICE);
    }

    #[test]
    fn it_rejects_a_corrupted_checksum() {
        let mut corrupted = ALICE.to_string();
        corrupted.pop();
        corrupted.push('Z');
        assert!(AccountId::parse(&corrupted).is_err());
    }

    #[test]
    fn it_handles_two_byte_prefixes() {
        let (account, _) = AccountId::parse(ALICE).unwrap();
        let encoded = account.to_ss58(Ss58Prefix::new(2_254).unwrap());
        let (decoded, prefix) = AccountId::parse(&encoded).unwrap();
        assert_eq!(prefix, Some(2_254));
        assert_eq!(decoded, account);
    }

    #[test]
    fn it_refuses_prefixes_outside_fourteen_bits() {
        assert_eq!(reencode(ALICE, 16_384), Err(AddressError::InvalidPrefix(16_384)));
        assert_eq!(reencode(ALICE, u16::MAX), Err(AddressError::InvalidPrefix(u16::MAX)));

        let highest = reencode(ALICE, MAX_SS58_PREFIX).unwrap();
        assert_eq!(AccountId::parse(&highest).unwrap().1, Some(MAX_SS58_PREFIX));
    }

    proptest! {
        #[test]
        fn reencoding_is_idempotent(bytes in any::<[u8; 32]>(), prefix in 0u16..16_384) {
            let address = AccountId(bytes).to_ss58(Ss58Prefix::GENERIC);
            let once = reencode(&address, prefix).unwrap();
            let twice = reencode(&once, prefix).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
