use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The size of a BLAKE2b-256 digest in bytes.
pub const H256_SIZE: usize = 32;

type Blake2b256 = Blake2b<U32>;

/// Computes the 256-bit BLAKE2b digest of `bytes`.
///
/// This is the hasher the runtime uses for call hashes, multisig account
/// derivation and pure account derivation.
pub fn blake2_256(bytes: &[u8]) -> [u8; H256_SIZE] {
    let mut digest = [0u8; H256_SIZE];
    digest.copy_from_slice(&Blake2b256::digest(bytes));
    digest
}

/// Computes the 512-bit BLAKE2b digest over the concatenation of `chunks`.
pub fn blake2_512<'a, I>(chunks: I) -> [u8; 64]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Blake2b512::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// A 256-bit hash, used to identify calls.
///
/// Serialized as a `0x` prefixed lowercase hex string.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct H256(pub [u8; H256_SIZE]);

impl H256 {
    /// Hashes `bytes` with BLAKE2b-256.
    pub fn hash(bytes: &[u8]) -> Self {
        Self(blake2_256(bytes))
    }

    /// The raw digest bytes.
    pub fn bytes(&self) -> &[u8; H256_SIZE] {
        &self.0
    }
}

impl From<[u8; H256_SIZE]> for H256 {
    fn from(value: [u8; H256_SIZE]) -> Self {
        H256(value)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for H256 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text.strip_prefix("0x").unwrap_or(&text);
        let mut bytes = [0u8; H256_SIZE];
        hex::decode_to_slice(digits, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(H256(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_hashes_the_empty_input() {
        // Known BLAKE2b-256 digest of the empty string.
        assert_eq!(
            hex::encode(blake2_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn it_round_trips_through_hex() {
        let hash = H256::hash(b"remark");
        let json = serde_json::to_string(&hash).unwrap();
        assert!(json.starts_with("\"0x"));
        let decoded: H256 = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, hash);
    }
}
