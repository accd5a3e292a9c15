use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Number of bytes in a validator address.
pub const ADDRESS_LEN: usize = 20;

/// Domain separation tag used for every commit signature.
pub const COMMIT_SIGNATURE_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// A 32-byte SHA256 digest.
pub type Hash = [u8; 32];

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey(0x{})", hex::encode(self.0))
    }
}

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("Invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// The validator address bound to this key: the first 20 bytes of its SHA256.
    pub fn address(&self) -> Address {
        let digest = sha256(&self.0);
        let mut addr = [0u8; ADDRESS_LEN];
        addr.copy_from_slice(&digest[..ADDRESS_LEN]);
        Address(addr)
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature(0x{}..)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("Invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A validator identity, derived from its public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != ADDRESS_LEN {
            return Err(serde::de::Error::custom("Invalid validator address length"));
        }
        let mut addr = [0u8; ADDRESS_LEN];
        addr.copy_from_slice(&bytes);
        Ok(Self(addr))
    }
}

/// Serde adapter for 32-byte hashes as hex strings.
pub mod hex_hash {
    use super::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("Expected a 32-byte hash"));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}

// --- Hashing helpers ---

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA256 hash of two 32-byte values concatenated.
pub fn sha256_pair(a: &Hash, b: &Hash) -> Hash {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256(&data)
}

/// Encode a u64 as a 32-byte leaf (big-endian, left zero-padded).
pub fn uint64_to_leaf(value: u64) -> Hash {
    let mut leaf = [0u8; 32];
    leaf[24..].copy_from_slice(&value.to_be_bytes());
    leaf
}

/// Binary Merkle root over `leaves`, zero-padded to the next power of two.
/// An empty list hashes to all zeroes.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let width = leaves.len().next_power_of_two();
    let mut layer: Vec<Hash> = Vec::with_capacity(width);
    layer.extend_from_slice(leaves);
    layer.resize(width, [0u8; 32]);

    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }
    layer[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint64_to_leaf() {
        let leaf = uint64_to_leaf(42);
        assert_eq!(leaf[31], 42);
        assert_eq!(leaf[..24], [0; 24]);
    }

    #[test]
    fn test_sha256_pair_is_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(sha256_pair(&a, &b), sha256_pair(&a, &b));
        assert_ne!(sha256_pair(&a, &b), sha256_pair(&b, &a));
    }

    #[test]
    fn test_merkle_root_pads_to_power_of_two() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        let c = sha256(b"c");
        let zero = [0u8; 32];

        let expected = sha256_pair(&sha256_pair(&a, &b), &sha256_pair(&c, &zero));
        assert_eq!(merkle_root(&[a, b, c]), expected);
        assert_eq!(merkle_root(&[a]), a);
        assert_eq!(merkle_root(&[]), zero);
    }

    #[test]
    fn test_public_key_hex_roundtrip_accepts_prefix() {
        let pk = BlsPublicKey([0x11; BLS_PUBKEY_LEN]);
        let json = serde_json::to_string(&pk).unwrap();
        let prefixed = format!("\"0x{}\"", json.trim_matches('"'));
        let parsed: BlsPublicKey = serde_json::from_str(&prefixed).unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn test_signature_rejects_wrong_length() {
        assert!(BlsSignature::from_bytes(&[0u8; 95]).is_err());
        assert!(BlsSignature::from_bytes(&[0u8; 96]).is_ok());
    }

    #[test]
    fn test_address_is_prefix_of_key_hash() {
        let pk = BlsPublicKey([0x22; BLS_PUBKEY_LEN]);
        assert_eq!(pk.address().0[..], sha256(&pk.0)[..ADDRESS_LEN]);
    }
}
