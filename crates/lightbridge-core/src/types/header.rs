use crate::error::VerificationError;
use crate::types::crypto::{hex_hash, merkle_root, sha256, uint64_to_leaf, Address, BlsSignature, Hash};
use crate::types::validator::ValidatorSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Block height on the remote chain.
pub type Height = u64;

/// Merkle root of the remote chain's application state.
pub type MerkleRoot = Hash;

/// Maximum length of a chain id, in bytes.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// Domain type mixed into every commit signing root.
pub const DOMAIN_COMMIT: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Identifier of a remote chain. Fixed for the lifetime of a client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Result<Self, VerificationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VerificationError::InvalidChainId {
                chain_id: id,
                reason: "chain id cannot be blank".into(),
            });
        }
        if id.len() > MAX_CHAIN_ID_LEN {
            let reason = format!("longer than {} bytes", MAX_CHAIN_ID_LEN);
            return Err(VerificationError::InvalidChainId { chain_id: id, reason });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChainId {
    type Error = VerificationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block time as nanoseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_unix_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn from_unix_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    pub const fn unix_nanos(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is not before `self`.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// `self + duration`, clamped at the largest representable time.
    pub fn saturating_add(self, duration: Duration) -> Timestamp {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / 1_000_000_000, self.0 % 1_000_000_000)
    }
}

/// A remote chain block header: the minimal fields needed to track the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub chain_id: ChainId,
    pub height: Height,
    pub time: Timestamp,
    /// Hash of the validator set that signs this block.
    #[serde(with = "hex_hash")]
    pub validators_hash: Hash,
    /// Root of the application state after this block.
    #[serde(with = "hex_hash")]
    pub app_hash: MerkleRoot,
}

impl Header {
    /// Merkle root of the header fields.
    ///
    /// Five 32-byte leaves, padded to eight:
    /// `[sha256(chain_id), height, time, validators_hash, app_hash, 0, 0, 0]`.
    pub fn hash(&self) -> Hash {
        merkle_root(&[
            sha256(self.chain_id.as_str().as_bytes()),
            uint64_to_leaf(self.height),
            uint64_to_leaf(self.time.unix_nanos()),
            self.validators_hash,
            self.app_hash,
        ])
    }
}

/// One validator's vote inside a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSig {
    pub validator_address: Address,
    pub signature: BlsSignature,
}

/// Signatures attesting that the block with `block_hash` was finalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub height: Height,
    #[serde(with = "hex_hash")]
    pub block_hash: Hash,
    pub signatures: Vec<CommitSig>,
}

/// A header submitted for verification, together with the validator set
/// that produced it and the commit that signs it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateHeader {
    pub header: Header,
    pub commit: Commit,
    pub validator_set: ValidatorSet,
}

impl CandidateHeader {
    pub fn chain_id(&self) -> &ChainId {
        &self.header.chain_id
    }

    pub fn height(&self) -> Height {
        self.header.height
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.time
    }

    pub fn root(&self) -> MerkleRoot {
        self.header.app_hash
    }
}

/// Compute the domain for commit signing.
/// domain = domain_type + sha256(chain_id)[:28]
pub fn compute_domain(domain_type: &[u8; 4], chain_id: &ChainId) -> Hash {
    let chain_root = sha256(chain_id.as_str().as_bytes());
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&chain_root[..28]);
    domain
}

/// Compute the signing root for a block hash on the given chain.
/// This is what validators actually sign: the block hash wrapped in a
/// chain-specific domain, so that a commit cannot be replayed across chains.
pub fn compute_signing_root(block_hash: &Hash, chain_id: &ChainId) -> Hash {
    let domain = compute_domain(&DOMAIN_COMMIT, chain_id);
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(block_hash);
    data[32..].copy_from_slice(&domain);
    sha256(&data)
}
