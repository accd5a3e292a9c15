use crate::error::VerificationError;
use crate::types::crypto::{hex_hash, Hash};
use crate::types::header::{ChainId, Height, MerkleRoot, Timestamp};
use crate::types::validator::ValidatorSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A fraction of voting power, compared with integer arithmetic only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TrustLevelData")]
pub struct TrustLevel {
    numerator: u64,
    denominator: u64,
}

#[derive(Deserialize)]
struct TrustLevelData {
    numerator: u64,
    denominator: u64,
}

impl TryFrom<TrustLevelData> for TrustLevel {
    type Error = VerificationError;

    fn try_from(data: TrustLevelData) -> Result<Self, Self::Error> {
        TrustLevel::new(data.numerator, data.denominator)
    }
}

impl TrustLevel {
    /// Default fraction of the trusted set that must sign a skipped-to header.
    pub const ONE_THIRD: TrustLevel = TrustLevel {
        numerator: 1,
        denominator: 3,
    };

    /// Fraction of its own set a commit needs to be valid at all.
    pub const TWO_THIRDS: TrustLevel = TrustLevel {
        numerator: 2,
        denominator: 3,
    };

    /// Build a trust level within [1/3, 1].
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, VerificationError> {
        let invalid = VerificationError::InvalidTrustLevel {
            numerator,
            denominator,
        };
        if denominator == 0 || numerator > denominator {
            return Err(invalid);
        }
        // numerator / denominator >= 1/3
        if u128::from(numerator) * 3 < u128::from(denominator) {
            return Err(invalid);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// `signed / total >= numerator / denominator`, cross-multiplied in u128.
    pub fn is_met(&self, signed: u64, total: u64) -> bool {
        u128::from(signed) * u128::from(self.denominator)
            >= u128::from(total) * u128::from(self.numerator)
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self::ONE_THIRD
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Serde adapter for durations as whole seconds.
///
/// Sub-second durations fail to serialize rather than being truncated.
pub mod duration_secs {
    use serde::{ser::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if d.subsec_nanos() != 0 {
            return Err(S::Error::custom(format!(
                "duration {:?} is not a whole number of seconds",
                d
            )));
        }
        serializer.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// The last header accepted for a remote chain.
///
/// Exactly one of these exists per tracked chain. It is replaced wholesale
/// after each successful verification and never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedState {
    pub chain_id: ChainId,
    pub height: Height,
    pub timestamp: Timestamp,
    /// The validator set that signed `height`.
    pub validator_set: ValidatorSet,
    #[serde(with = "hex_hash")]
    pub root: MerkleRoot,
    #[serde(with = "duration_secs")]
    pub trusting_period: Duration,
    #[serde(with = "duration_secs")]
    pub max_clock_drift: Duration,
    #[serde(default)]
    pub trust_level: TrustLevel,
    /// Set once misbehaviour has been proven; a frozen state accepts nothing.
    #[serde(default)]
    pub frozen_height: Option<Height>,
}

impl TrustedState {
    /// Whether the trusting period has elapsed as of `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.saturating_duration_since(self.timestamp) >= self.trusting_period
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_height.is_some()
    }

    pub fn status(&self, now: Timestamp) -> Status {
        if self.is_frozen() {
            Status::Frozen
        } else if self.is_expired(now) {
            Status::Expired
        } else {
            Status::Active
        }
    }

    /// The per-height record derived from this state.
    pub fn consensus_state(&self) -> ConsensusState {
        ConsensusState {
            height: self.height,
            timestamp: self.timestamp,
            root: self.root,
            validators_hash: self.validator_set.hash(),
        }
    }
}

/// Consensus information recorded for each accepted height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    pub height: Height,
    pub timestamp: Timestamp,
    #[serde(with = "hex_hash")]
    pub root: MerkleRoot,
    #[serde(with = "hex_hash")]
    pub validators_hash: Hash,
}

/// Whether a client may be used for verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Expired,
    Frozen,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => f.write_str("Active"),
            Status::Expired => f.write_str("Expired"),
            Status::Frozen => f.write_str("Frozen"),
        }
    }
}
