use crate::error::VerificationError;
use crate::types::crypto::Hash;
use crate::types::header::Header;
use crate::types::state::{duration_secs, TrustLevel, TrustedState};
use crate::types::validator::ValidatorSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default tolerance for clock skew between us and the remote chain.
pub const DEFAULT_MAX_CLOCK_DRIFT: Duration = Duration::from_secs(10);

/// Errors parsing operator-supplied checkpoint data.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint hash format invalid: {reason}")]
    InvalidFormat { reason: String },

    #[error("Checkpoint JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-client trust parameters, fixed when the client is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustOptions {
    #[serde(with = "duration_secs")]
    pub trusting_period: Duration,
    #[serde(with = "duration_secs", default = "default_max_clock_drift")]
    pub max_clock_drift: Duration,
    #[serde(default)]
    pub trust_level: TrustLevel,
}

fn default_max_clock_drift() -> Duration {
    DEFAULT_MAX_CLOCK_DRIFT
}

impl TrustOptions {
    pub fn new(trusting_period: Duration) -> Self {
        Self {
            trusting_period,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT,
            trust_level: TrustLevel::default(),
        }
    }

    fn validate(&self) -> Result<(), VerificationError> {
        if self.trusting_period.is_zero() {
            return Err(VerificationError::InvalidTrustOptions {
                reason: "trusting period must be positive".into(),
            });
        }
        if self.trusting_period.subsec_nanos() != 0 || self.max_clock_drift.subsec_nanos() != 0 {
            return Err(VerificationError::InvalidTrustOptions {
                reason: "durations must be whole seconds".into(),
            });
        }
        if self.max_clock_drift >= self.trusting_period {
            return Err(VerificationError::InvalidTrustOptions {
                reason: format!(
                    "max clock drift {:?} must be shorter than trusting period {:?}",
                    self.max_clock_drift, self.trusting_period
                ),
            });
        }
        // Re-check in case the fields were built by hand.
        TrustLevel::new(self.trust_level.numerator(), self.trust_level.denominator())?;
        Ok(())
    }
}

/// The operator-supplied starting point for a client.
///
/// This is the one moment of trust: the header and validator set must have
/// been obtained out of band. Once a client exists, every later state is
/// reached only through verified headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedCheckpoint {
    pub header: Header,
    pub validator_set: ValidatorSet,
}

impl TrustedCheckpoint {
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Create the first trusted state of a client from a checkpoint.
pub fn initialize_from_checkpoint(
    checkpoint: &TrustedCheckpoint,
    options: &TrustOptions,
) -> Result<TrustedState, VerificationError> {
    options.validate()?;

    let set_hash = checkpoint.validator_set.hash();
    if checkpoint.header.validators_hash != set_hash {
        return Err(VerificationError::ValidatorSetHashMismatch {
            header: checkpoint.header.validators_hash,
            validator_set: set_hash,
        });
    }

    Ok(TrustedState {
        chain_id: checkpoint.header.chain_id.clone(),
        height: checkpoint.header.height,
        timestamp: checkpoint.header.time,
        validator_set: checkpoint.validator_set.clone(),
        root: checkpoint.header.app_hash,
        trusting_period: options.trusting_period,
        max_clock_drift: options.max_clock_drift,
        trust_level: options.trust_level,
        frozen_height: None,
    })
}

/// Parse a hex-encoded 32-byte hash, with or without a `0x` prefix.
pub fn parse_hash_hex(hex_str: &str) -> Result<Hash, CheckpointError> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    if hex_str.len() != 64 {
        return Err(CheckpointError::InvalidFormat {
            reason: format!("Expected 64 hex characters, got {}", hex_str.len()),
        });
    }

    let bytes = hex::decode(hex_str).map_err(|e| CheckpointError::InvalidFormat {
        reason: format!("Invalid hex: {}", e),
    })?;

    let mut result = [0u8; 32];
    result.copy_from_slice(&bytes);
    Ok(result)
}
