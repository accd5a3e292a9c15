use crate::types::crypto::Address;
use crate::types::header::{ChainId, Height, Timestamp};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by header verification and trusted-state construction.
/// Each variant represents a specific, actionable failure. None of them is
/// retried inside this crate, and none of them mutates a trusted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Header chain id {got} does not match client chain id {expected}")]
    ChainIdMismatch { expected: ChainId, got: ChainId },

    #[error("Trusting period expired: {elapsed:?} since last trusted header (trusting period {trusting_period:?})")]
    TrustingPeriodExpired {
        elapsed: Duration,
        trusting_period: Duration,
    },

    #[error("Header time is {elapsed:?} past the trusted header, outside the trusting period {trusting_period:?}")]
    HeaderOutsideTrustingPeriod {
        elapsed: Duration,
        trusting_period: Duration,
    },

    #[error("Header time {header_time} is not after trusted header time {trusted_time}")]
    NonMonotonicTimestamp {
        header_time: Timestamp,
        trusted_time: Timestamp,
    },

    #[error("Header height {header_height} is not above trusted height {trusted_height}")]
    NonMonotonicHeight {
        header_height: Height,
        trusted_height: Height,
    },

    #[error("Header time {header_time} is in the future (now {now}, max clock drift {max_clock_drift:?})")]
    HeaderFromFuture {
        header_time: Timestamp,
        now: Timestamp,
        max_clock_drift: Duration,
    },

    #[error("Commit height {commit_height} does not match header height {header_height}")]
    CommitHeightMismatch {
        commit_height: Height,
        header_height: Height,
    },

    #[error("Commit signs block 0x{}, header hashes to 0x{}", hex::encode(.commit), hex::encode(.header))]
    CommitBlockHashMismatch { commit: [u8; 32], header: [u8; 32] },

    #[error("Header validators hash 0x{} does not match validator set hash 0x{}", hex::encode(.header), hex::encode(.validator_set))]
    ValidatorSetHashMismatch {
        header: [u8; 32],
        validator_set: [u8; 32],
    },

    #[error("Insufficient voting power: {signed}/{total} signed (need at least {numerator}/{denominator})")]
    InsufficientVotingPower {
        signed: u64,
        total: u64,
        numerator: u64,
        denominator: u64,
    },

    #[error("Commit signature from {address} is not attributable to any member of the validator set")]
    UnknownSigner { address: Address },

    #[error("Invalid BLS signature from validator {address}")]
    InvalidSignature { address: Address },

    #[error("Invalid BLS public key for validator {address}: {reason}")]
    InvalidPublicKey { address: Address, reason: String },

    #[error("No chain of trusted steps from height {trusted_height} to height {target_height}")]
    BisectionExhausted {
        trusted_height: Height,
        target_height: Height,
    },

    #[error("Intermediate header source returned height {got} for requested height {requested}")]
    UnexpectedIntermediateHeight { requested: Height, got: Height },

    #[error("Client is frozen at height {frozen_height}")]
    ClientFrozen { frozen_height: Height },

    #[error("Header of type {header} cannot update a {client} client")]
    ClientTypeMismatch {
        client: &'static str,
        header: &'static str,
    },

    #[error("Invalid validator set: {reason}")]
    InvalidValidatorSet { reason: String },

    #[error("Invalid trust level {numerator}/{denominator}: must be within [1/3, 1]")]
    InvalidTrustLevel { numerator: u64, denominator: u64 },

    #[error("Invalid chain id {chain_id:?}: {reason}")]
    InvalidChainId { chain_id: String, reason: String },

    #[error("Invalid trust options: {reason}")]
    InvalidTrustOptions { reason: String },
}

impl VerificationError {
    /// Whether the failure concerns only the pairing of this commit with the
    /// trusted validator set, so that a different trusted state reached
    /// through intermediate headers could still accept the header.
    pub fn is_insufficient_overlap(&self) -> bool {
        matches!(self, VerificationError::InsufficientVotingPower { .. })
    }
}
