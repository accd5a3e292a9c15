//! Cheap, non-cryptographic checks that run before any signature is touched.

use crate::error::VerificationError;
use crate::types::header::{CandidateHeader, Timestamp};
use crate::types::state::TrustedState;

/// Check that `candidate` may be verified against `trusted` at wall-clock `now`.
///
/// The checks run in a fixed order and the first failure wins:
/// 1. same chain id
/// 2. trusted state not expired as of `now`
/// 3. candidate time within the trusting period of the trusted time
/// 4. candidate time strictly after the trusted time
/// 5. candidate height strictly above the trusted height
/// 6. candidate time not beyond `now + max_clock_drift`
pub fn check_preconditions(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    now: Timestamp,
) -> Result<(), VerificationError> {
    if candidate.chain_id() != &trusted.chain_id {
        return Err(VerificationError::ChainIdMismatch {
            expected: trusted.chain_id.clone(),
            got: candidate.chain_id().clone(),
        });
    }

    // Measured against `now`, so no header can revive an expired client.
    let elapsed = now.saturating_duration_since(trusted.timestamp);
    if elapsed >= trusted.trusting_period {
        return Err(VerificationError::TrustingPeriodExpired {
            elapsed,
            trusting_period: trusted.trusting_period,
        });
    }

    let header_elapsed = candidate.timestamp().saturating_duration_since(trusted.timestamp);
    if header_elapsed >= trusted.trusting_period {
        return Err(VerificationError::HeaderOutsideTrustingPeriod {
            elapsed: header_elapsed,
            trusting_period: trusted.trusting_period,
        });
    }

    if candidate.timestamp() <= trusted.timestamp {
        return Err(VerificationError::NonMonotonicTimestamp {
            header_time: candidate.timestamp(),
            trusted_time: trusted.timestamp,
        });
    }

    if candidate.height() <= trusted.height {
        return Err(VerificationError::NonMonotonicHeight {
            header_height: candidate.height(),
            trusted_height: trusted.height,
        });
    }

    if candidate.timestamp() > now.saturating_add(trusted.max_clock_drift) {
        return Err(VerificationError::HeaderFromFuture {
            header_time: candidate.timestamp(),
            now,
            max_clock_drift: trusted.max_clock_drift,
        });
    }

    Ok(())
}

/// Check that the commit and validator set in `candidate` belong to its header.
pub fn validate_basic(candidate: &CandidateHeader) -> Result<(), VerificationError> {
    let header = &candidate.header;

    if candidate.commit.height != header.height {
        return Err(VerificationError::CommitHeightMismatch {
            commit_height: candidate.commit.height,
            header_height: header.height,
        });
    }

    let header_hash = header.hash();
    if candidate.commit.block_hash != header_hash {
        return Err(VerificationError::CommitBlockHashMismatch {
            commit: candidate.commit.block_hash,
            header: header_hash,
        });
    }

    let set_hash = candidate.validator_set.hash();
    if header.validators_hash != set_hash {
        return Err(VerificationError::ValidatorSetHashMismatch {
            header: header.validators_hash,
            validator_set: set_hash,
        });
    }

    Ok(())
}
