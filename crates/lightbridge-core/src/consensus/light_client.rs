use crate::consensus::bisection::{verify_bisecting, HeaderSource};
use crate::error::VerificationError;
use crate::types::header::{CandidateHeader, Height, Timestamp};
use crate::types::state::TrustedState;
use tracing::debug;

/// Check a candidate header against the trusted state and, if it is valid,
/// return the next trusted state.
///
/// This is the full verification pipeline:
/// 1. Rejects headers for a frozen client
/// 2. Validates chain id, trusting period, clock drift and monotonicity
/// 3. Checks the commit and validator set belong to the header
/// 4. Verifies the commit is signed by 2/3 of the header's own validator set
/// 5. Verifies 1/3 (the trust level) of the trusted set also signed, bisecting
///    through `source` when the trusted set no longer covers the header
/// 6. Builds the new state from the candidate
///
/// The input state is never modified. On error, the caller keeps using it.
pub fn check_validity_and_update_state<S>(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    source: &S,
    now: Timestamp,
) -> Result<TrustedState, VerificationError>
where
    S: HeaderSource + ?Sized,
{
    if let Some(frozen_height) = trusted.frozen_height {
        return Err(VerificationError::ClientFrozen { frozen_height });
    }

    let next = verify_bisecting(trusted, candidate, source, now)?;

    debug!(
        chain_id = %next.chain_id,
        from_height = trusted.height,
        to_height = next.height,
        "header verified"
    );
    Ok(next)
}

/// Build the trusted state for an already-verified candidate.
///
/// Height, time, validator set and root come from the candidate. Chain id,
/// trusting period, clock drift, trust level and frozen height carry over.
pub fn apply_header(trusted: &TrustedState, candidate: &CandidateHeader) -> TrustedState {
    TrustedState {
        chain_id: trusted.chain_id.clone(),
        height: candidate.height(),
        timestamp: candidate.timestamp(),
        validator_set: candidate.validator_set.clone(),
        root: candidate.root(),
        trusting_period: trusted.trusting_period,
        max_clock_drift: trusted.max_clock_drift,
        trust_level: trusted.trust_level,
        frozen_height: trusted.frozen_height,
    }
}

/// Mark a trusted state as frozen after misbehaviour at `height` was proven.
/// An already frozen state keeps its original frozen height.
pub fn freeze(trusted: &TrustedState, height: Height) -> TrustedState {
    TrustedState {
        frozen_height: trusted.frozen_height.or(Some(height)),
        ..trusted.clone()
    }
}
