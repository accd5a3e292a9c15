//! Skipping verification across validator-set turnover.
//!
//! When the trusted validator set no longer signs enough of a candidate's
//! commit, trust is bridged through intermediate headers: the range between
//! the trusted height and the candidate height is split at its midpoint, the
//! midpoint header is verified against the trusted state, and the candidate
//! is then verified against the midpoint. Splitting continues until every
//! step passes the trust-level overlap check, or a step spans adjacent
//! heights and still fails.
//!
//! Intermediate headers come from a caller-supplied [`HeaderSource`]; this
//! module performs no I/O.

use crate::consensus::light_client::apply_header;
use crate::consensus::validity::{check_preconditions, validate_basic};
use crate::consensus::voting_power::{verify_adjacent, verify_self_certifying};
use crate::error::VerificationError;
use crate::types::header::{CandidateHeader, Height, Timestamp};
use crate::types::state::TrustedState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supplies intermediate headers by height.
pub trait HeaderSource {
    /// The header at exactly `height`, if one is available.
    fn header_at(&self, height: Height) -> Option<CandidateHeader>;
}

impl<F> HeaderSource for F
where
    F: Fn(Height) -> Option<CandidateHeader>,
{
    fn header_at(&self, height: Height) -> Option<CandidateHeader> {
        self(height)
    }
}

/// A source with no headers: only direct verification can succeed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIntermediateHeaders;

impl HeaderSource for NoIntermediateHeaders {
    fn header_at(&self, _height: Height) -> Option<CandidateHeader> {
        None
    }
}

/// Outcome of a successful bisection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    /// Trusted state built from the candidate.
    pub state: TrustedState,
    /// Heights of the intermediate headers the verification relied on, ascending.
    pub supporting: Vec<Height>,
}

/// Midpoint of `low` and `high`, rounded down.
pub fn pivot_height(low: Height, high: Height) -> Height {
    low + (high - low) / 2
}

/// Verify `candidate` against `trusted`, bisecting through `source` as needed,
/// and return the trusted state built from `candidate`.
pub fn verify_bisecting<S>(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    source: &S,
    now: Timestamp,
) -> Result<TrustedState, VerificationError>
where
    S: HeaderSource + ?Sized,
{
    verify_bisecting_traced(trusted, candidate, source, now).map(|verified| verified.state)
}

/// Like [`verify_bisecting`], also reporting which intermediate heights were used.
pub fn verify_bisecting_traced<S>(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    source: &S,
    now: Timestamp,
) -> Result<Verified, VerificationError>
where
    S: HeaderSource + ?Sized,
{
    let mut supporting = Vec::new();
    let state = verify_step(trusted, candidate, source, now, &mut supporting)?;
    Ok(Verified { state, supporting })
}

/// Full verification of one candidate against one trusted state.
fn verify_step<S>(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    source: &S,
    now: Timestamp,
    supporting: &mut Vec<Height>,
) -> Result<TrustedState, VerificationError>
where
    S: HeaderSource + ?Sized,
{
    // A malformed header is rejected before any bisection is attempted.
    check_preconditions(trusted, candidate, now)?;
    validate_basic(candidate)?;
    verify_self_certifying(candidate)?;

    bridge(trusted, candidate, source, now, supporting)
}

/// Establish trust in an already self-certified candidate.
fn bridge<S>(
    trusted: &TrustedState,
    candidate: &CandidateHeader,
    source: &S,
    now: Timestamp,
    supporting: &mut Vec<Height>,
) -> Result<TrustedState, VerificationError>
where
    S: HeaderSource + ?Sized,
{
    match verify_adjacent(&trusted.validator_set, candidate, trusted.trust_level) {
        Ok(()) => return Ok(apply_header(trusted, candidate)),
        Err(err) if err.is_insufficient_overlap() => {
            debug!(
                trusted_height = trusted.height,
                target_height = candidate.height(),
                error = %err,
                "trusted validator set does not cover candidate"
            );
        }
        Err(err) => return Err(err),
    }

    let exhausted = || VerificationError::BisectionExhausted {
        trusted_height: trusted.height,
        target_height: candidate.height(),
    };

    let pivot = pivot_height(trusted.height, candidate.height());
    if pivot <= trusted.height || pivot >= candidate.height() {
        return Err(exhausted());
    }

    let pivot_header = source.header_at(pivot).ok_or_else(exhausted)?;
    if pivot_header.height() != pivot {
        return Err(VerificationError::UnexpectedIntermediateHeight {
            requested: pivot,
            got: pivot_header.height(),
        });
    }

    debug!(
        trusted_height = trusted.height,
        target_height = candidate.height(),
        pivot,
        "bisecting"
    );

    let pivot_state = verify_step(trusted, &pivot_header, source, now, supporting)?;
    supporting.push(pivot);

    // The candidate already passed its own checks against `trusted`; only the
    // ordering relative to the pivot remains to be established.
    check_preconditions(&pivot_state, candidate, now)?;
    bridge(&pivot_state, candidate, source, now, supporting)
}
