//! Property-based tests for header verification.
//!
//! Signing is comparatively slow, so the cases that build signed headers run
//! with a small case count.

use proptest::prelude::*;
use std::time::Duration;

use crate::consensus::{check_validity_and_update_state, NoIntermediateHeaders};
use crate::error::VerificationError;
use crate::testing::{sign_candidate, signers, validator_set, TestChain, TestSigner};
use crate::types::header::{CandidateHeader, Commit, Height, Timestamp};
use crate::types::state::TrustLevel;

const TRUSTED_HEIGHT: Height = 1_000;

/// Validator powers of the reference set.
const POWERS: [u64; 3] = [34, 33, 33];

fn unsigned_candidate(chain: &TestChain, height: Height, time: Timestamp) -> CandidateHeader {
    let vals = signers(0, &POWERS);
    let set = validator_set(&vals.iter().collect::<Vec<_>>());
    let mut header = chain.header(height, &set);
    header.time = time;
    CandidateHeader {
        commit: Commit {
            height,
            block_hash: header.hash(),
            signatures: Vec::new(),
        },
        header,
        validator_set: set,
    }
}

// ============================================================================
// Trust level arithmetic
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Construction accepts exactly the fractions in [1/3, 1].
    #[test]
    fn prop_trust_level_range(numerator in 0u64..100, denominator in 0u64..100) {
        let valid = denominator > 0 && numerator <= denominator && numerator * 3 >= denominator;
        prop_assert_eq!(TrustLevel::new(numerator, denominator).is_ok(), valid);
    }

    /// Cross-multiplication never overflows and agrees with u128 division bounds.
    #[test]
    fn prop_trust_level_is_met_is_monotone(signed in any::<u64>(), extra in any::<u64>()) {
        let total = signed.saturating_add(extra);
        let level = TrustLevel::TWO_THIRDS;
        if level.is_met(signed, total) {
            prop_assert!(level.is_met(signed.saturating_add(1).min(total), total));
        }
        prop_assert!(level.is_met(total, total));
    }
}

// ============================================================================
// Verification gates
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A header at or below the trusted height is always rejected.
    #[test]
    fn prop_height_must_increase(height in 0..=TRUSTED_HEIGHT, delay_secs in 1u64..3_600) {
        let chain = TestChain::default();
        let vals = signers(0, &POWERS);
        let refs: Vec<&TestSigner> = vals.iter().collect();
        let trusted = chain.trusted_state(TRUSTED_HEIGHT, &refs);

        let time = trusted.timestamp.saturating_add(Duration::from_secs(delay_secs));
        let candidate = unsigned_candidate(&chain, height, time);
        let now = time.saturating_add(Duration::from_secs(1));

        let result = check_validity_and_update_state(&trusted, &candidate, &NoIntermediateHeaders, now);
        prop_assert_eq!(
            result,
            Err(VerificationError::NonMonotonicHeight {
                header_height: height,
                trusted_height: TRUSTED_HEIGHT,
            })
        );
    }

    /// Once the trusting period has elapsed, nothing is accepted.
    #[test]
    fn prop_trusting_period_gate(
        late_secs in 0u64..10_000_000,
        height in any::<u64>(),
        time_offset_secs in 0u64..100_000_000,
    ) {
        let chain = TestChain::default();
        let vals = signers(0, &POWERS);
        let refs: Vec<&TestSigner> = vals.iter().collect();
        let trusted = chain.trusted_state(TRUSTED_HEIGHT, &refs);

        let now = trusted
            .timestamp
            .saturating_add(trusted.trusting_period)
            .saturating_add(Duration::from_secs(late_secs));
        let time = chain.genesis_time.saturating_add(Duration::from_secs(time_offset_secs));
        let candidate = unsigned_candidate(&chain, height, time);

        let result = check_validity_and_update_state(&trusted, &candidate, &NoIntermediateHeaders, now);
        let expired = matches!(result, Err(VerificationError::TrustingPeriodExpired { .. }));
        prop_assert!(expired);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Same inputs give the same outcome, and a same-set update is accepted
    /// exactly when its signers hold 2/3 of the power.
    #[test]
    fn prop_verification_is_deterministic(mask in 0u8..8, step in 1u64..50) {
        let chain = TestChain::default();
        let vals = signers(0, &POWERS);
        let refs: Vec<&TestSigner> = vals.iter().collect();
        let trusted = chain.trusted_state(TRUSTED_HEIGHT, &refs);

        let signed_by: Vec<&TestSigner> = vals
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, s)| s)
            .collect();
        let signed_power: u64 = signed_by.iter().map(|s| s.validator().voting_power).sum();

        let height = TRUSTED_HEIGHT + step;
        let header = chain.header(height, &validator_set(&refs));
        let candidate = sign_candidate(header, validator_set(&refs), &signed_by);
        let now = chain.time_at(height + 1);

        let first = check_validity_and_update_state(&trusted, &candidate, &NoIntermediateHeaders, now);
        let second = check_validity_and_update_state(&trusted, &candidate, &NoIntermediateHeaders, now);
        prop_assert_eq!(&first, &second);

        let expected_ok = TrustLevel::TWO_THIRDS.is_met(signed_power, 100);
        prop_assert_eq!(first.is_ok(), expected_ok);
        if let Ok(next) = first {
            prop_assert_eq!(next.height, height);
            prop_assert!(next.timestamp > trusted.timestamp);
        }
    }
}
