use crate::error::VerificationError;
use crate::types::crypto::{BlsSignature, Hash, COMMIT_SIGNATURE_DST};
use crate::types::header::{compute_signing_root, CandidateHeader, Commit, Header};
use crate::types::state::TrustLevel;
use crate::types::validator::{Validator, ValidatorSet};
use std::collections::HashSet;
use tracing::debug;

/// How signatures outside the reference validator set are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribution {
    /// Every signature must come from a member of the set.
    Strict,
    /// Signatures from non-members are skipped.
    Lenient,
}

/// Verify that `commit` carries at least `trust_level` of `validator_set`'s
/// voting power, signed over `header`.
///
/// Signatures are checked against the hash of `header` itself, not against
/// the block hash the commit claims. Each validator's power counts at most
/// once; repeated signatures from the same address are ignored. Power is
/// compared with integer cross-multiplication only.
pub fn verify_commit_against_set(
    validator_set: &ValidatorSet,
    commit: &Commit,
    header: &Header,
    trust_level: TrustLevel,
    attribution: Attribution,
) -> Result<(), VerificationError> {
    let signing_root = compute_signing_root(&header.hash(), &header.chain_id);

    let mut seen = HashSet::with_capacity(commit.signatures.len());
    let mut signed_power: u64 = 0;

    for commit_sig in &commit.signatures {
        let address = commit_sig.validator_address;
        let Some(validator) = validator_set.get_by_address(&address) else {
            if attribution == Attribution::Strict {
                return Err(VerificationError::UnknownSigner { address });
            }
            continue;
        };

        if !seen.insert(address) {
            continue;
        }

        verify_validator_signature(validator, &signing_root, &commit_sig.signature)?;
        // Cannot overflow: the set's total is bounded at construction.
        signed_power += validator.voting_power;
    }

    let total_power = validator_set.total_voting_power();
    if !trust_level.is_met(signed_power, total_power) {
        return Err(VerificationError::InsufficientVotingPower {
            signed: signed_power,
            total: total_power,
            numerator: trust_level.numerator(),
            denominator: trust_level.denominator(),
        });
    }

    debug!(
        height = header.height,
        signed_power,
        total_power,
        %trust_level,
        "commit carries sufficient voting power"
    );
    Ok(())
}

/// The candidate's commit must be signed by 2/3 of its own validator set.
pub fn verify_self_certifying(candidate: &CandidateHeader) -> Result<(), VerificationError> {
    verify_commit_against_set(
        &candidate.validator_set,
        &candidate.commit,
        &candidate.header,
        TrustLevel::TWO_THIRDS,
        Attribution::Strict,
    )
}

/// The candidate's commit must be signed by `trust_level` of the trusted set.
pub fn verify_adjacent(
    trusted_set: &ValidatorSet,
    candidate: &CandidateHeader,
    trust_level: TrustLevel,
) -> Result<(), VerificationError> {
    verify_commit_against_set(
        trusted_set,
        &candidate.commit,
        &candidate.header,
        trust_level,
        Attribution::Lenient,
    )
}

/// Verify one validator's BLS12-381 signature over a signing root.
fn verify_validator_signature(
    validator: &Validator,
    message: &Hash,
    signature: &BlsSignature,
) -> Result<(), VerificationError> {
    use blst::min_pk::{PublicKey, Signature};
    use blst::BLST_ERROR;

    let address = validator.address();

    let pk = PublicKey::from_bytes(&validator.pub_key.0).map_err(|e| {
        VerificationError::InvalidPublicKey {
            address,
            reason: format!("{:?}", e),
        }
    })?;

    let sig = Signature::from_bytes(&signature.0)
        .map_err(|_| VerificationError::InvalidSignature { address })?;

    let result = sig.verify(true, message, COMMIT_SIGNATURE_DST, &[], &pk, true);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(VerificationError::InvalidSignature { address });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signers, TestChain, TestSigner};
    use crate::types::crypto::{BlsPublicKey, BLS_PUBKEY_LEN};

    /// Validator set A from the reference scenario: 34/33/33.
    fn set_a() -> Vec<TestSigner> {
        signers(0, &[34, 33, 33])
    }

    #[test]
    fn test_two_of_three_signers_pass_both_modes() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[&a[0], &a[1]]);

        verify_self_certifying(&candidate).unwrap();
        verify_adjacent(&candidate.validator_set, &candidate, TrustLevel::ONE_THIRD).unwrap();
    }

    #[test]
    fn test_single_33_power_signer_is_below_one_third() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[&a[1]]);

        let result = verify_adjacent(&candidate.validator_set, &candidate, TrustLevel::ONE_THIRD);
        assert_eq!(
            result,
            Err(VerificationError::InsufficientVotingPower {
                signed: 33,
                total: 100,
                numerator: 1,
                denominator: 3,
            })
        );
    }

    #[test]
    fn test_self_certifying_requires_two_thirds() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[&a[1], &a[2]]);

        let result = verify_self_certifying(&candidate);
        assert!(matches!(
            result,
            Err(VerificationError::InsufficientVotingPower { signed: 66, total: 100, .. })
        ));
    }

    #[test]
    fn test_duplicate_signatures_count_once() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[&a[1], &a[1], &a[1]]);

        let result = verify_adjacent(&candidate.validator_set, &candidate, TrustLevel::ONE_THIRD);
        assert!(matches!(
            result,
            Err(VerificationError::InsufficientVotingPower { signed: 33, .. })
        ));
    }

    #[test]
    fn test_unknown_signer_strict_vs_lenient() {
        let chain = TestChain::default();
        let a = set_a();
        let outsider = TestSigner::new(99, 50);
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[&a[0], &a[1], &outsider]);

        assert_eq!(
            verify_self_certifying(&candidate),
            Err(VerificationError::UnknownSigner {
                address: outsider.address()
            })
        );
        verify_adjacent(&candidate.validator_set, &candidate, TrustLevel::ONE_THIRD).unwrap();
    }

    #[test]
    fn test_signature_over_other_header_is_rejected() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let mut candidate = chain.candidate(101, &set, &[&a[0], &a[1]]);
        candidate.header.app_hash = [0xff; 32];

        assert_eq!(
            verify_self_certifying(&candidate),
            Err(VerificationError::InvalidSignature {
                address: a[0].address()
            })
        );
    }

    #[test]
    fn test_signature_from_other_chain_is_rejected() {
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let ours = TestChain::new("remote-1");
        let theirs = TestChain::new("remote-2");

        let mut candidate = ours.candidate(101, &set, &[&a[0], &a[1]]);
        let foreign = theirs.candidate(101, &set, &[&a[0], &a[1]]);
        candidate.commit.signatures = foreign.commit.signatures;

        assert!(matches!(
            verify_self_certifying(&candidate),
            Err(VerificationError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_invalid_public_key_is_reported() {
        let chain = TestChain::default();
        let bogus = Validator::new(BlsPublicKey([0x01; BLS_PUBKEY_LEN]), 10);
        let address = bogus.address();
        let set = ValidatorSet::new(vec![bogus]).unwrap();

        let header = chain.header(101, &set);
        let signer = TestSigner::new(1, 10);
        let mut commit_sig = signer.sign(&header.hash(), &header.chain_id);
        commit_sig.validator_address = address;
        let commit = Commit {
            height: 101,
            block_hash: header.hash(),
            signatures: vec![commit_sig],
        };

        let result = verify_commit_against_set(
            &set,
            &commit,
            &header,
            TrustLevel::ONE_THIRD,
            Attribution::Strict,
        );
        assert!(matches!(
            result,
            Err(VerificationError::InvalidPublicKey { .. })
        ));
    }

    #[test]
    fn test_adjacent_counts_trusted_set_power() {
        // Same keys, rebalanced: k0 holds 30 in the trusted set but 70 in the candidate's.
        let chain = TestChain::default();
        let k0 = TestSigner::new(0, 30);
        let k1 = TestSigner::new(1, 70);
        let trusted_set = crate::testing::validator_set(&[&k0, &k1]);

        let k0_now = k0.with_power(70);
        let k1_now = k1.with_power(30);
        let candidate = chain.candidate(101, &[&k0_now, &k1_now], &[&k0_now]);

        verify_self_certifying(&candidate).unwrap();
        assert_eq!(
            verify_adjacent(&trusted_set, &candidate, TrustLevel::ONE_THIRD),
            Err(VerificationError::InsufficientVotingPower {
                signed: 30,
                total: 100,
                numerator: 1,
                denominator: 3,
            })
        );
    }

    #[test]
    fn test_empty_commit_has_no_power() {
        let chain = TestChain::default();
        let a = set_a();
        let set: Vec<&TestSigner> = a.iter().collect();
        let candidate = chain.candidate(101, &set, &[]);

        assert!(matches!(
            verify_self_certifying(&candidate),
            Err(VerificationError::InsufficientVotingPower { signed: 0, .. })
        ));
    }
}
