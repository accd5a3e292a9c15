//! Deterministic validators and signed headers for tests.
//!
//! Available under `cfg(test)` and behind the `testing` feature so that
//! downstream crates can build realistic fixtures without a key store.

use crate::types::crypto::{sha256, uint64_to_leaf, Address, BlsPublicKey, BlsSignature, Hash, COMMIT_SIGNATURE_DST};
use crate::types::header::{compute_signing_root, CandidateHeader, ChainId, Commit, CommitSig, Header, Height, Timestamp};
use crate::types::state::{TrustLevel, TrustedState};
use crate::types::validator::{Validator, ValidatorSet};
use blst::min_pk::SecretKey;
use std::time::Duration;

/// A validator whose secret key is derived from a seed.
pub struct TestSigner {
    secret: SecretKey,
    validator: Validator,
}

impl TestSigner {
    pub fn new(seed: u32, voting_power: u64) -> Self {
        let mut ikm = Vec::with_capacity(20);
        ikm.extend_from_slice(b"lightbridge-test");
        ikm.extend_from_slice(&seed.to_be_bytes());
        let ikm = sha256(&ikm);

        let secret = SecretKey::key_gen(&ikm, &[]).expect("32-byte ikm is always accepted");
        let pub_key = BlsPublicKey(secret.sk_to_pk().to_bytes());
        Self {
            secret,
            validator: Validator::new(pub_key, voting_power),
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn address(&self) -> Address {
        self.validator.address()
    }

    /// Sign a block hash for the given chain.
    pub fn sign(&self, block_hash: &Hash, chain_id: &ChainId) -> CommitSig {
        let signing_root = compute_signing_root(block_hash, chain_id);
        let signature = self.secret.sign(&signing_root, COMMIT_SIGNATURE_DST, &[]);
        CommitSig {
            validator_address: self.address(),
            signature: BlsSignature(signature.to_bytes()),
        }
    }

    /// A copy of this signer with different voting power (same key).
    pub fn with_power(&self, voting_power: u64) -> Self {
        Self {
            secret: self.secret.clone(),
            validator: Validator::new(self.validator.pub_key.clone(), voting_power),
        }
    }
}

/// Create `powers.len()` signers with seeds starting at `first_seed`.
pub fn signers(first_seed: u32, powers: &[u64]) -> Vec<TestSigner> {
    powers
        .iter()
        .enumerate()
        .map(|(i, &power)| TestSigner::new(first_seed + i as u32, power))
        .collect()
}

/// Build a validator set from signers, in order.
pub fn validator_set(members: &[&TestSigner]) -> ValidatorSet {
    ValidatorSet::new(members.iter().map(|s| s.validator().clone()).collect())
        .expect("test validator set is valid")
}

/// A synthetic remote chain producing one block every `block_interval`.
#[derive(Clone, Debug)]
pub struct TestChain {
    pub chain_id: ChainId,
    pub genesis_time: Timestamp,
    pub block_interval: Duration,
    pub trusting_period: Duration,
    pub max_clock_drift: Duration,
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new("remote-1")
    }
}

impl TestChain {
    pub fn new(chain_id: &str) -> Self {
        Self {
            chain_id: ChainId::new(chain_id).expect("valid test chain id"),
            genesis_time: Timestamp::from_unix_secs(1_700_000_000),
            block_interval: Duration::from_secs(5),
            trusting_period: Duration::from_secs(14 * 24 * 3_600),
            max_clock_drift: Duration::from_secs(10),
        }
    }

    /// Block time at `height`.
    pub fn time_at(&self, height: Height) -> Timestamp {
        let elapsed = self.block_interval.as_nanos().saturating_mul(u128::from(height));
        let nanos = u128::from(self.genesis_time.unix_nanos()).saturating_add(elapsed);
        Timestamp::from_unix_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Application root at `height`.
    pub fn root_at(&self, height: Height) -> Hash {
        sha256(&uint64_to_leaf(height))
    }

    pub fn header(&self, height: Height, validators: &ValidatorSet) -> Header {
        Header {
            chain_id: self.chain_id.clone(),
            height,
            time: self.time_at(height),
            validators_hash: validators.hash(),
            app_hash: self.root_at(height),
        }
    }

    /// A header at `height` produced by `set`, with a commit signed by `signed_by`.
    pub fn candidate(
        &self,
        height: Height,
        set: &[&TestSigner],
        signed_by: &[&TestSigner],
    ) -> CandidateHeader {
        let validator_set = validator_set(set);
        let header = self.header(height, &validator_set);
        sign_candidate(header, validator_set, signed_by)
    }

    /// A trusted state at `height` for the validator set `set`.
    pub fn trusted_state(&self, height: Height, set: &[&TestSigner]) -> TrustedState {
        let validator_set = validator_set(set);
        TrustedState {
            chain_id: self.chain_id.clone(),
            height,
            timestamp: self.time_at(height),
            root: self.root_at(height),
            validator_set,
            trusting_period: self.trusting_period,
            max_clock_drift: self.max_clock_drift,
            trust_level: TrustLevel::default(),
            frozen_height: None,
        }
    }
}

/// Commit to `header` with signatures from `signed_by`.
pub fn sign_candidate(
    header: Header,
    validator_set: ValidatorSet,
    signed_by: &[&TestSigner],
) -> CandidateHeader {
    let block_hash = header.hash();
    let signatures = signed_by
        .iter()
        .map(|s| s.sign(&block_hash, &header.chain_id))
        .collect();
    CandidateHeader {
        commit: Commit {
            height: header.height,
            block_hash,
            signatures,
        },
        header,
        validator_set,
    }
}
