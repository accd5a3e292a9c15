//! Validator sets of the remote chain.
//!
//! A set is ordered, every member has non-zero voting power, and addresses
//! are unique. These properties are enforced at construction (including
//! deserialization), so verification code can rely on them.

use crate::error::VerificationError;
use crate::types::crypto::{merkle_root, sha256, Address, BlsPublicKey, Hash, BLS_PUBKEY_LEN};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Upper bound on the total voting power of a set.
pub const MAX_TOTAL_VOTING_POWER: u64 = (i64::MAX as u64) / 8;

/// A single validator: public key and voting power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub pub_key: BlsPublicKey,
    pub voting_power: u64,
}

impl Validator {
    pub fn new(pub_key: BlsPublicKey, voting_power: u64) -> Self {
        Self {
            pub_key,
            voting_power,
        }
    }

    pub fn address(&self) -> Address {
        self.pub_key.address()
    }

    /// Leaf committed to by the set hash: sha256(pubkey || power_be).
    fn leaf(&self) -> Hash {
        let mut data = [0u8; BLS_PUBKEY_LEN + 8];
        data[..BLS_PUBKEY_LEN].copy_from_slice(&self.pub_key.0);
        data[BLS_PUBKEY_LEN..].copy_from_slice(&self.voting_power.to_be_bytes());
        sha256(&data)
    }
}

/// An ordered set of validators with a precomputed address index.
#[derive(Clone, Debug, Serialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    #[serde(skip)]
    total_voting_power: u64,
    /// Address -> position in `validators` (rebuilt on deserialize).
    #[serde(skip)]
    index: HashMap<Address, usize>,
}

impl<'de> Deserialize<'de> for ValidatorSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ValidatorSetData {
            validators: Vec<Validator>,
        }

        let data = ValidatorSetData::deserialize(deserializer)?;
        ValidatorSet::new(data.validators).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for ValidatorSet {
    fn eq(&self, other: &Self) -> bool {
        self.validators == other.validators
    }
}

impl Eq for ValidatorSet {}

impl ValidatorSet {
    /// Build a validator set, rejecting empty sets, zero-power members,
    /// duplicate addresses, and total power above [`MAX_TOTAL_VOTING_POWER`].
    pub fn new(validators: Vec<Validator>) -> Result<Self, VerificationError> {
        if validators.is_empty() {
            return Err(VerificationError::InvalidValidatorSet {
                reason: "validator set is empty".into(),
            });
        }

        let mut index = HashMap::with_capacity(validators.len());
        let mut total: u64 = 0;

        for (i, validator) in validators.iter().enumerate() {
            let address = validator.address();
            if validator.voting_power == 0 {
                return Err(VerificationError::InvalidValidatorSet {
                    reason: format!("validator {} has zero voting power", address),
                });
            }
            if index.insert(address, i).is_some() {
                return Err(VerificationError::InvalidValidatorSet {
                    reason: format!("duplicate validator {}", address),
                });
            }
            total = total
                .checked_add(validator.voting_power)
                .filter(|t| *t <= MAX_TOTAL_VOTING_POWER)
                .ok_or_else(|| VerificationError::InvalidValidatorSet {
                    reason: format!(
                        "total voting power exceeds maximum {}",
                        MAX_TOTAL_VOTING_POWER
                    ),
                })?;
        }

        Ok(Self {
            validators,
            total_voting_power: total,
            index,
        })
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Sum of all members' voting power.
    pub fn total_voting_power(&self) -> u64 {
        self.total_voting_power
    }

    /// Look up a member by address.
    pub fn get_by_address(&self, address: &Address) -> Option<&Validator> {
        self.index.get(address).map(|&i| &self.validators[i])
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    /// Deterministic hash of the set: Merkle root of the member leaves in order.
    pub fn hash(&self) -> Hash {
        let leaves: Vec<Hash> = self.validators.iter().map(Validator::leaf).collect();
        merkle_root(&leaves)
    }
}
