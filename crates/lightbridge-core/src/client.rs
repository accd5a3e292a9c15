//! Dispatch over light-client algorithms.
//!
//! Each client kind keeps its own state and header payloads; the enums here
//! only route a header to the algorithm that owns the client.

use crate::consensus::bisection::HeaderSource;
use crate::consensus::light_client;
use crate::error::VerificationError;
use crate::types::header::{CandidateHeader, ChainId, Height, Timestamp};
use crate::types::state::{ConsensusState, Status, TrustedState};
use serde::{Deserialize, Serialize};

pub const TENDERMINT_CLIENT_TYPE: &str = "07-tendermint";
pub const LOCALHOST_CLIENT_TYPE: &str = "09-localhost";

/// State of a loopback client tracking the host chain itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalhostState {
    pub chain_id: ChainId,
    pub height: Height,
}

/// A loopback header: the host chain's own height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalhostHeader {
    pub chain_id: ChainId,
    pub height: Height,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnyClientState {
    Tendermint(TrustedState),
    Localhost(LocalhostState),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnyHeader {
    Tendermint(CandidateHeader),
    Localhost(LocalhostHeader),
}

impl AnyHeader {
    pub fn client_type(&self) -> &'static str {
        match self {
            AnyHeader::Tendermint(_) => TENDERMINT_CLIENT_TYPE,
            AnyHeader::Localhost(_) => LOCALHOST_CLIENT_TYPE,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        match self {
            AnyHeader::Tendermint(h) => h.chain_id(),
            AnyHeader::Localhost(h) => &h.chain_id,
        }
    }

    pub fn height(&self) -> Height {
        match self {
            AnyHeader::Tendermint(h) => h.height(),
            AnyHeader::Localhost(h) => h.height,
        }
    }
}

impl From<CandidateHeader> for AnyHeader {
    fn from(header: CandidateHeader) -> Self {
        AnyHeader::Tendermint(header)
    }
}

impl From<TrustedState> for AnyClientState {
    fn from(state: TrustedState) -> Self {
        AnyClientState::Tendermint(state)
    }
}

impl AnyClientState {
    pub fn client_type(&self) -> &'static str {
        match self {
            AnyClientState::Tendermint(_) => TENDERMINT_CLIENT_TYPE,
            AnyClientState::Localhost(_) => LOCALHOST_CLIENT_TYPE,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        match self {
            AnyClientState::Tendermint(s) => &s.chain_id,
            AnyClientState::Localhost(s) => &s.chain_id,
        }
    }

    pub fn latest_height(&self) -> Height {
        match self {
            AnyClientState::Tendermint(s) => s.height,
            AnyClientState::Localhost(s) => s.height,
        }
    }

    /// Loopback clients never expire and cannot be frozen.
    pub fn status(&self, now: Timestamp) -> Status {
        match self {
            AnyClientState::Tendermint(s) => s.status(now),
            AnyClientState::Localhost(_) => Status::Active,
        }
    }

    /// The consensus record for the latest height, if the client keeps one.
    pub fn consensus_state(&self) -> Option<ConsensusState> {
        match self {
            AnyClientState::Tendermint(s) => Some(s.consensus_state()),
            AnyClientState::Localhost(_) => None,
        }
    }

    /// Freeze the client after misbehaviour at `height` was proven.
    pub fn freeze(&self, height: Height) -> Result<AnyClientState, VerificationError> {
        match self {
            AnyClientState::Tendermint(s) => {
                Ok(AnyClientState::Tendermint(light_client::freeze(s, height)))
            }
            AnyClientState::Localhost(_) => Err(VerificationError::ClientTypeMismatch {
                client: LOCALHOST_CLIENT_TYPE,
                header: "misbehaviour",
            }),
        }
    }

    /// Verify `header` against this client and return the next client state.
    ///
    /// The header must be of the same kind as the client.
    pub fn check_validity_and_update_state<S>(
        &self,
        header: &AnyHeader,
        source: &S,
        now: Timestamp,
    ) -> Result<AnyClientState, VerificationError>
    where
        S: HeaderSource + ?Sized,
    {
        match (self, header) {
            (AnyClientState::Tendermint(state), AnyHeader::Tendermint(candidate)) => {
                light_client::check_validity_and_update_state(state, candidate, source, now)
                    .map(AnyClientState::Tendermint)
            }
            (AnyClientState::Localhost(state), AnyHeader::Localhost(header)) => {
                check_localhost(state, header).map(AnyClientState::Localhost)
            }
            (client, header) => Err(VerificationError::ClientTypeMismatch {
                client: client.client_type(),
                header: header.client_type(),
            }),
        }
    }
}

fn check_localhost(
    state: &LocalhostState,
    header: &LocalhostHeader,
) -> Result<LocalhostState, VerificationError> {
    if header.chain_id != state.chain_id {
        return Err(VerificationError::ChainIdMismatch {
            expected: state.chain_id.clone(),
            got: header.chain_id.clone(),
        });
    }
    if header.height <= state.height {
        return Err(VerificationError::NonMonotonicHeight {
            header_height: header.height,
            trusted_height: state.height,
        });
    }
    Ok(LocalhostState {
        chain_id: state.chain_id.clone(),
        height: header.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::bisection::NoIntermediateHeaders;
    use crate::testing::{signers, TestChain, TestSigner};

    fn localhost(height: Height) -> LocalhostState {
        LocalhostState {
            chain_id: ChainId::new("host").unwrap(),
            height,
        }
    }

    fn localhost_header(height: Height) -> AnyHeader {
        AnyHeader::Localhost(LocalhostHeader {
            chain_id: ChainId::new("host").unwrap(),
            height,
        })
    }

    #[test]
    fn test_tendermint_dispatch() {
        let chain = TestChain::default();
        let vals = signers(0, &[34, 33, 33]);
        let set: Vec<&TestSigner> = vals.iter().collect();
        let client = AnyClientState::from(chain.trusted_state(100, &set));
        let header = AnyHeader::from(chain.candidate(101, &set, &set));

        let next = client
            .check_validity_and_update_state(&header, &NoIntermediateHeaders, chain.time_at(102))
            .unwrap();
        assert_eq!(next.client_type(), TENDERMINT_CLIENT_TYPE);
        assert_eq!(next.latest_height(), 101);
        assert_eq!(next.consensus_state().unwrap().root, chain.root_at(101));
    }

    #[test]
    fn test_localhost_requires_higher_height() {
        let client = AnyClientState::Localhost(localhost(10));
        let now = Timestamp::from_unix_secs(0);

        let next = client
            .check_validity_and_update_state(&localhost_header(11), &NoIntermediateHeaders, now)
            .unwrap();
        assert_eq!(next.latest_height(), 11);
        assert_eq!(next.consensus_state(), None);

        assert!(matches!(
            client.check_validity_and_update_state(&localhost_header(10), &NoIntermediateHeaders, now),
            Err(VerificationError::NonMonotonicHeight { .. })
        ));

        let foreign = AnyHeader::Localhost(LocalhostHeader {
            chain_id: ChainId::new("elsewhere").unwrap(),
            height: 12,
        });
        assert!(matches!(
            client.check_validity_and_update_state(&foreign, &NoIntermediateHeaders, now),
            Err(VerificationError::ChainIdMismatch { .. })
        ));
    }

    #[test]
    fn test_mismatched_kinds_are_rejected() {
        let chain = TestChain::default();
        let vals = signers(0, &[10]);
        let set: Vec<&TestSigner> = vals.iter().collect();
        let tendermint = AnyClientState::from(chain.trusted_state(100, &set));
        let now = chain.time_at(101);

        assert_eq!(
            tendermint.check_validity_and_update_state(
                &localhost_header(101),
                &NoIntermediateHeaders,
                now
            ),
            Err(VerificationError::ClientTypeMismatch {
                client: TENDERMINT_CLIENT_TYPE,
                header: LOCALHOST_CLIENT_TYPE,
            })
        );

        let loopback = AnyClientState::Localhost(localhost(1));
        let header = AnyHeader::from(chain.candidate(101, &set, &set));
        assert_eq!(
            loopback.check_validity_and_update_state(&header, &NoIntermediateHeaders, now),
            Err(VerificationError::ClientTypeMismatch {
                client: LOCALHOST_CLIENT_TYPE,
                header: TENDERMINT_CLIENT_TYPE,
            })
        );
    }

    #[test]
    fn test_freeze_and_status() {
        let chain = TestChain::default();
        let vals = signers(0, &[10]);
        let set: Vec<&TestSigner> = vals.iter().collect();
        let client = AnyClientState::from(chain.trusted_state(100, &set));
        let now = chain.time_at(101);

        assert_eq!(client.status(now), Status::Active);
        let frozen = client.freeze(100).unwrap();
        assert_eq!(frozen.status(now), Status::Frozen);

        let loopback = AnyClientState::Localhost(localhost(1));
        assert_eq!(loopback.status(now), Status::Active);
        assert!(loopback.freeze(1).is_err());
    }

    #[test]
    fn test_client_state_json_is_tagged() {
        let client = AnyClientState::Localhost(localhost(7));
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["type"], "localhost");
        assert_eq!(json["value"]["height"], 7);

        let decoded: AnyClientState = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, client);
    }
}
