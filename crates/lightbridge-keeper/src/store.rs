//! Client state storage.

use crate::config::KeeperConfig;
use crate::error::{KeeperError, Result};
use lightbridge_core::{AnyClientState, ChainId, ConsensusState, Height};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// A value together with the revision it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub revision: u64,
}

/// Store for client states, one per tracked chain.
///
/// Every write bumps the chain's revision. Writers that verified against an
/// older revision must lose the swap and start over.
pub trait ClientStore {
    /// Get the current client state for a chain.
    fn load(&self, chain_id: &ChainId) -> Result<Versioned<AnyClientState>>;

    /// Store the first client state for a chain. Returns the new revision.
    fn insert(&self, chain_id: &ChainId, state: AnyClientState) -> Result<u64>;

    /// Replace the client state if the chain is still at `expected_revision`.
    /// Returns the new revision.
    fn compare_and_swap(
        &self,
        chain_id: &ChainId,
        expected_revision: u64,
        state: AnyClientState,
        consensus_state: Option<ConsensusState>,
    ) -> Result<u64>;

    /// Get the consensus state recorded at `height`.
    fn consensus_state(&self, chain_id: &ChainId, height: Height) -> Result<Option<ConsensusState>>;
}

struct ClientEntry {
    state: AnyClientState,
    revision: u64,
    consensus: BTreeMap<Height, ConsensusState>,
}

impl ClientEntry {
    fn record(&mut self, consensus_state: ConsensusState, limit: usize) {
        self.consensus.insert(consensus_state.height, consensus_state);
        while self.consensus.len() > limit {
            self.consensus.pop_first();
        }
    }
}

/// In-memory [`ClientStore`].
pub struct InMemoryStore {
    clients: RwLock<HashMap<ChainId, ClientEntry>>,
    history_limit: usize,
}

impl InMemoryStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            history_limit: history_limit.max(1),
        }
    }

    /// A store keeping `consensus_history_limit` consensus states per chain.
    pub fn from_config(config: &KeeperConfig) -> Self {
        Self::new(config.consensus_history_limit)
    }

    /// Number of tracked chains.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Heights with a recorded consensus state, ascending.
    pub fn consensus_heights(&self, chain_id: &ChainId) -> Vec<Height> {
        self.clients
            .read()
            .get(chain_id)
            .map(|entry| entry.consensus.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::from_config(&KeeperConfig::default())
    }
}

impl ClientStore for InMemoryStore {
    fn load(&self, chain_id: &ChainId) -> Result<Versioned<AnyClientState>> {
        let clients = self.clients.read();
        let entry = clients
            .get(chain_id)
            .ok_or_else(|| KeeperError::ClientNotFound {
                chain_id: chain_id.clone(),
            })?;
        Ok(Versioned {
            value: entry.state.clone(),
            revision: entry.revision,
        })
    }

    fn insert(&self, chain_id: &ChainId, state: AnyClientState) -> Result<u64> {
        let mut clients = self.clients.write();
        if clients.contains_key(chain_id) {
            return Err(KeeperError::ClientAlreadyExists {
                chain_id: chain_id.clone(),
            });
        }

        let mut entry = ClientEntry {
            consensus: BTreeMap::new(),
            revision: 1,
            state,
        };
        if let Some(consensus_state) = entry.state.consensus_state() {
            entry.record(consensus_state, self.history_limit);
        }
        clients.insert(chain_id.clone(), entry);
        Ok(1)
    }

    fn compare_and_swap(
        &self,
        chain_id: &ChainId,
        expected_revision: u64,
        state: AnyClientState,
        consensus_state: Option<ConsensusState>,
    ) -> Result<u64> {
        let mut clients = self.clients.write();
        let entry = clients
            .get_mut(chain_id)
            .ok_or_else(|| KeeperError::ClientNotFound {
                chain_id: chain_id.clone(),
            })?;

        if entry.revision != expected_revision {
            return Err(KeeperError::RevisionConflict {
                chain_id: chain_id.clone(),
                expected: expected_revision,
                actual: entry.revision,
            });
        }

        entry.state = state;
        entry.revision += 1;
        if let Some(consensus_state) = consensus_state {
            entry.record(consensus_state, self.history_limit);
        }
        Ok(entry.revision)
    }

    fn consensus_state(&self, chain_id: &ChainId, height: Height) -> Result<Option<ConsensusState>> {
        let clients = self.clients.read();
        let entry = clients
            .get(chain_id)
            .ok_or_else(|| KeeperError::ClientNotFound {
                chain_id: chain_id.clone(),
            })?;
        Ok(entry.consensus.get(&height).cloned())
    }
}
