//! The update protocol around the pure verification core.
//!
//! For each update: read the current client state and its revision, verify
//! the header, then compare-and-swap the result into the store. If another
//! writer got there first, the whole verification is repeated against the
//! newer state, up to `max_update_attempts` times.

use crate::config::KeeperConfig;
use crate::error::{KeeperError, Result};
use crate::header_cache::HeaderCache;
use crate::store::{ClientStore, InMemoryStore};
use lightbridge_core::{
    initialize_from_checkpoint, AnyClientState, AnyHeader, CandidateHeader, ChainId,
    ConsensusState, Height, LocalhostState, Status, Timestamp, TrustOptions, TrustedCheckpoint,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counters for the lifetime of a keeper.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStats {
    /// Updates verified and committed.
    pub updates_accepted: u64,
    /// Updates that failed verification.
    pub updates_rejected: u64,
    /// Lost compare-and-swap races, each followed by a re-verification.
    pub conflicts: u64,
    /// Headers submitted to the intermediate-header cache.
    pub headers_submitted: u64,
}

impl UpdateStats {
    /// Fraction of finished updates that were accepted (0.0 - 1.0).
    pub fn acceptance_rate(&self) -> f64 {
        let finished = self.updates_accepted + self.updates_rejected;
        if finished == 0 {
            return 0.0;
        }
        self.updates_accepted as f64 / finished as f64
    }
}

pub struct ClientKeeper<S> {
    store: S,
    headers: HeaderCache,
    config: KeeperConfig,
    stats: Mutex<UpdateStats>,
}

impl ClientKeeper<InMemoryStore> {
    /// A keeper over an in-memory store sized from `config`.
    pub fn in_memory(config: KeeperConfig) -> Result<Self> {
        let store = InMemoryStore::from_config(&config);
        Self::new(store, config)
    }
}

impl<S: ClientStore> ClientKeeper<S> {
    pub fn new(store: S, config: KeeperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            headers: HeaderCache::new(config.header_cache_capacity),
            store,
            config,
            stats: Mutex::new(UpdateStats::default()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn header_cache(&self) -> &HeaderCache {
        &self.headers
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Create a client from an operator-supplied checkpoint.
    pub fn create_client(
        &self,
        checkpoint: &TrustedCheckpoint,
        options: &TrustOptions,
    ) -> Result<ChainId> {
        let state = initialize_from_checkpoint(checkpoint, options)?;
        let chain_id = state.chain_id.clone();
        let height = state.height;

        self.store.insert(&chain_id, AnyClientState::Tendermint(state))?;
        info!(chain_id = %chain_id, height, "client created from checkpoint");
        Ok(chain_id)
    }

    /// Create a loopback client for the host chain.
    pub fn create_localhost_client(&self, chain_id: ChainId, height: Height) -> Result<()> {
        let state = AnyClientState::Localhost(LocalhostState {
            chain_id: chain_id.clone(),
            height,
        });
        self.store.insert(&chain_id, state)?;
        info!(chain_id = %chain_id, height, "localhost client created");
        Ok(())
    }

    /// Offer a header for use as a bisection intermediate.
    ///
    /// Only chains with a client accept headers.
    pub fn submit_header(&self, header: CandidateHeader) -> Result<()> {
        self.store.load(header.chain_id())?;
        debug!(chain_id = %header.chain_id(), height = header.height(), "header submitted");
        self.headers.insert(header);
        self.stats.lock().headers_submitted += 1;
        Ok(())
    }

    /// Verify `header` against the client for `chain_id` and commit the result.
    ///
    /// Returns the consensus state recorded for the new height, or `None` for
    /// clients that keep no consensus states. A rejected header leaves the
    /// store untouched.
    pub fn update_client(
        &self,
        chain_id: &ChainId,
        header: &AnyHeader,
        now: Timestamp,
    ) -> Result<Option<ConsensusState>> {
        let max_attempts = self.config.max_update_attempts;

        for attempt in 1..=max_attempts {
            let current = self.store.load(chain_id)?;
            let source = self.headers.for_chain(chain_id);

            let next = match current
                .value
                .check_validity_and_update_state(header, &source, now)
            {
                Ok(next) => next,
                Err(err) => {
                    self.stats.lock().updates_rejected += 1;
                    warn!(
                        chain_id = %chain_id,
                        trusted_height = current.value.latest_height(),
                        header_height = header.height(),
                        error = %err,
                        "header rejected"
                    );
                    return Err(err.into());
                }
            };

            let height = next.latest_height();
            let consensus_state = next.consensus_state();
            match self.store.compare_and_swap(
                chain_id,
                current.revision,
                next,
                consensus_state.clone(),
            ) {
                Ok(revision) => {
                    self.stats.lock().updates_accepted += 1;
                    self.headers.prune_below(chain_id, height);
                    info!(chain_id = %chain_id, height, revision, attempt, "client updated");
                    return Ok(consensus_state);
                }
                Err(KeeperError::RevisionConflict { expected, actual, .. }) => {
                    self.stats.lock().conflicts += 1;
                    warn!(
                        chain_id = %chain_id,
                        expected,
                        actual,
                        attempt,
                        "client changed during verification, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(KeeperError::UpdateConflict {
            chain_id: chain_id.clone(),
            attempts: max_attempts,
        })
    }

    /// Freeze the client for `chain_id` after misbehaviour at `height`.
    pub fn freeze_client(&self, chain_id: &ChainId, height: Height) -> Result<()> {
        let max_attempts = self.config.max_update_attempts;

        for attempt in 1..=max_attempts {
            let current = self.store.load(chain_id)?;
            let frozen = current.value.freeze(height)?;

            match self
                .store
                .compare_and_swap(chain_id, current.revision, frozen, None)
            {
                Ok(_) => {
                    warn!(chain_id = %chain_id, height, "client frozen");
                    return Ok(());
                }
                Err(KeeperError::RevisionConflict { .. }) => {
                    self.stats.lock().conflicts += 1;
                    debug!(chain_id = %chain_id, attempt, "freeze raced an update, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(KeeperError::UpdateConflict {
            chain_id: chain_id.clone(),
            attempts: max_attempts,
        })
    }

    pub fn client_state(&self, chain_id: &ChainId) -> Result<AnyClientState> {
        Ok(self.store.load(chain_id)?.value)
    }

    pub fn client_status(&self, chain_id: &ChainId, now: Timestamp) -> Result<Status> {
        Ok(self.store.load(chain_id)?.value.status(now))
    }

    pub fn consensus_state(
        &self,
        chain_id: &ChainId,
        height: Height,
    ) -> Result<Option<ConsensusState>> {
        self.store.consensus_state(chain_id, height)
    }

    pub fn stats(&self) -> UpdateStats {
        self.stats.lock().clone()
    }
}
