//! Relayer-submitted headers awaiting use as bisection intermediates.
//!
//! Nothing in this cache is trusted. Entries are only candidates: the core
//! verifies every header it pulls from here like any other.

use lightbridge_core::{CandidateHeader, ChainId, HeaderSource, Height};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Headers per chain, keyed by height, bounded per chain.
pub struct HeaderCache {
    chains: RwLock<HashMap<ChainId, BTreeMap<Height, CandidateHeader>>>,
    capacity: usize,
}

impl HeaderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Cache a header. A later submission at the same height replaces the
    /// earlier one. When the chain is over capacity the lowest heights are
    /// evicted.
    pub fn insert(&self, header: CandidateHeader) {
        let chain_id = header.chain_id().clone();
        let height = header.height();

        let mut chains = self.chains.write();
        let headers = chains.entry(chain_id.clone()).or_default();
        headers.insert(height, header);

        let mut evicted = 0usize;
        while headers.len() > self.capacity {
            headers.pop_first();
            evicted += 1;
        }
        debug!(chain_id = %chain_id, height, evicted, cached = headers.len(), "header cached");
    }

    pub fn get(&self, chain_id: &ChainId, height: Height) -> Option<CandidateHeader> {
        self.chains.read().get(chain_id)?.get(&height).cloned()
    }

    /// Drop every header below `height`. Returns how many were removed.
    pub fn prune_below(&self, chain_id: &ChainId, height: Height) -> usize {
        let mut chains = self.chains.write();
        let Some(headers) = chains.get_mut(chain_id) else {
            return 0;
        };

        let kept = headers.split_off(&height);
        let removed = headers.len();
        *headers = kept;
        if headers.is_empty() {
            chains.remove(chain_id);
        }

        if removed > 0 {
            debug!(chain_id = %chain_id, below = height, removed, "header cache pruned");
        }
        removed
    }

    /// Number of headers cached for `chain_id`.
    pub fn len(&self, chain_id: &ChainId) -> usize {
        self.chains.read().get(chain_id).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }

    /// The intermediate-header source for one chain.
    pub fn for_chain<'a>(&'a self, chain_id: &'a ChainId) -> ChainHeaders<'a> {
        ChainHeaders {
            cache: self,
            chain_id,
        }
    }
}

/// View of a [`HeaderCache`] restricted to one chain.
pub struct ChainHeaders<'a> {
    cache: &'a HeaderCache,
    chain_id: &'a ChainId,
}

impl HeaderSource for ChainHeaders<'_> {
    fn header_at(&self, height: Height) -> Option<CandidateHeader> {
        self.cache.get(self.chain_id, height)
    }
}
