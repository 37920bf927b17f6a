//! # Node Overlay Cache
//!
//! Durable registry of known storage nodes plus the selection policy the
//! satellite uses to pick placement candidates.
//!
//! ## Overview
//!
//! The cache owns every `NodeRecord`: created on first `put`, replaced on
//! subsequent `put`, removed on `delete`. Lookup and mutation operations
//! reject the reserved all-zero id with `EmptyKey`; storage-backend errors
//! propagate unchanged.
//!
//! ## Selection
//!
//! `select_nodes(count, criteria)` asks the store for the eligible subset
//! and samples it by shuffling with the cache's own RNG, so repeated calls
//! spread load across the whole eligible population instead of pinning the
//! first N matches. The RNG is seedable for reproducible tests; there is no
//! hidden global RNG state.

mod store;


pub use store::{MemoryOverlayStore, OverlayStore, StoreError};

use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

use orbit_common::{NodeCriteria, NodeId, NodeRecord};

/// Page size used when `paginate` is called with `limit == 0`.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Errors local to the overlay cache; backend faults are wrapped unchanged
/// in `Store`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// The reserved all-zero id was used as an operation target.
    #[error("empty node id")]
    EmptyKey,

    /// No record exists under the requested id.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// `get_all` requires at least one id.
    #[error("empty node id list")]
    EmptyIdList,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The node overlay cache.
pub struct Cache {
    store: Arc<dyn OverlayStore>,
    rng: Mutex<ChaCha8Rng>,
}

impl Cache {
    /// A cache over `store` with an entropy-seeded selection RNG.
    #[must_use]
    pub fn new(store: Arc<dyn OverlayStore>) -> Self {
        Cache {
            store,
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// A cache with a fixed RNG seed, for reproducible selection in tests.
    #[must_use]
    pub fn with_seed(store: Arc<dyn OverlayStore>, seed: u64) -> Self {
        Cache {
            store,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Upsert a node record keyed by `id`.
    pub async fn put(&self, id: NodeId, record: NodeRecord) -> Result<(), OverlayError> {
        if id.is_zero() {
            return Err(OverlayError::EmptyKey);
        }
        self.store.put(id, record).await?;
        Ok(())
    }

    /// Fetch the record stored under `id`.
    pub async fn get(&self, id: NodeId) -> Result<NodeRecord, OverlayError> {
        if id.is_zero() {
            return Err(OverlayError::EmptyKey);
        }
        match self.store.get(&id).await? {
            Some(record) => Ok(record),
            None => Err(OverlayError::NotFound(id)),
        }
    }

    /// Fetch many records positionally: the result has the same length and
    /// order as `ids`, including duplicates; zero or unknown ids yield
    /// `None` at their position rather than failing the call.
    pub async fn get_all(
        &self,
        ids: &[NodeId],
    ) -> Result<Vec<Option<NodeRecord>>, OverlayError> {
        if ids.is_empty() {
            return Err(OverlayError::EmptyIdList);
        }
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if id.is_zero() {
                records.push(None);
                continue;
            }
            records.push(self.store.get(id).await?);
        }
        Ok(records)
    }

    /// Remove the record under `id`. Idempotent: deleting an absent id
    /// succeeds silently.
    pub async fn delete(&self, id: NodeId) -> Result<(), OverlayError> {
        if id.is_zero() {
            return Err(OverlayError::EmptyKey);
        }
        self.store.delete(&id).await?;
        Ok(())
    }

    /// Up to `limit` records in id order, strictly greater than
    /// `start_after`; the zero id means "from the beginning".
    pub async fn list(
        &self,
        start_after: NodeId,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, OverlayError> {
        let after = if start_after.is_zero() {
            None
        } else {
            Some(start_after)
        };
        Ok(self.store.list(after, limit).await?)
    }

    /// Offset pagination; `limit == 0` means [`DEFAULT_PAGE_LIMIT`], never
    /// an empty page by construction.
    pub async fn paginate(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<NodeRecord>, bool), OverlayError> {
        let limit = if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit };
        Ok(self.store.paginate(offset, limit).await?)
    }

    /// Up to `count` distinct nodes satisfying every field of `criteria`.
    ///
    /// Sampling is a shuffle of the eligible subset, so over many calls
    /// each eligible node is picked with roughly uniform probability. When
    /// fewer than `count` nodes qualify, all of them are returned without
    /// error.
    pub async fn select_nodes(
        &self,
        count: usize,
        criteria: &NodeCriteria,
    ) -> Result<Vec<NodeRecord>, OverlayError> {
        let mut candidates = self.store.select_candidates(criteria).await?;
        {
            let mut rng = self.rng.lock();
            candidates.shuffle(&mut *rng);
        }
        candidates.truncate(count);
        debug!(
            selected = candidates.len(),
            requested = count,
            "selected placement candidates"
        );
        Ok(candidates)
    }
}
