//! Storage capability behind the overlay cache, plus the in-memory
//! implementation.
//!
//! The trait carries exactly the operations the cache needs: keyed CRUD,
//! an ordered range scan for cursor listing, offset pagination, and a
//! criteria filter for selection candidates. Backend errors propagate to
//! the cache unchanged.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use orbit_common::{NodeCriteria, NodeId, NodeRecord};

/// Error surfaced by an overlay storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("overlay store backend failure: {0}")]
    Backend(String),
}

/// Storage capability for node records.
#[async_trait]
pub trait OverlayStore: Send + Sync {
    /// Upsert a record under `id`. Replace semantics, never merge.
    async fn put(&self, id: NodeId, record: NodeRecord) -> Result<(), StoreError>;

    /// Fetch a record, `None` when absent.
    async fn get(&self, id: &NodeId) -> Result<Option<NodeRecord>, StoreError>;

    /// Remove a record; removing an absent id is not an error.
    async fn delete(&self, id: &NodeId) -> Result<(), StoreError>;

    /// Records in id order, strictly greater than `start_after`,
    /// at most `limit`.
    async fn list(
        &self,
        start_after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, StoreError>;

    /// Offset pagination over id order; returns the page and whether more
    /// records follow it.
    async fn paginate(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<NodeRecord>, bool), StoreError>;

    /// Every record matching `criteria`, unordered.
    async fn select_candidates(
        &self,
        criteria: &NodeCriteria,
    ) -> Result<Vec<NodeRecord>, StoreError>;
}

/// In-memory overlay store on an ordered map.
///
/// Concurrent `put`/`delete` on the same id are last-write-wins; the lock
/// makes each operation atomic, so readers never observe a torn record.
#[derive(Debug, Default)]
pub struct MemoryOverlayStore {
    nodes: RwLock<BTreeMap<NodeId, NodeRecord>>,
}

impl MemoryOverlayStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

#[async_trait]
impl OverlayStore for MemoryOverlayStore {
    async fn put(&self, id: NodeId, record: NodeRecord) -> Result<(), StoreError> {
        self.nodes.write().insert(id, record);
        Ok(())
    }

    async fn get(&self, id: &NodeId) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.nodes.read().get(id).cloned())
    }

    async fn delete(&self, id: &NodeId) -> Result<(), StoreError> {
        self.nodes.write().remove(id);
        Ok(())
    }

    async fn list(
        &self,
        start_after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, StoreError> {
        let nodes = self.nodes.read();
        let records = match start_after {
            Some(after) => nodes
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
                .take(limit)
                .map(|(_, rec)| rec.clone())
                .collect(),
            None => nodes.values().take(limit).cloned().collect(),
        };
        Ok(records)
    }

    async fn paginate(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<NodeRecord>, bool), StoreError> {
        let nodes = self.nodes.read();
        let total = nodes.len() as u64;
        let page: Vec<NodeRecord> = nodes
            .values()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect();
        let has_more = offset.saturating_add(page.len() as u64) < total;
        Ok((page, has_more))
    }

    async fn select_candidates(
        &self,
        criteria: &NodeCriteria,
    ) -> Result<Vec<NodeRecord>, StoreError> {
        let nodes = self.nodes.read();
        Ok(nodes
            .values()
            .filter(|rec| rec.matches(criteria))
            .cloned()
            .collect())
    }
}
