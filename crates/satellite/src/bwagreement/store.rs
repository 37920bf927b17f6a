//! Agreement persistence capability plus the in-memory implementation.
//!
//! The store enforces the serial-number uniqueness invariant atomically:
//! one `create` per serial number ever succeeds, regardless of payload
//! differences or which storage node submitted it. There is no overwrite
//! and no silent ignore — a duplicate is a distinct, typed error so the
//! verifier can translate it precisely.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use orbit_common::NodeId;
use orbit_proto::{BandwidthAction, RenterBandwidthAllocation};

/// Error surfaced by an agreement storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgreementStoreError {
    /// An agreement with this serial number has already been accepted.
    #[error("serial number already exists: {0}")]
    SerialExists(String),

    #[error("agreement store backend failure: {0}")]
    Backend(String),
}

/// Aggregated bandwidth moved to/from one storage node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeBandwidthTotals {
    pub put_bytes: i64,
    pub get_bytes: i64,
}

/// Aggregated statistics about one uplink's stored agreements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkStat {
    pub node_id: NodeId,
    pub total_bytes: i64,
    pub put_action_count: usize,
    pub get_action_count: usize,
    pub total_transactions: usize,
}

/// Storage capability for verified bandwidth agreements.
#[async_trait]
pub trait AgreementStore: Send + Sync {
    /// Insert an agreement keyed by its serial number.
    ///
    /// Atomic with respect to concurrent submissions of the same serial:
    /// exactly one caller gets `Ok`, every other gets `SerialExists`.
    async fn create(&self, rba: &RenterBandwidthAllocation)
        -> Result<(), AgreementStoreError>;

    /// Per-storage-node byte totals for agreements created in
    /// `[start, end)` unix seconds.
    async fn totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<HashMap<NodeId, NodeBandwidthTotals>, AgreementStoreError>;

    /// Per-uplink statistics for agreements created in `[start, end)`
    /// unix seconds, ordered by uplink id.
    async fn uplink_stats(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<UplinkStat>, AgreementStoreError>;
}

#[derive(Debug, Clone)]
struct StoredAgreement {
    rba: RenterBandwidthAllocation,
    created_unix_sec: i64,
}

/// In-memory agreement store keyed by serial number.
#[derive(Debug, Default)]
pub struct MemoryAgreementStore {
    agreements: Mutex<BTreeMap<String, StoredAgreement>>,
}

impl MemoryAgreementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted agreements. Test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agreements.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agreements.lock().is_empty()
    }
}

#[async_trait]
impl AgreementStore for MemoryAgreementStore {
    async fn create(
        &self,
        rba: &RenterBandwidthAllocation,
    ) -> Result<(), AgreementStoreError> {
        let serial = rba.payer_allocation.serial_number.clone();
        let mut agreements = self.agreements.lock();
        // Satu serial hanya bisa diterima SATU kali; entry() keeps the
        // check-and-insert atomic under the lock.
        match agreements.entry(serial) {
            std::collections::btree_map::Entry::Occupied(entry) => {
                Err(AgreementStoreError::SerialExists(entry.key().clone()))
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(StoredAgreement {
                    rba: rba.clone(),
                    created_unix_sec: rba.payer_allocation.created_unix_sec,
                });
                Ok(())
            }
        }
    }

    async fn totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<HashMap<NodeId, NodeBandwidthTotals>, AgreementStoreError> {
        let agreements = self.agreements.lock();
        let mut totals: HashMap<NodeId, NodeBandwidthTotals> = HashMap::new();
        for stored in agreements.values() {
            if stored.created_unix_sec < start || stored.created_unix_sec >= end {
                continue;
            }
            let entry = totals.entry(stored.rba.storage_node_id).or_default();
            match stored.rba.action {
                BandwidthAction::Put => entry.put_bytes += stored.rba.total,
                BandwidthAction::Get => entry.get_bytes += stored.rba.total,
            }
        }
        Ok(totals)
    }

    async fn uplink_stats(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<UplinkStat>, AgreementStoreError> {
        let agreements = self.agreements.lock();
        let mut stats: BTreeMap<NodeId, UplinkStat> = BTreeMap::new();
        for stored in agreements.values() {
            if stored.created_unix_sec < start || stored.created_unix_sec >= end {
                continue;
            }
            let uplink = stored.rba.payer_allocation.uplink_id;
            let stat = stats.entry(uplink).or_insert_with(|| UplinkStat {
                node_id: uplink,
                total_bytes: 0,
                put_action_count: 0,
                get_action_count: 0,
                total_transactions: 0,
            });
            stat.total_bytes += stored.rba.total;
            stat.total_transactions += 1;
            match stored.rba.action {
                BandwidthAction::Put => stat.put_action_count += 1,
                BandwidthAction::Get => stat.get_action_count += 1,
            }
        }
        Ok(stats.into_values().collect())
    }
}
