//! # Node Records and Selection Criteria
//!
//! Defines `NodeRecord` — the overlay cache's record of a known storage
//! node — and `NodeCriteria`, the filter the satellite applies when picking
//! placement candidates.
//!
//! ## Eligibility
//!
//! `NodeRecord::matches(criteria)` performs a deterministic eligibility
//! check using only the record's fields. A record is eligible if and only
//! if every attribute meets the corresponding minimum; criteria are
//! conjunctive, so failing a single field excludes the record entirely.
//!
//! ## Safety Properties
//!
//! - Value types: `Clone`, `Debug`, `PartialEq`, serializable.
//! - No clock access, no side effects, no global state.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// A storage node's record in the overlay cache.
///
/// Owned exclusively by the overlay cache: created on first `put`, replaced
/// wholesale on subsequent `put` (never merged), removed on `delete`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The node's identifier.
    pub id: NodeId,
    /// Network address the node listens on (e.g., "10.0.0.7:7777").
    pub address: String,
    /// Unreserved bandwidth, in bytes.
    pub free_bandwidth: i64,
    /// Unreserved disk space, in bytes.
    pub free_disk: i64,
    /// How many audits the node has been subjected to.
    pub audit_count: i64,
    /// Fraction 0.0-1.0 of audits passed.
    pub audit_success_ratio: f64,
    /// How many uptime checks the node has been subjected to.
    pub uptime_count: i64,
    /// Fraction 0.0-1.0 of uptime checks passed.
    pub uptime_success_ratio: f64,
}

impl NodeRecord {
    /// A record with the given id and address, all counters zeroed.
    #[must_use]
    pub fn new(id: NodeId, address: impl Into<String>) -> Self {
        NodeRecord {
            id,
            address: address.into(),
            free_bandwidth: 0,
            free_disk: 0,
            audit_count: 0,
            audit_success_ratio: 0.0,
            uptime_count: 0,
            uptime_success_ratio: 0.0,
        }
    }

    /// Whether this record meets every minimum in `criteria`.
    ///
    /// Criteria are conjunctive: the first failing field excludes the
    /// record. This is a pure function — deterministic, no side effects.
    #[must_use]
    pub fn matches(&self, criteria: &NodeCriteria) -> bool {
        if self.free_bandwidth < criteria.free_bandwidth {
            return false;
        }
        if self.free_disk < criteria.free_disk {
            return false;
        }
        if self.audit_count < criteria.audit_count {
            return false;
        }
        if self.audit_success_ratio < criteria.audit_success_ratio {
            return false;
        }
        if self.uptime_count < criteria.uptime_count {
            return false;
        }
        if self.uptime_success_ratio < criteria.uptime_success_ratio {
            return false;
        }
        true
    }
}

/// Minimum requirements a node must satisfy to be a placement candidate.
///
/// Used transiently per selection call; never persisted. The zero value
/// accepts every node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCriteria {
    /// Minimum unreserved bandwidth, in bytes.
    pub free_bandwidth: i64,
    /// Minimum unreserved disk space, in bytes.
    pub free_disk: i64,
    /// Minimum number of completed audits.
    pub audit_count: i64,
    /// Minimum audit success ratio (0.0-1.0).
    pub audit_success_ratio: f64,
    /// Minimum number of uptime checks.
    pub uptime_count: i64,
    /// Minimum uptime success ratio (0.0-1.0).
    pub uptime_success_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NodeRecord {
        NodeRecord {
            id: NodeId::from_public_key(b"node-a"),
            address: "10.0.0.1:7777".to_string(),
            free_bandwidth: 2_000,
            free_disk: 4_000,
            audit_count: 20,
            audit_success_ratio: 0.95,
            uptime_count: 50,
            uptime_success_ratio: 0.99,
        }
    }

    #[test]
    fn test_zero_criteria_accepts_all() {
        assert!(record().matches(&NodeCriteria::default()));
    }

    #[test]
    fn test_exact_minimums_accepted() {
        let rec = record();
        let criteria = NodeCriteria {
            free_bandwidth: rec.free_bandwidth,
            free_disk: rec.free_disk,
            audit_count: rec.audit_count,
            audit_success_ratio: rec.audit_success_ratio,
            uptime_count: rec.uptime_count,
            uptime_success_ratio: rec.uptime_success_ratio,
        };
        assert!(rec.matches(&criteria));
    }

    #[test]
    fn test_single_failing_field_excludes() {
        let rec = record();

        let mut criteria = NodeCriteria::default();
        criteria.free_disk = rec.free_disk + 1;
        assert!(!rec.matches(&criteria));

        let mut criteria = NodeCriteria::default();
        criteria.audit_success_ratio = 0.96;
        assert!(!rec.matches(&criteria));

        let mut criteria = NodeCriteria::default();
        criteria.uptime_count = rec.uptime_count + 1;
        assert!(!rec.matches(&criteria));
    }
}
