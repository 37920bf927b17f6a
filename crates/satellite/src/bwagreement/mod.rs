//! # Bandwidth Agreement Verifier/Store
//!
//! Receives dual-signed bandwidth receipts from storage nodes, validates
//! them end-to-end, persists each exactly once, and reports a coarse
//! status without leaking internal error detail onto the wire.
//!
//! ## Validation Pipeline
//!
//! Each call runs the stages in order; every stage short-circuits on
//! failure and no stage is retried:
//!
//! 1. identity check — the authenticated peer must be the storage node
//!    named in the receipt
//! 2. satellite check — the embedded payer allocation must name this
//!    satellite
//! 3. expiry check — expiration strictly after now, no grace period
//! 4. renter signature — against the uplink's registered public key
//! 5. payer signature — against this satellite's own key (self-issued)
//! 6. persist — keyed by serial number; a duplicate serial is a rejection,
//!    any other storage fault is `Fail`
//!
//! Exactly one durable write happens on success; zero writes on any
//! rejection. Callers get the full typed error for logging and branching;
//! the wire response is derived from it via [`AgreementError::summary`].

mod certs;
mod store;

pub mod testutil;

#[cfg(test)]
mod tests;

pub use certs::{CertStore, CertStoreError, MemoryCertStore};
pub use store::{
    AgreementStore, AgreementStoreError, MemoryAgreementStore, NodeBandwidthTotals, UplinkStat,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use orbit_common::identity::{FullIdentity, PeerIdentity};
use orbit_common::time::unix_now;
use orbit_common::NodeId;
use orbit_proto::{AgreementsSummary, RenterBandwidthAllocation};

/// Failures attributed to the uplink-signed (renter) half of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenterError {
    #[error("renter signature verification failed")]
    Verify,

    #[error("no public key registered for uplink {0}")]
    MissingCert(NodeId),
}

/// Failures attributed to the satellite-signed (payer) half of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayerError {
    #[error("allocation expired: {expiration_unix_sec} vs now {now_unix_sec}")]
    Expired {
        expiration_unix_sec: i64,
        now_unix_sec: i64,
    },

    #[error("payer signature verification failed")]
    Verify,

    #[error("serial number already accepted: {0}")]
    Serial(String),

    #[error("agreement persistence failed: {0}")]
    Storage(String),
}

/// Everything that can go wrong while verifying and storing one receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgreementError {
    #[error("bad storage node id: {claimed} vs authenticated peer {peer}")]
    BadId { claimed: NodeId, peer: NodeId },

    #[error("wrong payer satellite id: {claimed} vs own {own}")]
    WrongPayer { claimed: NodeId, own: NodeId },

    #[error("renter side: {0}")]
    Renter(#[from] RenterError),

    #[error("payer side: {0}")]
    Payer(#[from] PayerError),

    #[error("cert store failure: {0}")]
    Cert(String),
}

impl AgreementError {
    /// The coarse wire status this error maps to.
    ///
    /// Validation failures are `Rejected`; faults downstream of validation
    /// (persistence, cert backend) are `Fail`.
    #[must_use]
    pub fn summary(&self) -> AgreementsSummary {
        match self {
            AgreementError::Payer(PayerError::Storage(_)) | AgreementError::Cert(_) => {
                AgreementsSummary::Fail
            }
            _ => AgreementsSummary::Rejected,
        }
    }
}

/// The bandwidth agreement service.
pub struct Server {
    identity: FullIdentity,
    agreements: Arc<dyn AgreementStore>,
    certs: Arc<dyn CertStore>,
}

impl Server {
    #[must_use]
    pub fn new(
        identity: FullIdentity,
        agreements: Arc<dyn AgreementStore>,
        certs: Arc<dyn CertStore>,
    ) -> Self {
        Server {
            identity,
            agreements,
            certs,
        }
    }

    /// Verify and store one receipt submitted by an authenticated storage
    /// node. Returns `Ok(AgreementsSummary::Ok)` on acceptance; the error
    /// carries the full failure detail, and its [`AgreementError::summary`]
    /// is what goes on the wire.
    pub async fn bandwidth_agreements(
        &self,
        rba: &RenterBandwidthAllocation,
        peer: &PeerIdentity,
    ) -> Result<AgreementsSummary, AgreementError> {
        debug!(serial = %rba.payer_allocation.serial_number, "received agreement");
        let result = self.verify_and_store(rba, peer).await;
        match &result {
            Ok(_) => debug!(serial = %rba.payer_allocation.serial_number, "stored agreement"),
            Err(err) => warn!(
                serial = %rba.payer_allocation.serial_number,
                status = ?err.summary(),
                %err,
                "agreement rejected"
            ),
        }
        result
    }

    async fn verify_and_store(
        &self,
        rba: &RenterBandwidthAllocation,
        peer: &PeerIdentity,
    ) -> Result<AgreementsSummary, AgreementError> {
        let pba = &rba.payer_allocation;

        // Stage 1: the submitting peer must be the storage node the
        // receipt names.
        if rba.storage_node_id != peer.node_id {
            return Err(AgreementError::BadId {
                claimed: rba.storage_node_id,
                peer: peer.node_id,
            });
        }

        // Stage 2: the allocation must have been issued by this satellite.
        if pba.satellite_id != self.identity.node_id() {
            return Err(AgreementError::WrongPayer {
                claimed: pba.satellite_id,
                own: self.identity.node_id(),
            });
        }

        // Stage 3: expiration is exclusive — "expires now" is expired.
        let now = unix_now();
        if pba.expiration_unix_sec <= now {
            return Err(PayerError::Expired {
                expiration_unix_sec: pba.expiration_unix_sec,
                now_unix_sec: now,
            }
            .into());
        }

        // Stage 4: renter signature against the uplink's registered key.
        let uplink_key = self
            .certs
            .public_key(&pba.uplink_id)
            .await
            .map_err(|e| AgreementError::Cert(e.to_string()))?
            .ok_or(RenterError::MissingCert(pba.uplink_id))?;
        rba.verify(&uplink_key).map_err(|_| RenterError::Verify)?;

        // Stage 5: payer signature against our own key (self-issued).
        pba.verify(&self.identity.public_key_bytes())
            .map_err(|_| PayerError::Verify)?;

        // Stage 6: persist exactly once, keyed by serial number.
        self.agreements.create(rba).await.map_err(|e| match e {
            AgreementStoreError::SerialExists(serial) => PayerError::Serial(serial),
            AgreementStoreError::Backend(msg) => PayerError::Storage(msg),
        })?;

        Ok(AgreementsSummary::Ok)
    }

    /// Release resources. Nothing is held open today; kept for parity with
    /// the service lifecycle.
    pub fn close(&self) {}
}
