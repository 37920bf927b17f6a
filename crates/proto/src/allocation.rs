//! # Bandwidth Allocations
//!
//! The two signed messages that make bandwidth accountable:
//!
//! | Type | Issuer | Signed with | Lifetime |
//! |------|--------|-------------|----------|
//! | `PayerBandwidthAllocation` | satellite | satellite key | one transfer session (hours) |
//! | `RenterBandwidthAllocation` | uplink | uplink key | one checkpoint of a transfer |
//!
//! A `PayerBandwidthAllocation` is issued once per logical transfer session
//! and is immutable thereafter. The uplink wraps it in a
//! `RenterBandwidthAllocation` per checkpoint, with a cumulative byte total;
//! the final reported total is authoritative for billing.
//!
//! ## Signing Rule
//!
//! The signature covers the message's deterministic encoding WITH THE
//! SIGNATURE FIELD CLEARED. `signing_payload()` produces exactly those
//! bytes; `sign()` and `verify()` both go through it, so a tampered field
//! invalidates the existing signature.

use serde::{Deserialize, Serialize};

use orbit_common::id::NodeId;
use orbit_common::identity::FullIdentity;
use orbit_common::crypto;

use crate::encoding::{encode_message, ProtoError};

/// Which direction of transfer an allocation covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthAction {
    /// Piece download from a storage node.
    Get,
    /// Piece upload to a storage node.
    Put,
}

impl BandwidthAction {
    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

/// Error produced when signing or verifying an allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("allocation encode failed: {0}")]
    Encode(#[from] ProtoError),

    /// Covers both a mismatching signature and malformed key/signature
    /// bytes — callers treat either as a failed verification.
    #[error("allocation signature verification failed")]
    BadSignature,
}

// ════════════════════════════════════════════════════════════════════════════════
// PAYER BANDWIDTH ALLOCATION
// ════════════════════════════════════════════════════════════════════════════════

/// Satellite-issued permission for an uplink to consume bandwidth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayerBandwidthAllocation {
    /// Identity of the issuing satellite.
    pub satellite_id: NodeId,
    /// Identity of the uplink the allocation was issued to.
    pub uplink_id: NodeId,
    /// Transfer direction this allocation covers.
    pub action: BandwidthAction,
    /// Monotonically-assigned serial, globally unique per acceptance.
    pub serial_number: String,
    /// Unix seconds when the allocation was issued.
    pub created_unix_sec: i64,
    /// Unix seconds after which the allocation is invalid (exclusive).
    pub expiration_unix_sec: i64,
    /// Satellite signature over the cleared-signature encoding.
    pub signature: Vec<u8>,
}

impl PayerBandwidthAllocation {
    /// The bytes the satellite signature covers.
    pub fn signing_payload(&self) -> Result<Vec<u8>, ProtoError> {
        let mut unsigned = self.clone();
        unsigned.signature = Vec::new();
        encode_message(&unsigned)
    }

    /// Sign in place with the satellite's key.
    pub fn sign(&mut self, identity: &FullIdentity) -> Result<(), AllocationError> {
        let payload = self.signing_payload()?;
        self.signature = identity.sign(&payload);
        Ok(())
    }

    /// Verify the signature against the given public key bytes.
    pub fn verify(&self, pubkey_bytes: &[u8]) -> Result<(), AllocationError> {
        let payload = self.signing_payload()?;
        match crypto::verify_signature(pubkey_bytes, &payload, &self.signature) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(AllocationError::BadSignature),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// RENTER BANDWIDTH ALLOCATION
// ════════════════════════════════════════════════════════════════════════════════

/// Uplink-issued receipt for bandwidth consumed against a payer allocation.
///
/// One instance is created per checkpoint of a transfer session; `total` is
/// cumulative and strictly increasing within the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenterBandwidthAllocation {
    /// The satellite-issued allocation this receipt draws on.
    pub payer_allocation: PayerBandwidthAllocation,
    /// The storage node the bandwidth was exchanged with.
    pub storage_node_id: NodeId,
    /// Transfer direction; must match the payer allocation's action.
    pub action: BandwidthAction,
    /// Cumulative bytes for the session so far.
    pub total: i64,
    /// Uplink signature over the cleared-signature encoding.
    pub signature: Vec<u8>,
}

impl RenterBandwidthAllocation {
    /// An unsigned receipt wrapping `payer_allocation`.
    #[must_use]
    pub fn new(
        payer_allocation: PayerBandwidthAllocation,
        storage_node_id: NodeId,
        total: i64,
    ) -> Self {
        let action = payer_allocation.action;
        RenterBandwidthAllocation {
            payer_allocation,
            storage_node_id,
            action,
            total,
            signature: Vec::new(),
        }
    }

    /// The bytes the uplink signature covers.
    ///
    /// Only this message's own signature is cleared; the embedded payer
    /// allocation keeps its signature, so the receipt binds to the exact
    /// allocation it was issued under.
    pub fn signing_payload(&self) -> Result<Vec<u8>, ProtoError> {
        let mut unsigned = self.clone();
        unsigned.signature = Vec::new();
        encode_message(&unsigned)
    }

    /// Sign in place with the uplink's key.
    pub fn sign(&mut self, identity: &FullIdentity) -> Result<(), AllocationError> {
        let payload = self.signing_payload()?;
        self.signature = identity.sign(&payload);
        Ok(())
    }

    /// Verify the signature against the given public key bytes.
    pub fn verify(&self, pubkey_bytes: &[u8]) -> Result<(), AllocationError> {
        let payload = self.signing_payload()?;
        match crypto::verify_signature(pubkey_bytes, &payload, &self.signature) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(AllocationError::BadSignature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payer(satellite: &FullIdentity, uplink: &FullIdentity) -> PayerBandwidthAllocation {
        PayerBandwidthAllocation {
            satellite_id: satellite.node_id(),
            uplink_id: uplink.node_id(),
            action: BandwidthAction::Put,
            serial_number: "serial-0001".to_string(),
            created_unix_sec: 1_700_000_000,
            expiration_unix_sec: 1_700_003_600,
            signature: Vec::new(),
        }
    }

    #[test]
    fn test_payer_sign_verify() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();

        let mut pba = payer(&satellite, &uplink);
        pba.sign(&satellite).expect("sign");
        pba.verify(&satellite.public_key_bytes()).expect("verify");
    }

    #[test]
    fn test_payer_verify_wrong_key_fails() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();

        let mut pba = payer(&satellite, &uplink);
        pba.sign(&satellite).expect("sign");
        let err = pba.verify(&uplink.public_key_bytes()).unwrap_err();
        assert_eq!(err, AllocationError::BadSignature);
    }

    #[test]
    fn test_renter_sign_verify() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();
        let node = FullIdentity::generate();

        let mut pba = payer(&satellite, &uplink);
        pba.sign(&satellite).expect("sign");

        let mut rba = RenterBandwidthAllocation::new(pba, node.node_id(), 666);
        rba.sign(&uplink).expect("sign");
        rba.verify(&uplink.public_key_bytes()).expect("verify");
    }

    #[test]
    fn test_tampered_total_invalidates_signature() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();
        let node = FullIdentity::generate();

        let mut pba = payer(&satellite, &uplink);
        pba.sign(&satellite).expect("sign");

        let mut rba = RenterBandwidthAllocation::new(pba, node.node_id(), 666);
        rba.sign(&uplink).expect("sign");

        rba.total = 1337;
        let err = rba.verify(&uplink.public_key_bytes()).unwrap_err();
        assert_eq!(err, AllocationError::BadSignature);
    }

    #[test]
    fn test_corrupted_signature_bytes_fail_gracefully() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();
        let node = FullIdentity::generate();

        let mut pba = payer(&satellite, &uplink);
        pba.sign(&satellite).expect("sign");

        let mut rba = RenterBandwidthAllocation::new(pba, node.node_id(), 666);
        rba.sign(&uplink).expect("sign");

        rba.signature = b"invalid".to_vec();
        let err = rba.verify(&uplink.public_key_bytes()).unwrap_err();
        assert_eq!(err, AllocationError::BadSignature);
    }

    #[test]
    fn test_action_copied_from_payer() {
        let satellite = FullIdentity::generate();
        let uplink = FullIdentity::generate();
        let node = FullIdentity::generate();

        let pba = payer(&satellite, &uplink);
        let rba = RenterBandwidthAllocation::new(pba, node.node_id(), 0);
        assert_eq!(rba.action, BandwidthAction::Put);
        assert_eq!(rba.action.as_str(), "PUT");
    }
}
