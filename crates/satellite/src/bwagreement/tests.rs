//! # Bandwidth Agreement Tests
//!
//! Scenario coverage for the verification pipeline: serial reuse, expiry
//! boundaries, manipulated and corrupted receipts, misattributed peers,
//! and storage faults.

use super::testutil::{generate_payer_allocation, generate_renter_allocation};
use super::*;

use async_trait::async_trait;
use orbit_proto::BandwidthAction;

// ════════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════════

struct Harness {
    satellite: FullIdentity,
    uplink: FullIdentity,
    agreements: Arc<MemoryAgreementStore>,
    server: Server,
}

async fn harness() -> Harness {
    let satellite = FullIdentity::generate();
    let uplink = FullIdentity::generate();
    let agreements = Arc::new(MemoryAgreementStore::new());
    let certs = Arc::new(MemoryCertStore::new());
    certs
        .save_public_key(uplink.node_id(), uplink.public_key_bytes())
        .await
        .expect("save cert");
    let server = Server::new(satellite.clone(), agreements.clone(), certs);
    Harness {
        satellite,
        uplink,
        agreements,
        server,
    }
}

/// A fresh storage-node identity and its peer view.
fn storage_node() -> (FullIdentity, PeerIdentity) {
    let ident = FullIdentity::generate();
    let peer = ident.peer_identity();
    (ident, peer)
}

/// An agreement store whose backend always fails, for the `Fail` path.
#[derive(Debug)]
struct BrokenAgreementStore;

#[async_trait]
impl AgreementStore for BrokenAgreementStore {
    async fn create(
        &self,
        _rba: &RenterBandwidthAllocation,
    ) -> Result<(), AgreementStoreError> {
        Err(AgreementStoreError::Backend("disk on fire".to_string()))
    }

    async fn totals(
        &self,
        _start: i64,
        _end: i64,
    ) -> Result<std::collections::HashMap<NodeId, NodeBandwidthTotals>, AgreementStoreError>
    {
        Err(AgreementStoreError::Backend("disk on fire".to_string()))
    }

    async fn uplink_stats(
        &self,
        _start: i64,
        _end: i64,
    ) -> Result<Vec<UplinkStat>, AgreementStoreError> {
        Err(AgreementStoreError::Backend("disk on fire".to_string()))
    }
}

// ── 1. ACCEPTANCE ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_valid_agreement_accepted() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let status = h.server.bandwidth_agreements(&rba, &peer).await.expect("submit");
    assert_eq!(status, AgreementsSummary::Ok);
    assert_eq!(h.agreements.len(), 1);
}

// ── 2. SERIAL UNIQUENESS ────────────────────────────────────────────────

#[tokio::test]
async fn test_same_serial_resubmission_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    h.server.bandwidth_agreements(&rba, &peer).await.expect("first");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Payer(PayerError::Serial(_))));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
    assert_eq!(h.agreements.len(), 1);
}

#[tokio::test]
async fn test_same_serial_via_other_node_session_rejected() {
    let h = harness().await;
    let (node1, peer1) = storage_node();
    let (node2, peer2) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba1 =
        generate_renter_allocation(pba.clone(), node1.node_id(), &h.uplink, 666).expect("rba");
    let rba2 = generate_renter_allocation(pba, node2.node_id(), &h.uplink, 666).expect("rba");

    let status = h.server.bandwidth_agreements(&rba1, &peer1).await.expect("first");
    assert_eq!(status, AgreementsSummary::Ok);

    // Serial uniqueness is global: a different payload from a different
    // node's session does not get a second acceptance.
    let err = h.server.bandwidth_agreements(&rba2, &peer2).await.unwrap_err();
    assert!(matches!(err, AgreementError::Payer(PayerError::Serial(_))));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

#[tokio::test]
async fn test_fresh_serial_from_same_node_accepted() {
    let h = harness().await;
    let (node, peer) = storage_node();

    for _ in 0..2 {
        let pba =
            generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
                .expect("pba");
        let rba =
            generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");
        let status = h.server.bandwidth_agreements(&rba, &peer).await.expect("submit");
        assert_eq!(status, AgreementsSummary::Ok);
    }
    assert_eq!(h.agreements.len(), 2);
}

#[tokio::test]
async fn test_concurrent_same_serial_single_acceptance() {
    let h = harness().await;
    let server = Arc::new(h.server);

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Put, 3600)
        .expect("pba");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let (node, peer) = storage_node();
        let rba = generate_renter_allocation(pba.clone(), node.node_id(), &h.uplink, 1024)
            .expect("rba");
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            server.bandwidth_agreements(&rba, &peer).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.expect("join").is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(h.agreements.len(), 1);
}

// ── 3. EXPIRY ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_agreement_expiring_soon_accepted() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 30)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let status = h.server.bandwidth_agreements(&rba, &peer).await.expect("submit");
    assert_eq!(status, AgreementsSummary::Ok);
}

#[tokio::test]
async fn test_agreement_expiring_now_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();

    // The boundary is exclusive: expiration == now is already invalid.
    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 0)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(
        err,
        AgreementError::Payer(PayerError::Expired { .. })
    ));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
    assert!(h.agreements.is_empty());
}

#[tokio::test]
async fn test_agreement_expired_yesterday_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(
        &h.satellite,
        &h.uplink,
        BandwidthAction::Get,
        -23 * 3600 - 55,
    )
    .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(
        err,
        AgreementError::Payer(PayerError::Expired { .. })
    ));
}

// ── 4. MANIPULATED RECEIPTS ─────────────────────────────────────────────

#[tokio::test]
async fn test_manipulated_total_rejected_by_renter_check() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let mut rba =
        generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    // The storage node inflates the billed size; the uplink signature no
    // longer covers the message.
    rba.total = 1337;

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Renter(RenterError::Verify)));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
    assert!(h.agreements.is_empty());
}

#[tokio::test]
async fn test_self_signed_manipulation_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();
    let manip = FullIdentity::generate();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let mut rba =
        generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    // Re-signing with a key that is not the uplink's does not help.
    rba.total = 1337;
    rba.sign(&manip).expect("sign");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Renter(RenterError::Verify)));
}

#[tokio::test]
async fn test_replaced_uplink_id_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();
    let manip = FullIdentity::generate();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let mut rba =
        generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    // Swapping in an unregistered uplink id fails the renter key lookup.
    rba.payer_allocation.uplink_id = manip.node_id();
    rba.sign(&manip).expect("sign");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(
        err,
        AgreementError::Renter(RenterError::MissingCert(_))
    ));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

#[tokio::test]
async fn test_self_issued_payer_allocation_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();
    let manip = FullIdentity::generate();

    // A payer allocation that names this satellite but was signed by
    // someone else fails the payer signature check.
    let mut pba = generate_payer_allocation(&manip, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    pba.satellite_id = h.satellite.node_id();
    pba.sign(&manip).expect("re-sign");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Payer(PayerError::Verify)));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

#[tokio::test]
async fn test_replaced_satellite_id_rejected_as_wrong_payer() {
    let h = harness().await;
    let (node, peer) = storage_node();
    let manip = FullIdentity::generate();

    // Allocation issued by an impostor satellite entirely.
    let pba = generate_payer_allocation(&manip, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::WrongPayer { .. }));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

#[tokio::test]
async fn test_corrupted_signature_bytes_rejected() {
    let h = harness().await;
    let (node, peer) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let mut rba =
        generate_renter_allocation(pba, node.node_id(), &h.uplink, 666).expect("rba");

    // Malformed signature bytes must reject, never crash the satellite.
    rba.signature = b"invalid".to_vec();

    let err = h.server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Renter(RenterError::Verify)));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

// ── 5. IDENTITY CHECK ───────────────────────────────────────────────────

#[tokio::test]
async fn test_receipt_submitted_by_wrong_peer_rejected() {
    let h = harness().await;
    let (node1, _peer1) = storage_node();
    let (_node2, peer2) = storage_node();

    let pba = generate_payer_allocation(&h.satellite, &h.uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node1.node_id(), &h.uplink, 666).expect("rba");

    // node2's authenticated session cannot submit node1's receipt.
    let err = h.server.bandwidth_agreements(&rba, &peer2).await.unwrap_err();
    assert!(matches!(err, AgreementError::BadId { .. }));
    assert_eq!(err.summary(), AgreementsSummary::Rejected);
}

// ── 6. STORAGE FAULTS ───────────────────────────────────────────────────

#[tokio::test]
async fn test_backend_fault_downstream_of_validation_is_fail() {
    let satellite = FullIdentity::generate();
    let uplink = FullIdentity::generate();
    let certs = Arc::new(MemoryCertStore::new());
    certs
        .save_public_key(uplink.node_id(), uplink.public_key_bytes())
        .await
        .expect("save cert");
    let server = Server::new(satellite.clone(), Arc::new(BrokenAgreementStore), certs);

    let (node, peer) = storage_node();
    let pba = generate_payer_allocation(&satellite, &uplink, BandwidthAction::Get, 3600)
        .expect("pba");
    let rba = generate_renter_allocation(pba, node.node_id(), &uplink, 666).expect("rba");

    let err = server.bandwidth_agreements(&rba, &peer).await.unwrap_err();
    assert!(matches!(err, AgreementError::Payer(PayerError::Storage(_))));
    assert_eq!(err.summary(), AgreementsSummary::Fail);
}

// ── 7. AGGREGATION ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_totals_and_uplink_stats_aggregate_accepted_rows() {
    let h = harness().await;
    let (node1, peer1) = storage_node();
    let (node2, peer2) = storage_node();

    let submissions = [
        (&node1, &peer1, BandwidthAction::Put, 1_000_i64),
        (&node1, &peer1, BandwidthAction::Get, 300),
        (&node2, &peer2, BandwidthAction::Put, 4_000),
    ];
    for (node, peer, action, total) in submissions {
        let pba = generate_payer_allocation(&h.satellite, &h.uplink, action, 3600)
            .expect("pba");
        let rba =
            generate_renter_allocation(pba, node.node_id(), &h.uplink, total).expect("rba");
        h.server.bandwidth_agreements(&rba, peer).await.expect("submit");
    }

    let now = unix_now();
    let totals = h.agreements.totals(now - 60, now + 60).await.expect("totals");
    assert_eq!(
        totals.get(&node1.node_id()),
        Some(&NodeBandwidthTotals {
            put_bytes: 1_000,
            get_bytes: 300
        })
    );
    assert_eq!(
        totals.get(&node2.node_id()),
        Some(&NodeBandwidthTotals {
            put_bytes: 4_000,
            get_bytes: 0
        })
    );

    let stats = h.agreements.uplink_stats(now - 60, now + 60).await.expect("stats");
    assert_eq!(stats.len(), 1);
    let stat = &stats[0];
    assert_eq!(stat.node_id, h.uplink.node_id());
    assert_eq!(stat.total_bytes, 5_300);
    assert_eq!(stat.put_action_count, 2);
    assert_eq!(stat.get_action_count, 1);
    assert_eq!(stat.total_transactions, 3);

    // Rows outside the window are excluded.
    let outside = h.agreements.totals(now + 120, now + 240).await.expect("totals");
    assert!(outside.is_empty());
}
