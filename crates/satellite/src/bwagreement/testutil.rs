//! Allocation generators shared by tests across crates.
//!
//! Kept as a regular module (not `#[cfg(test)]`) so integration tests and
//! other crates' test suites can issue well-formed allocations without
//! duplicating the signing choreography.

use std::sync::atomic::{AtomicU64, Ordering};

use orbit_common::identity::FullIdentity;
use orbit_common::time::unix_now;
use orbit_common::NodeId;
use orbit_proto::{
    AllocationError, BandwidthAction, PayerBandwidthAllocation, RenterBandwidthAllocation,
};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Issue and sign a payer allocation expiring `ttl_secs` from now.
///
/// Serial numbers are assigned from a process-wide monotonic counter.
/// `ttl_secs` of zero or below produces an already-expired allocation.
pub fn generate_payer_allocation(
    satellite: &FullIdentity,
    uplink: &FullIdentity,
    action: BandwidthAction,
    ttl_secs: i64,
) -> Result<PayerBandwidthAllocation, AllocationError> {
    let now = unix_now();
    let serial = NEXT_SERIAL.fetch_add(1, Ordering::SeqCst);
    let mut pba = PayerBandwidthAllocation {
        satellite_id: satellite.node_id(),
        uplink_id: uplink.node_id(),
        action,
        serial_number: format!("serial-{:08}", serial),
        created_unix_sec: now,
        expiration_unix_sec: now + ttl_secs,
        signature: Vec::new(),
    };
    pba.sign(satellite)?;
    Ok(pba)
}

/// Wrap a payer allocation in a signed renter receipt.
pub fn generate_renter_allocation(
    pba: PayerBandwidthAllocation,
    storage_node_id: NodeId,
    uplink: &FullIdentity,
    total: i64,
) -> Result<RenterBandwidthAllocation, AllocationError> {
    let mut rba = RenterBandwidthAllocation::new(pba, storage_node_id, total);
    rba.sign(uplink)?;
    Ok(rba)
}
