//! # Orbit Proto Crate
//!
//! Proto crate adalah kontrak data antara komponen Orbit: definisi message
//! types untuk bandwidth accounting dan piece transfer, plus capability
//! traits untuk transport yang sudah ter-autentikasi.
//!
//! ## Module Overview
//!
//! - [`allocation`]: payer/renter bandwidth allocations and their
//!   sign/verify rules
//! - [`messages`]: piece-store stream messages, authorization token,
//!   agreement status enum
//! - [`encoding`]: deterministic serialization and hashing helpers
//! - [`routes`]: `PieceRoutes` — the authenticated channel capability the
//!   uplink client drives
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────┐   PayerBandwidthAllocation    ┌───────────┐
//!   │ Satellite│──────────────────────────────▶│  Uplink   │
//!   └────┬─────┘                               └─────┬─────┘
//!        │                                           │ chunk +
//!        │ SubmitBandwidthAgreement                  │ RenterBandwidthAllocation
//!        │ (RenterBandwidthAllocation)               ▼
//!   ┌────┴─────┐                               ┌───────────┐
//!   │ Verifier │◀──────────────────────────────│ Storage   │
//!   └──────────┘        forwarded receipt      │  Node     │
//!                                              └───────────┘
//! ```
//!
//! Setiap chunk yang ditransfer membawa receipt yang ditandatangani; the
//! storage node forwards the final dual-signed receipt to the satellite.
//!
//! ## Determinism
//!
//! Signing payloads use [`encoding`] — the same message always encodes to
//! identical bytes, independent of platform or runtime state.

pub mod allocation;
pub mod encoding;
pub mod messages;
pub mod routes;

pub use allocation::{
    AllocationError, BandwidthAction, PayerBandwidthAllocation, RenterBandwidthAllocation,
};
pub use encoding::{compute_message_hash, decode_message, encode_message, ProtoError};
pub use messages::{
    AgreementsSummary, PieceChunk, PieceDelete, PieceHeader, PieceStoreMessage,
    PieceStoreSummary, PieceSummary, RetrieveChunk, RetrieveRequest, SignedMessage,
};
pub use routes::{PieceRoutes, RetrieveChannel, RouteError, UploadSink};

/// Wire-format version carried nowhere yet; bumped on breaking changes.
pub const PROTO_VERSION: u32 = 1;
