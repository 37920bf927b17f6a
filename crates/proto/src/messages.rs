//! Piece-store stream messages and the agreement status enum.
//!
//! Upload direction: the first message on a store stream is a
//! [`PieceHeader`]; every subsequent message is a [`PieceChunk`] carrying
//! payload bytes plus the signed receipt covering the cumulative total.
//! Download direction: requests are [`RetrieveRequest`]s scoped to a byte
//! range; responses are [`RetrieveChunk`]s.

use serde::{Deserialize, Serialize};

use orbit_common::id::PieceId;

use crate::allocation::RenterBandwidthAllocation;

/// Opaque authorization token forwarded verbatim on piece operations.
///
/// Issued out-of-band; the storage node decides what to accept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// First message of an upload stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceHeader {
    pub piece_id: PieceId,
    /// Unix seconds after which the storage node may discard the piece.
    pub expiration_unix_sec: i64,
    pub authorization: Option<SignedMessage>,
}

/// A payload chunk plus the signed receipt covering it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceChunk {
    pub content: Vec<u8>,
    pub bandwidth_allocation: RenterBandwidthAllocation,
}

/// Messages flowing uplink → storage node on an upload stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PieceStoreMessage {
    Header(PieceHeader),
    Chunk(PieceChunk),
}

/// Final acknowledgement of an upload stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceStoreSummary {
    pub message: String,
    pub total_received: i64,
}

/// A range-scoped download request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub piece_id: PieceId,
    pub offset: u64,
    pub length: u64,
    /// Receipt covering the bytes requested so far in this session.
    pub bandwidth_allocation: RenterBandwidthAllocation,
    pub authorization: Option<SignedMessage>,
}

/// A payload chunk flowing storage node → uplink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveChunk {
    pub content: Vec<u8>,
}

/// Single round-trip delete request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceDelete {
    pub piece_id: PieceId,
    pub authorization: Option<SignedMessage>,
}

/// Metadata summary of a stored piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceSummary {
    pub piece_id: PieceId,
    pub piece_size: i64,
    pub expiration_unix_sec: i64,
}

/// Verification outcome returned to a storage node submitting an agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementsSummary {
    /// Validated and durably stored.
    Ok,
    /// Validation failed; nothing was written.
    Rejected,
    /// Validation passed but the store failed downstream.
    Fail,
}
