//! Download-side lazy range reader.
//!
//! A `PieceRanger` knows the piece's total size but transfers nothing on
//! its own. Each `range()` call opens a retrieval session scoped to the
//! requested window and walks it in bounded steps, signing a receipt for
//! the cumulative bytes requested so far in that session. Arbitrary
//! sub-ranges never pull the whole piece.

use std::sync::Arc;

use orbit_common::identity::FullIdentity;
use orbit_common::id::{NodeId, PieceId};
use orbit_proto::{
    PayerBandwidthAllocation, PieceRoutes, RenterBandwidthAllocation, RetrieveRequest,
    RouteError, SignedMessage,
};

use super::Error;

/// Lazy reader over one stored piece.
pub struct PieceRanger {
    routes: Arc<dyn PieceRoutes>,
    identity: FullIdentity,
    node_id: NodeId,
    piece_id: PieceId,
    size: u64,
    pba: PayerBandwidthAllocation,
    authorization: Option<SignedMessage>,
    step: u64,
}

impl std::fmt::Debug for PieceRanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceRanger")
            .field("node_id", &self.node_id)
            .field("piece_id", &self.piece_id)
            .field("size", &self.size)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl PieceRanger {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        routes: Arc<dyn PieceRoutes>,
        identity: FullIdentity,
        node_id: NodeId,
        piece_id: PieceId,
        size: u64,
        pba: PayerBandwidthAllocation,
        authorization: Option<SignedMessage>,
        step: u64,
    ) -> Self {
        PieceRanger {
            routes,
            identity,
            node_id,
            piece_id,
            size,
            pba,
            authorization,
            step,
        }
    }

    /// Total size of the piece, in bytes.
    #[must_use]
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fetch `[offset, offset+length)` of the piece.
    ///
    /// The window is walked in steps of the configured message size; every
    /// step carries a signed receipt for the cumulative bytes requested in
    /// this session.
    pub async fn range(&self, offset: u64, length: u64) -> Result<Vec<u8>, Error> {
        if offset.checked_add(length).map_or(true, |end| end > self.size) {
            return Err(Error::RangeOutOfBounds {
                offset,
                length,
                size: self.size,
            });
        }
        if length == 0 {
            return Ok(Vec::new());
        }

        let mut channel = self.routes.retrieve().await?;
        let mut received = Vec::with_capacity(length as usize);
        let mut cursor = offset;
        let mut session_total: i64 = 0;

        while (received.len() as u64) < length {
            let remaining = length - received.len() as u64;
            let step = remaining.min(self.step);
            session_total += step as i64;

            let mut rba = RenterBandwidthAllocation::new(
                self.pba.clone(),
                self.node_id,
                session_total,
            );
            rba.sign(&self.identity)?;

            channel
                .send(RetrieveRequest {
                    piece_id: self.piece_id,
                    offset: cursor,
                    length: step,
                    bandwidth_allocation: rba,
                    authorization: self.authorization.clone(),
                })
                .await?;
            cursor += step;

            // Chunk boundaries are the node's choice; accumulate until the
            // requested step has fully arrived.
            let mut step_received: u64 = 0;
            while step_received < step {
                match channel.recv().await? {
                    Some(chunk) => {
                        step_received += chunk.content.len() as u64;
                        received.extend_from_slice(&chunk.content);
                    }
                    None => {
                        return Err(Error::Transport(RouteError::Protocol(
                            "retrieve stream ended before requested range arrived"
                                .to_string(),
                        )));
                    }
                }
            }
        }

        Ok(received)
    }
}
