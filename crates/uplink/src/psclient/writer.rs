//! Upload-side stream writer: one signed receipt per chunk sent.

use orbit_common::identity::FullIdentity;
use orbit_common::id::NodeId;
use orbit_proto::{
    PayerBandwidthAllocation, PieceChunk, PieceStoreMessage, PieceStoreSummary,
    RenterBandwidthAllocation, UploadSink,
};

use super::Error;

/// Writes chunks to an upload stream, attaching a freshly signed
/// `RenterBandwidthAllocation` reflecting the cumulative bytes sent.
///
/// Totals are strictly increasing across writes within the session; the
/// storage node is entitled to reject anything else.
pub(super) struct StreamWriter<'a> {
    sink: Box<dyn UploadSink>,
    identity: &'a FullIdentity,
    node_id: NodeId,
    pba: &'a PayerBandwidthAllocation,
    total: i64,
}

impl<'a> StreamWriter<'a> {
    pub(super) fn new(
        sink: Box<dyn UploadSink>,
        identity: &'a FullIdentity,
        node_id: NodeId,
        pba: &'a PayerBandwidthAllocation,
    ) -> Self {
        StreamWriter {
            sink,
            identity,
            node_id,
            pba,
            total: 0,
        }
    }

    /// Send one chunk together with its signed receipt.
    pub(super) async fn write(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.total += chunk.len() as i64;
        let mut rba =
            RenterBandwidthAllocation::new(self.pba.clone(), self.node_id, self.total);
        rba.sign(self.identity)?;
        self.sink
            .send(PieceStoreMessage::Chunk(PieceChunk {
                content: chunk.to_vec(),
                bandwidth_allocation: rba,
            }))
            .await?;
        Ok(())
    }

    /// Close the sending half and wait for the node's acknowledgement.
    pub(super) async fn close(mut self) -> Result<PieceStoreSummary, Error> {
        Ok(self.sink.close_and_recv().await?)
    }
}
