//! # Piece Routes Capability
//!
//! `PieceRoutes` is the uplink's view of an already-authenticated
//! bidirectional channel to ONE storage node. Connection establishment and
//! peer authentication happen elsewhere; by the time a `PieceRoutes` value
//! exists, both sides know who they are talking to.
//!
//! The four operations mirror the storage-node RPC surface: `meta`,
//! `store` (upload stream), `retrieve` (download stream), `delete`.
//! Stream handles are owned values; dropping one tears the stream down
//! best-effort.

use async_trait::async_trait;
use thiserror::Error;

use orbit_common::id::PieceId;

use crate::messages::{
    PieceDelete, PieceStoreMessage, PieceStoreSummary, PieceSummary, RetrieveChunk,
    RetrieveRequest,
};

/// Error surfaced by a transport channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The channel failed: peer gone, stream reset, send after close.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The peer answered with something the protocol does not allow here.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The referenced piece does not exist on the storage node.
    #[error("piece not found: {0}")]
    NotFound(String),
}

/// Uplink-side handle of an upload stream.
#[async_trait]
pub trait UploadSink: Send {
    /// Send one message; messages arrive in send order.
    async fn send(&mut self, msg: PieceStoreMessage) -> Result<(), RouteError>;

    /// Close the sending half and wait for the node's final acknowledgement.
    async fn close_and_recv(&mut self) -> Result<PieceStoreSummary, RouteError>;
}

/// Uplink-side handle of a download stream.
#[async_trait]
pub trait RetrieveChannel: Send {
    /// Send one range-scoped request.
    async fn send(&mut self, req: RetrieveRequest) -> Result<(), RouteError>;

    /// Receive the next chunk; `None` once the node has sent everything
    /// for the requests issued so far.
    async fn recv(&mut self) -> Result<Option<RetrieveChunk>, RouteError>;
}

/// The authenticated channel capability to one storage node.
#[async_trait]
pub trait PieceRoutes: Send + Sync {
    /// Single round-trip metadata lookup.
    async fn meta(&self, id: PieceId) -> Result<PieceSummary, RouteError>;

    /// Open an upload stream.
    async fn store(&self) -> Result<Box<dyn UploadSink>, RouteError>;

    /// Open a download stream.
    async fn retrieve(&self) -> Result<Box<dyn RetrieveChannel>, RouteError>;

    /// Single round-trip delete; the reply is the node's route summary.
    async fn delete(&self, req: PieceDelete) -> Result<String, RouteError>;
}
