//! # Piece Store Streaming Client
//!
//! Drives a per-piece bidirectional streaming session against one storage
//! node, enforcing the signed-accounting contract and cleaning up partial
//! uploads.
//!
//! ## Accounting Contract
//!
//! Every chunk sent or requested travels with a `RenterBandwidthAllocation`
//! signed by this client, carrying the cumulative byte total for the
//! session. Totals are strictly increasing within a session; the storage
//! node may reject anything else. The client refuses to operate without a
//! private key rather than send an unsigned receipt.
//!
//! ## Partial-Upload Cleanup
//!
//! If the data source is cut mid-upload (peer closed early, slow-consumer
//! cutoff), the client closes the stream and issues a delete for the piece
//! so no orphaned partial piece is left behind. A failed cleanup delete is
//! its own error, distinguishable from plain truncation.

mod ranger;
mod writer;

pub use ranger::PieceRanger;

use std::sync::Arc;

use thiserror::Error as ThisError;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use orbit_common::identity::FullIdentity;
use orbit_common::id::{NodeId, PieceId};
use orbit_proto::{
    AllocationError, PayerBandwidthAllocation, PieceDelete, PieceHeader, PieceRoutes,
    PieceStoreMessage, PieceSummary, RouteError, SignedMessage,
};

use writer::StreamWriter;

/// Starting bandwidth message size, applied when unset.
pub const DEFAULT_MESSAGE_SIZE: u64 = 32 * 1024;
/// Maximum bandwidth message size, applied when unset.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 64 * 1024;

/// Piece store client parameters. Zero means "use the default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Starting bandwidth message size in bytes (default 32 KiB).
    pub message_size: u64,
    /// Maximum bandwidth message size in bytes (default 64 KiB).
    pub max_message_size: u64,
}

impl Config {
    /// Fill unset fields with defaults and validate the result.
    fn resolved(mut self) -> Result<Config, Error> {
        if self.message_size == 0 {
            self.message_size = DEFAULT_MESSAGE_SIZE;
        }
        if self.max_message_size == 0 {
            self.max_message_size = DEFAULT_MAX_MESSAGE_SIZE;
        }
        if self.message_size > self.max_message_size {
            return Err(Error::InvalidConfig(format!(
                "message size {} exceeds maximum {}",
                self.message_size, self.max_message_size
            )));
        }
        Ok(self)
    }
}

/// Any error returned by the piece store client.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid piece store config: {0}")]
    InvalidConfig(String),

    /// No private key is configured; the client will not send unsigned
    /// receipts.
    #[error("failed to sign: private key not set")]
    SigningUnavailable,

    /// `close()` was called; no further operations are possible.
    #[error("piece store connection closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] RouteError),

    #[error("allocation signing failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("reading data source: {0}")]
    Source(#[from] std::io::Error),

    /// The source was cut mid-upload; the partial piece was deleted.
    #[error("upload truncated; partial piece {piece_id} deleted")]
    UploadTruncated { piece_id: PieceId },

    /// The source was cut mid-upload AND the cleanup delete failed, so a
    /// partial piece may be left on the storage node.
    #[error("upload truncated and cleanup delete failed for piece {piece_id}: {cleanup}")]
    CleanupFailed {
        piece_id: PieceId,
        #[source]
        cleanup: Box<Error>,
    },

    #[error("range {offset}+{length} out of bounds for piece of size {size}")]
    RangeOutOfBounds { offset: u64, length: u64, size: u64 },
}

/// Streaming client for one storage node.
pub struct PieceStore {
    routes: Option<Arc<dyn PieceRoutes>>,
    identity: Option<FullIdentity>,
    remote_id: NodeId,
    config: Config,
}

impl PieceStore {
    /// Build a client over an established, authenticated channel.
    ///
    /// `identity` may be absent for unsigned operations (`meta`, `delete`);
    /// transfer operations then fail with [`Error::SigningUnavailable`].
    /// Config validation happens here, never at transfer time.
    pub fn new(
        routes: Arc<dyn PieceRoutes>,
        identity: Option<FullIdentity>,
        remote_id: NodeId,
        config: Config,
    ) -> Result<Self, Error> {
        let config = config.resolved()?;
        Ok(PieceStore {
            routes: Some(routes),
            identity,
            remote_id,
            config,
        })
    }

    /// Release the underlying channel. Idempotent: calling again, or when
    /// no connection was ever owned, is a no-op.
    pub fn close(&mut self) {
        self.routes = None;
    }

    /// Metadata for a piece by id. Single round trip, no accounting.
    pub async fn meta(&self, id: PieceId) -> Result<PieceSummary, Error> {
        Ok(self.routes()?.meta(id).await?)
    }

    /// Upload a piece, streaming `data` in bounded chunks with a signed
    /// receipt per chunk.
    pub async fn put<R>(
        &self,
        id: PieceId,
        mut data: R,
        ttl_unix_sec: i64,
        pba: &PayerBandwidthAllocation,
        authorization: Option<SignedMessage>,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Unpin + Send,
    {
        let routes = self.routes()?;
        let identity = self.identity()?;

        let mut sink = routes.store().await?;
        sink.send(PieceStoreMessage::Header(PieceHeader {
            piece_id: id,
            expiration_unix_sec: ttl_unix_sec,
            authorization: authorization.clone(),
        }))
        .await?;

        let mut writer = StreamWriter::new(sink, identity, self.remote_id, pba);
        let mut buf = vec![0u8; self.config.message_size as usize];
        loop {
            match data.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => writer.write(&buf[..n]).await?,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // The node cut us off; close best-effort, then remove
                    // the partial piece so nothing orphaned stays behind.
                    let _ = writer.close().await;
                    info!(piece = %id, "upload cut short, deleting partial piece");
                    return match self.delete(id, authorization).await {
                        Ok(()) => Err(Error::UploadTruncated { piece_id: id }),
                        Err(cleanup) => Err(Error::CleanupFailed {
                            piece_id: id,
                            cleanup: Box::new(cleanup),
                        }),
                    };
                }
                Err(e) => {
                    let _ = writer.close().await;
                    return Err(Error::Source(e));
                }
            }
        }

        let summary = writer.close().await?;
        debug!(
            piece = %id,
            total = summary.total_received,
            "upload acknowledged"
        );
        Ok(())
    }

    /// Begin downloading a piece: returns a lazy range reader. Nothing is
    /// transferred until a range is requested.
    pub fn get(
        &self,
        id: PieceId,
        size: u64,
        pba: &PayerBandwidthAllocation,
        authorization: Option<SignedMessage>,
    ) -> Result<PieceRanger, Error> {
        let routes = self.routes()?.clone();
        let identity = self.identity()?.clone();
        Ok(PieceRanger::new(
            routes,
            identity,
            self.remote_id,
            id,
            size,
            pba.clone(),
            authorization,
            self.config.message_size,
        ))
    }

    /// Delete a piece. Single round trip; errors propagate unchanged and
    /// the call is never retried implicitly.
    pub async fn delete(
        &self,
        id: PieceId,
        authorization: Option<SignedMessage>,
    ) -> Result<(), Error> {
        let reply = self
            .routes()?
            .delete(PieceDelete {
                piece_id: id,
                authorization,
            })
            .await?;
        debug!(piece = %id, %reply, "delete request route summary");
        Ok(())
    }

    fn routes(&self) -> Result<&Arc<dyn PieceRoutes>, Error> {
        self.routes.as_ref().ok_or(Error::Closed)
    }

    fn identity(&self) -> Result<&FullIdentity, Error> {
        self.identity.as_ref().ok_or(Error::SigningUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_applied() {
        let cfg = Config::default().resolved().expect("resolve");
        assert_eq!(cfg.message_size, DEFAULT_MESSAGE_SIZE);
        assert_eq!(cfg.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_config_partial_defaults() {
        let cfg = Config {
            message_size: 1024,
            max_message_size: 0,
        }
        .resolved()
        .expect("resolve");
        assert_eq!(cfg.message_size, 1024);
        assert_eq!(cfg.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_config_rejects_start_above_max() {
        let err = Config {
            message_size: 128 * 1024,
            max_message_size: 0,
        }
        .resolved()
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
