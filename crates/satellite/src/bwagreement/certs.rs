//! Uplink public-key registry capability.
//!
//! Renter signatures are checked against the uplink's public key, looked
//! up here by the uplink id embedded in the payer allocation. Keys are
//! registered when the satellite first issues an allocation to an uplink.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use orbit_common::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertStoreError {
    #[error("cert store backend failure: {0}")]
    Backend(String),
}

/// Storage capability mapping node ids to registered public keys.
#[async_trait]
pub trait CertStore: Send + Sync {
    /// Register (or replace) the public key for `id`.
    async fn save_public_key(&self, id: NodeId, pubkey: Vec<u8>)
        -> Result<(), CertStoreError>;

    /// The registered key for `id`, `None` when never registered.
    async fn public_key(&self, id: &NodeId) -> Result<Option<Vec<u8>>, CertStoreError>;
}

/// In-memory cert store.
#[derive(Debug, Default)]
pub struct MemoryCertStore {
    keys: RwLock<HashMap<NodeId, Vec<u8>>>,
}

impl MemoryCertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertStore for MemoryCertStore {
    async fn save_public_key(
        &self,
        id: NodeId,
        pubkey: Vec<u8>,
    ) -> Result<(), CertStoreError> {
        self.keys.write().insert(id, pubkey);
        Ok(())
    }

    async fn public_key(&self, id: &NodeId) -> Result<Option<Vec<u8>>, CertStoreError> {
        Ok(self.keys.read().get(id).cloned())
    }
}
