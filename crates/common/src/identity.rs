//! # Process and Peer Identities
//!
//! `FullIdentity` is what a process holds for itself: a node id plus the
//! Ed25519 signing key backing it. `PeerIdentity` is what a process learns
//! about the remote end of an authenticated channel: the peer's node id and
//! public key, with no private material.
//!
//! Verifying operations take the authenticated peer identity as an explicit
//! argument; nothing is recovered from ambient call context. The node id is
//! always derived from the public key, so a peer cannot claim an id it does
//! not hold the key for.

use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::crypto;
use crate::id::NodeId;

/// An identity with signing capability: this process's own identity.
#[derive(Clone)]
pub struct FullIdentity {
    node_id: NodeId,
    key: SigningKey,
}

impl FullIdentity {
    /// Generate a fresh identity from OS entropy.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(crypto::generate_signing_key())
    }

    /// Build an identity from an existing signing key.
    /// The node id is derived from the key, never supplied.
    #[must_use]
    pub fn from_signing_key(key: SigningKey) -> Self {
        let node_id = NodeId::from_public_key(&key.verifying_key().to_bytes());
        FullIdentity { node_id, key }
    }

    #[must_use]
    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    #[must_use]
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.key.verifying_key().to_bytes().to_vec()
    }

    /// Sign a message with this identity's private key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        crypto::sign_message(&self.key, message)
    }

    /// The peer-visible half of this identity.
    #[must_use]
    pub fn peer_identity(&self) -> PeerIdentity {
        PeerIdentity {
            node_id: self.node_id,
            public_key: self.public_key_bytes(),
        }
    }
}

impl std::fmt::Debug for FullIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never prints key material.
        f.debug_struct("FullIdentity")
            .field("node_id", &self.node_id)
            .finish()
    }
}

/// The authenticated identity of a remote peer, as established by the
/// transport handshake. Carries no private material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerIdentity {
    pub node_id: NodeId,
    pub public_key: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_bound_to_key() {
        let ident = FullIdentity::generate();
        let expected = NodeId::from_public_key(&ident.public_key_bytes());
        assert_eq!(ident.node_id(), expected);
    }

    #[test]
    fn test_sign_verifies_under_own_key() {
        let ident = FullIdentity::generate();
        let sig = ident.sign(b"hello");
        let ok = crypto::verify_signature(&ident.public_key_bytes(), b"hello", &sig)
            .expect("verify");
        assert!(ok);
    }

    #[test]
    fn test_peer_identity_matches_full() {
        let ident = FullIdentity::generate();
        let peer = ident.peer_identity();
        assert_eq!(peer.node_id, ident.node_id());
        assert_eq!(peer.public_key, ident.public_key_bytes());
    }

    #[test]
    fn test_distinct_identities() {
        let a = FullIdentity::generate();
        let b = FullIdentity::generate();
        assert_ne!(a.node_id(), b.node_id());
    }
}
