//! # Identifier Types
//!
//! Fixed-size identifiers for the Orbit network.
//!
//! | Type | Description | Size |
//! |------|-------------|------|
//! | `NodeId` | Identifier of a network participant, derived from its public key | 32 bytes |
//! | `PieceId` | Identifier of a stored piece, chosen by the uplink | 32 bytes |
//!
//! Both types:
//! - wrap `[u8; 32]` with byte-exact equality and `Ord` ordering,
//! - convert to/from lowercase hex deterministically,
//! - are safe for `HashMap`/`BTreeMap` keys.
//!
//! The all-zero `NodeId` is reserved as "invalid/empty" and is rejected by
//! every registry operation that takes an id as a target. `is_zero()` is the
//! check registries use.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use thiserror::Error;

/// Length in bytes of both identifier types.
pub const ID_LENGTH: usize = 32;

/// Error parsing an identifier from hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("invalid hex length: got {got} characters, expected {expected}")]
    InvalidLength { got: usize, expected: usize },

    #[error("hex decode error: {0}")]
    Decode(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// NODE ID
// ════════════════════════════════════════════════════════════════════════════════

/// Identifier of a network participant (satellite, uplink, or storage node).
///
/// Derived as SHA3-256 of the participant's Ed25519 public key, so identity
/// claims are bound to key material. The zero value is reserved.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub [u8; ID_LENGTH]);

impl NodeId {
    /// Derive a node id from raw public key bytes.
    #[must_use]
    pub fn from_public_key(pubkey_bytes: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(pubkey_bytes);
        NodeId(hasher.finalize().into())
    }

    /// The reserved "invalid/empty" id.
    #[must_use]
    #[inline]
    pub const fn zero() -> Self {
        NodeId([0u8; ID_LENGTH])
    }

    /// Whether this is the reserved zero id.
    #[must_use]
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ID_LENGTH]
    }

    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, IdParseError> {
        parse_hex(hexstr).map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 hex chars are enough to tell nodes apart in logs.
        write!(f, "NodeId({}…)", &self.to_hex()[..8])
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PIECE ID
// ════════════════════════════════════════════════════════════════════════════════

/// Identifier of a stored data fragment.
///
/// Chosen by the uplink before upload and stable for the piece's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub [u8; ID_LENGTH]);

impl PieceId {
    /// Generate a fresh random piece id.
    #[must_use]
    pub fn random<R: rand::Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        rng.fill_bytes(&mut bytes);
        PieceId(bytes)
    }

    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, IdParseError> {
        parse_hex(hexstr).map(PieceId)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceId({}…)", &self.to_hex()[..8])
    }
}

fn parse_hex(hexstr: &str) -> Result<[u8; ID_LENGTH], IdParseError> {
    if hexstr.len() != ID_LENGTH * 2 {
        return Err(IdParseError::InvalidLength {
            got: hexstr.len(),
            expected: ID_LENGTH * 2,
        });
    }
    let bytes = hex::decode(hexstr).map_err(|e| IdParseError::Decode(e.to_string()))?;
    let mut arr = [0u8; ID_LENGTH];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_node_id_from_public_key_is_deterministic() {
        let pk = [0x42u8; 32];
        let a = NodeId::from_public_key(&pk);
        let b = NodeId::from_public_key(&pk);
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_zero_id_detected() {
        assert!(NodeId::zero().is_zero());
        assert!(NodeId::default().is_zero());
        assert!(!NodeId([1u8; 32]).is_zero());
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = NodeId::from_public_key(b"some key");
        let back = NodeId::from_hex(&id.to_hex()).expect("parse");
        assert_eq!(id, back);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let piece = PieceId::random(&mut rng);
        let back = PieceId::from_hex(&piece.to_hex()).expect("parse");
        assert_eq!(piece, back);
    }

    #[test]
    fn test_from_hex_rejects_bad_length() {
        assert!(matches!(
            NodeId::from_hex("abcd"),
            Err(IdParseError::InvalidLength { got: 4, .. })
        ));
    }

    #[test]
    fn test_random_piece_ids_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = PieceId::random(&mut rng);
        let b = PieceId::random(&mut rng);
        assert_ne!(a, b);
    }
}
