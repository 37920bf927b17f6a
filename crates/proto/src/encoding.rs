//! Serialization helpers for Orbit wire messages.
//!
//! Module ini menyediakan fungsi encoding/decoding deterministik.
//! Encoding yang sama HARUS menghasilkan output byte yang identik —
//! signatures are computed over these bytes, so any nondeterminism would
//! invalidate receipts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Error produced by the decode half of this module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),
}

/// Encode a message to bytes with a deterministic format.
///
/// # Determinism Guarantee
/// Input yang sama SELALU menghasilkan output byte yang identik,
/// independent of platform, compiler, or runtime state. bincode uses
/// little-endian fixed-order encoding, which guarantees this.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtoError> {
    bincode::serialize(message).map_err(|e| ProtoError::EncodeFailed(e.to_string()))
}

/// Decode bytes produced by [`encode_message`].
///
/// # Roundtrip Guarantee
/// `decode_message(encode_message(m)) == m` for every valid message.
pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtoError> {
    if bytes.is_empty() {
        return Err(ProtoError::DecodeFailed("empty input".to_string()));
    }
    bincode::deserialize(bytes).map_err(|e| ProtoError::DecodeFailed(e.to_string()))
}

/// Compute the SHA3-256 hash of a message's deterministic encoding.
///
/// The hash is computed from the ENCODED bytes, not the struct directly,
/// so it is stable across decode/re-encode cycles.
pub fn compute_message_hash<T: Serialize>(message: &T) -> Result<[u8; 32], ProtoError> {
    let encoded = encode_message(message)?;
    let mut hasher = Sha3_256::new();
    hasher.update(&encoded);
    Ok(hasher.finalize().into())
}
