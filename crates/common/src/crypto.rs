//! Crypto helpers: Ed25519 keypair generation, sign, verify, and hex utilities.
//! Compatible with ed25519-dalek v2 + rand_core feature enabled.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hex::{decode as hex_decode, encode as hex_encode};
use rand::rngs::OsRng;
use thiserror::Error;

/// Ed25519 public keys and signatures have fixed sizes.
pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, found {found}")]
    InvalidKeyLength { expected: usize, found: usize },

    #[error("invalid signature length: expected {expected}, found {found}")]
    InvalidSignatureLength { expected: usize, found: usize },

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Generate a new Ed25519 signing key from the OS entropy source.
pub fn generate_signing_key() -> SigningKey {
    let mut rng = OsRng;
    SigningKey::generate(&mut rng)
}

/// Sign a message and return the 64-byte signature.
pub fn sign_message(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    key.sign(message).to_bytes().to_vec()
}

/// Verify a message given public key bytes and signature bytes.
///
/// Returns `Ok(false)` when the signature does not match; errors are
/// reserved for malformed inputs.
pub fn verify_signature(
    pubkey_bytes: &[u8],
    message: &[u8],
    sig_bytes: &[u8],
) -> Result<bool, CryptoError> {
    if pubkey_bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: PUBLIC_KEY_LENGTH,
            found: pubkey_bytes.len(),
        });
    }
    if sig_bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            found: sig_bytes.len(),
        });
    }

    let mut pk_arr = [0u8; PUBLIC_KEY_LENGTH];
    pk_arr.copy_from_slice(pubkey_bytes);
    let vk = VerifyingKey::from_bytes(&pk_arr).map_err(|_| CryptoError::InvalidPublicKey)?;

    let mut sig_arr = [0u8; SIGNATURE_LENGTH];
    sig_arr.copy_from_slice(sig_bytes);
    let sig = Signature::from_bytes(&sig_arr);

    match vk.verify(message, &sig) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Hex helpers
pub fn public_key_bytes_to_hex(pk: &[u8]) -> String {
    hex_encode(pk)
}

pub fn public_key_bytes_from_hex(hexstr: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(hex_decode(hexstr)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = generate_signing_key();
        let pk = key.verifying_key().to_bytes();
        let msg = b"orbit bandwidth receipt";

        let sig = sign_message(&key, msg);
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert!(verify_signature(&pk, msg, &sig).expect("verify"));
    }

    #[test]
    fn test_verify_rejects_tampered_message() {
        let key = generate_signing_key();
        let pk = key.verifying_key().to_bytes();

        let sig = sign_message(&key, b"original payload");
        let ok = verify_signature(&pk, b"tampered payload", &sig).expect("verify");
        assert!(!ok);
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let key = generate_signing_key();
        let other = generate_signing_key();
        let msg = b"payload";

        let sig = sign_message(&key, msg);
        let ok = verify_signature(&other.verifying_key().to_bytes(), msg, &sig).expect("verify");
        assert!(!ok);
    }

    #[test]
    fn test_verify_bad_lengths() {
        let key = generate_signing_key();
        let pk = key.verifying_key().to_bytes();
        let sig = sign_message(&key, b"m");

        assert!(matches!(
            verify_signature(&pk[..16], b"m", &sig),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
        assert!(matches!(
            verify_signature(&pk, b"m", &sig[..32]),
            Err(CryptoError::InvalidSignatureLength { .. })
        ));
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = generate_signing_key();
        let pk = key.verifying_key().to_bytes().to_vec();
        let hexstr = public_key_bytes_to_hex(&pk);
        let back = public_key_bytes_from_hex(&hexstr).expect("decode");
        assert_eq!(pk, back);
    }
}
