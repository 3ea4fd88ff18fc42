//! Authenticated encryption of entry bodies.
//!
//! Blob format: `nonce(24) || ciphertext+tag`. The nonce is random and
//! single-use; identical plaintexts sealed twice produce different blobs.
//! Opening verifies the Poly1305 tag and never yields partial plaintext.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::keys::KeyPair;
use crate::error::{QuillError, Result};

/// Width of the random nonce prefixed to every blob.
pub const NONCE_LEN: usize = 24;

/// Seal a plaintext body with the installation key pair.
///
/// # Errors
///
/// `Randomness` if the OS secure random source is unavailable.
pub fn seal(plaintext: &str, keys: &KeyPair) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| QuillError::Randomness(e.to_string()))?;

    let cipher = XChaCha20Poly1305::new_from_slice(&keys.sealing_key()[..])
        .map_err(|e| QuillError::Crypto(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| QuillError::Crypto(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Open a sealed blob with the installation key pair.
///
/// # Errors
///
/// `CiphertextTooShort` if the blob is shorter than the nonce width,
/// `Authentication` if the integrity tag does not verify (wrong key or
/// tampered ciphertext), `Decode` if the plaintext is not UTF-8.
pub fn open(blob: &[u8], keys: &KeyPair) -> Result<String> {
    if blob.len() < NONCE_LEN {
        return Err(QuillError::CiphertextTooShort { len: blob.len() });
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new_from_slice(&keys.sealing_key()[..])
        .map_err(|e| QuillError::Crypto(e.to_string()))?;
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| QuillError::Authentication)?;

    String::from_utf8(plaintext).map_err(|e| QuillError::Decode(format!("entry body: {e}")))
}
