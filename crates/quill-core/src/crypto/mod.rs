//! Cryptography for Quill.
//!
//! One X25519 key pair per installation, backed up as base64 text files.
//! Entry bodies are sealed with XChaCha20-Poly1305 under a key derived
//! from the pair's self-addressed Diffie-Hellman shared secret, with a
//! fresh random nonce prefixed to every blob.

pub mod cipher;
pub mod keys;

pub use cipher::{open, seal, NONCE_LEN};
pub use keys::{KeyPair, KeyStore, KEY_LEN};
