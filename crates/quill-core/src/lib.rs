//! # Quill Core
//!
//! Core library for Quill - a local, encrypted personal journal.
//!
//! This crate provides the cryptographic key lifecycle, authenticated
//! encryption of entry bodies, the file-per-entry record store, and the
//! journal/collection index, independent of any CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: key pair generation/backup and authenticated encryption
//! - **storage**: entry records, ID allocation, and the collection document
//! - **vault**: the aggregate root tying key pair, records, and index together
//! - **lock**: advisory cross-process locking for the shared data root
//!
//! ## Security
//!
//! Every entry body is sealed with the single installation key pair
//! (X25519 + XChaCha20-Poly1305, random nonce per entry). Private key
//! material is zeroized when the session ends, including on error paths.

pub mod crypto;
pub mod error;
pub mod fs;
pub mod lock;
pub mod paths;
pub mod storage;
pub mod vault;

pub use crypto::{KeyPair, KeyStore};
pub use error::{QuillError, Result};
pub use paths::DataDir;
pub use vault::{DecryptedEntry, Journal, OrphanReport, Vault};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
