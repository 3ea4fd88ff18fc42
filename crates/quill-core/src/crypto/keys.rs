//! Installation key pair: generation, backup, and restore.
//!
//! There is exactly one key pair per installation; every entry across
//! every journal is sealed and opened with that same pair. Both halves
//! are backed up as base64 text files under the data root: the public
//! half world-readable, the private half owner-only.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{QuillError, Result};
use crate::fs::write_atomic;
use crate::paths::DataDir;

/// Length of each key half in bytes.
pub const KEY_LEN: usize = 32;

/// A matched X25519 public/private key pair.
///
/// The halves are only meaningful together: sealing and opening both use
/// the pair's own Diffie-Hellman shared secret. Key material is zeroized
/// when the pair is dropped, on every exit path.
#[derive(Clone, ZeroizeOnDrop)]
pub struct KeyPair {
    public: [u8; KEY_LEN],
    private: [u8; KEY_LEN],
}

impl KeyPair {
    pub(crate) fn from_halves(public: [u8; KEY_LEN], private: [u8; KEY_LEN]) -> Self {
        Self { public, private }
    }

    /// The public half, base64-encoded as it appears in the backup file.
    pub fn public_b64(&self) -> String {
        BASE64.encode(self.public)
    }

    /// The raw public half.
    pub fn public_bytes(&self) -> &[u8; KEY_LEN] {
        &self.public
    }

    /// Derive the symmetric sealing key from the pair's own shared secret.
    ///
    /// Self-addressed: the Diffie-Hellman of the private half with the
    /// pair's own public half, domain-separated for entry sealing.
    pub(crate) fn sealing_key(&self) -> Zeroizing<[u8; KEY_LEN]> {
        let secret = StaticSecret::from(self.private);
        let shared = secret.diffie_hellman(&PublicKey::from(self.public));

        let mut hasher = blake3::Hasher::new_derive_key("quill v1 entry sealing");
        hasher.update(shared.as_bytes());
        Zeroizing::new(*hasher.finalize().as_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &BASE64.encode(self.public))
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Persistence of the installation key pair.
#[derive(Debug, Clone)]
pub struct KeyStore {
    backup_dir: PathBuf,
    public_path: PathBuf,
    private_path: PathBuf,
}

impl KeyStore {
    pub fn new(dirs: &DataDir) -> Self {
        Self {
            backup_dir: dirs.backup_dir(),
            public_path: dirs.public_key_path(),
            private_path: dirs.private_key_path(),
        }
    }

    /// Whether both backup files are present.
    pub fn exists(&self) -> bool {
        self.public_path.is_file() && self.private_path.is_file()
    }

    /// Generate a fresh key pair and persist both halves.
    ///
    /// Returns the base64-encoded public key. The private backup is
    /// written owner-only; the public backup is world-readable.
    ///
    /// # Errors
    ///
    /// `Io` if the backup directory cannot be created or written,
    /// `Randomness` if the OS secure random source fails.
    pub fn generate(&self) -> Result<String> {
        let mut seed = Zeroizing::new([0u8; KEY_LEN]);
        OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|e| QuillError::Randomness(e.to_string()))?;

        let secret = StaticSecret::from(*seed);
        let public = PublicKey::from(&secret);

        fs::create_dir_all(&self.backup_dir)?;

        let public_b64 = BASE64.encode(public.as_bytes());
        let private_b64 = Zeroizing::new(BASE64.encode(&seed[..]));

        write_atomic(&self.public_path, public_b64.as_bytes(), false)?;
        relax_public(&self.public_path)?;
        write_atomic(&self.private_path, private_b64.as_bytes(), true)?;

        Ok(public_b64)
    }

    /// Read and decode both backup files.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if either file is absent, `Decode` if the base64 is
    /// malformed or either half is not exactly 32 bytes.
    pub fn restore(&self) -> Result<KeyPair> {
        if !self.public_path.is_file() || !self.private_path.is_file() {
            return Err(QuillError::KeyNotFound);
        }

        let public = decode_key_file(&fs::read_to_string(&self.public_path)?, "public key")?;
        let private = decode_key_file(&fs::read_to_string(&self.private_path)?, "private key")?;

        Ok(KeyPair::from_halves(public, private))
    }
}

fn decode_key_file(encoded: &str, what: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| QuillError::Decode(format!("{what}: {e}")))?;
    let bytes = Zeroizing::new(bytes);
    <[u8; KEY_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| QuillError::Decode(format!("{what}: expected {KEY_LEN} bytes, got {}", bytes.len())))
}

#[cfg(unix)]
fn relax_public(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn relax_public(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> KeyStore {
        KeyStore::new(&DataDir::at(dir.join("store")))
    }

    #[test]
    fn test_restore_before_generate_is_not_found() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        assert!(matches!(store.restore(), Err(QuillError::KeyNotFound)));
    }

    #[test]
    fn test_generate_then_restore_round_trip() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        let public_b64 = store.generate().unwrap();
        let pair = store.restore().unwrap();

        assert_eq!(pair.public_b64(), public_b64);
        assert!(store.exists());
    }

    #[test]
    fn test_generated_pairs_differ() {
        let tmp = tempdir().unwrap();
        let a = store_in(tmp.path()).generate().unwrap();

        let tmp2 = tempdir().unwrap();
        let b = store_in(tmp2.path()).generate().unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_backup_is_decode_error() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store.generate().unwrap();

        std::fs::write(&store.private_path, "not base64 !!!").unwrap();
        assert!(matches!(store.restore(), Err(QuillError::Decode(_))));
    }

    #[test]
    fn test_wrong_length_backup_is_decode_error() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store.generate().unwrap();

        // Valid base64, wrong decoded length.
        std::fs::write(&store.public_path, BASE64.encode([7u8; 16])).unwrap();
        assert!(matches!(store.restore(), Err(QuillError::Decode(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store.generate().unwrap();

        let public_mode = std::fs::metadata(&store.public_path).unwrap().permissions().mode();
        let private_mode = std::fs::metadata(&store.private_path).unwrap().permissions().mode();
        assert_eq!(public_mode & 0o777, 0o644);
        assert_eq!(private_mode & 0o777, 0o600);
    }

    #[test]
    fn test_key_pair_debug_redacts_private() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store.generate().unwrap();
        let pair = store.restore().unwrap();

        let debug_output = format!("{:?}", pair);
        assert!(debug_output.contains("REDACTED"));

        let private_b64 = std::fs::read_to_string(&store.private_path).unwrap();
        assert!(!debug_output.contains(private_b64.trim()));
    }
}
