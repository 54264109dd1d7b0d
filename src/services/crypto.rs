// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! At-rest encryption for stored credentials.
//!
//! Values are sealed with AES-256-GCM. The caller supplies associated data
//! (the store key name) so a ciphertext cannot be replayed under another key.
//! Output format: base64(nonce || ciphertext || tag).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

const KEY_LEN: usize = 32;
const HKDF_SALT: &[u8] = b"noir-credential-store";
const HKDF_INFO: &[u8] = b"aes-256-gcm v1";

/// Encryption errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Random number generation failed")]
    Random,

    #[error("Encryption failed")]
    Seal,

    #[error("Decryption failed")]
    Open,

    #[error("Malformed ciphertext: {0}")]
    Malformed(String),

    #[error("Key file error: {0}")]
    KeyFile(#[from] std::io::Error),
}

/// Symmetric cipher for credential values.
#[derive(Clone)]
pub struct SecretCipher {
    key: Arc<LessSafeKey>,
    rng: SystemRandom,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Create a cipher from a raw 32-byte key.
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }

        let unbound = UnboundKey::new(&AES_256_GCM, bytes)
            .map_err(|_| CryptoError::InvalidKey("rejected by AES-256-GCM".to_string()))?;

        Ok(Self {
            key: Arc::new(LessSafeKey::new(unbound)),
            rng: SystemRandom::new(),
        })
    }

    /// Derive the key from a passphrase with HKDF-SHA256.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::InvalidKey("empty passphrase".to_string()));
        }

        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), passphrase.as_bytes());
        let mut okm = [0u8; KEY_LEN];
        hk.expand(HKDF_INFO, &mut okm)
            .map_err(|_| CryptoError::KeyDerivation)?;

        Self::from_key_bytes(&okm)
    }

    /// Load a hex-encoded key file, generating a random key on first use.
    ///
    /// If another process creates the key first, its key is used.
    pub fn load_or_create(path: &Path) -> Result<Self, CryptoError> {
        match Self::load(path) {
            Err(CryptoError::KeyFile(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            other => return other,
        }

        let rng = SystemRandom::new();
        let mut bytes = [0u8; KEY_LEN];
        rng.fill(&mut bytes).map_err(|_| CryptoError::Random)?;

        match publish_private_file(path, hex::encode(bytes).as_bytes(), &rng) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Generated new credential store key");
                Self::from_key_bytes(&bytes)
            }
            Err(CryptoError::KeyFile(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "Credential store key created concurrently");
                Self::load(path)
            }
            Err(e) => Err(e),
        }
    }

    fn load(path: &Path) -> Result<Self, CryptoError> {
        let contents = std::fs::read_to_string(path)?;
        let bytes = hex::decode(contents.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("key file: {}", e)))?;
        Self::from_key_bytes(&bytes)
    }

    /// Encrypt plaintext bound to `aad`.
    /// Returns base64-encoded ciphertext.
    pub fn encrypt(&self, plaintext: &str, aad: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::Random)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(aad),
                &mut in_out,
            )
            .map_err(|_| CryptoError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt base64 ciphertext produced by [`encrypt`](Self::encrypt)
    /// with the same `aad`.
    pub fn decrypt(&self, ciphertext_b64: &str, aad: &[u8]) -> Result<String, CryptoError> {
        let mut data = BASE64
            .decode(ciphertext_b64.trim())
            .map_err(|e| CryptoError::Malformed(format!("base64: {}", e)))?;

        if data.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CryptoError::Malformed("ciphertext too short".to_string()));
        }

        let (nonce_bytes, sealed) = data.split_at_mut(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CryptoError::Malformed("bad nonce".to_string()))?;

        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(aad), sealed)
            .map_err(|_| CryptoError::Open)?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|e| CryptoError::Malformed(format!("UTF-8: {}", e)))
    }
}

/// Create `path` with owner-only permissions and the given contents.
///
/// The file is written under a temporary name and hard-linked into place, so
/// readers never see a partial key. Fails with `AlreadyExists` if `path`
/// exists.
fn publish_private_file(
    path: &Path,
    contents: &[u8],
    rng: &SystemRandom,
) -> Result<(), CryptoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut suffix = [0u8; 8];
    rng.fill(&mut suffix).map_err(|_| CryptoError::Random)?;
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(".{}.tmp", hex::encode(suffix)));
    let tmp = std::path::PathBuf::from(tmp_name);

    let linked = write_private_file(&tmp, contents).and_then(|()| std::fs::hard_link(&tmp, path));
    let _ = std::fs::remove_file(&tmp);
    Ok(linked?)
}

/// Create `path` with owner-only permissions. Fails if it already exists.
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
