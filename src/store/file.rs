// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encrypted file-backed credential store.
//!
//! Each key is one file `<dir>/<key>.enc` holding the sealed value. The key
//! name is bound into the ciphertext as associated data, so renaming a file
//! makes it undecryptable instead of silently swapping values.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{validate_key, CredentialStore, StoreError};
use crate::config::Config;
use crate::services::crypto::SecretCipher;

/// File holding the generated store key when no passphrase is configured.
pub const KEY_FILE_NAME: &str = "store.key";

const VALUE_EXTENSION: &str = "enc";

/// Credential store persisted under a private directory.
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
    cipher: SecretCipher,
    /// Serializes all operations on this store.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>, cipher: SecretCipher) -> Result<Self, StoreError> {
        let dir = dir.into();
        create_private_dir(&dir).await?;

        tracing::debug!(dir = %dir.display(), "Opened credential store");

        Ok(Self {
            dir,
            cipher,
            lock: Mutex::new(()),
        })
    }

    /// Open the store configured for this app.
    ///
    /// Uses `NOIR_STORE_KEY` when set, otherwise a random key kept in the
    /// data directory.
    pub async fn open_default(config: &Config) -> Result<Self, StoreError> {
        create_private_dir(&config.data_dir).await?;

        let cipher = match &config.store_key {
            Some(passphrase) => SecretCipher::from_passphrase(passphrase)?,
            None => {
                let key_path = config.data_dir.join(KEY_FILE_NAME);
                tokio::task::spawn_blocking(move || SecretCipher::load_or_create(&key_path))
                    .await
                    .map_err(|e| StoreError::Unavailable(format!("key loader panicked: {}", e)))??
            }
        };

        Self::open(config.data_dir.join("credentials"), cipher).await
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, VALUE_EXTENSION))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let sealed = self.cipher.encrypt(value, key.as_bytes())?;

        let _guard = self.lock.lock().await;
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", VALUE_EXTENSION));

        write_private(&tmp, sealed.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;

        let sealed = {
            let _guard = self.lock.lock().await;
            match tokio::fs::read_to_string(self.path_for(key)).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };

        Ok(Some(self.cipher.decrypt(&sealed, key.as_bytes())?))
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;

        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).await?;
    }

    Ok(())
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> SecretCipher {
        SecretCipher::from_passphrase("test passphrase").unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path(), cipher()).await.unwrap();

        assert_eq!(store.get_item("github_access_token").await.unwrap(), None);

        store.set_item("github_access_token", "gho_abc").await.unwrap();
        assert_eq!(
            store.get_item("github_access_token").await.unwrap().as_deref(),
            Some("gho_abc")
        );

        store.delete_item("github_access_token").await.unwrap();
        assert_eq!(store.get_item("github_access_token").await.unwrap(), None);
        store.delete_item("github_access_token").await.unwrap();
    }

    #[tokio::test]
    async fn test_value_is_not_stored_in_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path(), cipher()).await.unwrap();

        store.set_item("github_access_token", "gho_plain").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("github_access_token.enc")).unwrap();
        assert!(!raw.contains("gho_plain"));
    }

    #[tokio::test]
    async fn test_swapped_files_do_not_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path(), cipher()).await.unwrap();

        store.set_item("github_access_token", "gho_abc").await.unwrap();
        std::fs::copy(
            dir.path().join("github_access_token.enc"),
            dir.path().join("user_data.enc"),
        )
        .unwrap();

        assert!(matches!(
            store.get_item("user_data").await,
            Err(StoreError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path(), cipher()).await.unwrap();

        assert!(matches!(
            store.set_item("../escape", "x").await,
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_open_default_generates_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("noir"),
            ..Config::default()
        };

        let store = FileCredentialStore::open_default(&config).await.unwrap();
        store.set_item("user_data", "{}").await.unwrap();
        assert!(config.data_dir.join(KEY_FILE_NAME).exists());

        // Reopening picks up the same key
        let reopened = FileCredentialStore::open_default(&config).await.unwrap();
        assert_eq!(
            reopened.get_item("user_data").await.unwrap().as_deref(),
            Some("{}")
        );
    }
}
