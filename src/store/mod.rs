// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store layer.
//!
//! Key-value persistence for secrets. Every operation is independent: there
//! is no transaction across keys, so callers must tolerate a partially
//! written pair.

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use async_trait::async_trait;

use crate::services::crypto::CryptoError;

/// Key names as constants.
pub mod keys {
    pub const GITHUB_ACCESS_TOKEN: &str = "github_access_token";
    /// Serialized GitHub profile (JSON)
    pub const USER_DATA: &str = "user_data";
}

/// Secure key-value storage backend.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the value under `key`, or None if absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid key {0:?}: only letters, digits, '.', '-' and '_' are allowed")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encryption error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reject keys that cannot be used as a single file name.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        && key != "."
        && key != "..";

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
