// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed access to the persisted credentials.
//!
//! Writes surface a storage error; reads log failures and report "absent",
//! so a damaged entry behaves like a signed-out state.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{AccessToken, GitHubUser};
use crate::store::{keys, CredentialStore};

/// Secure storage for the GitHub token and profile.
#[derive(Clone)]
pub struct SecureStorage {
    store: Arc<dyn CredentialStore>,
}

impl SecureStorage {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    // ─── Access Token ────────────────────────────────────────────

    /// Store the GitHub access token.
    pub async fn store_access_token(&self, token: &AccessToken) -> Result<(), AppError> {
        self.store
            .set_item(keys::GITHUB_ACCESS_TOKEN, token.as_str())
            .await
            .map_err(|e| AppError::storage("Failed to store access token", e))
    }

    /// Retrieve the stored access token, or None if absent or unreadable.
    pub async fn get_access_token(&self) -> Option<AccessToken> {
        match self.store.get_item(keys::GITHUB_ACCESS_TOKEN).await {
            Ok(token) => token.map(AccessToken::new),
            Err(e) => {
                tracing::error!(error = %e, "Failed to retrieve access token");
                None
            }
        }
    }

    // ─── User Data ───────────────────────────────────────────────

    /// Store the user profile as JSON.
    pub async fn store_user_data(&self, user: &GitHubUser) -> Result<(), AppError> {
        let json = serde_json::to_string(user)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize user: {}", e)))?;

        self.store
            .set_item(keys::USER_DATA, &json)
            .await
            .map_err(|e| AppError::storage("Failed to store user data", e))
    }

    /// Retrieve the stored profile, or None if absent or unreadable.
    pub async fn get_user_data(&self) -> Option<GitHubUser> {
        let json = match self.store.get_item(keys::USER_DATA).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to retrieve user data");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "Stored user data is not a valid profile");
                None
            }
        }
    }

    // ─── Session ─────────────────────────────────────────────────

    /// True if a non-empty access token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.get_access_token()
            .await
            .is_some_and(|token| !token.is_empty())
    }

    /// Delete both the token and the profile.
    ///
    /// Both deletions are attempted; the first failure is returned.
    pub async fn clear_auth_data(&self) -> Result<(), AppError> {
        let (token_result, user_result) = tokio::join!(
            self.store.delete_item(keys::GITHUB_ACCESS_TOKEN),
            self.store.delete_item(keys::USER_DATA),
        );

        token_result.and(user_result).map_err(|e| {
            tracing::error!(error = %e, "Failed to clear auth data");
            AppError::storage("Failed to clear authentication data", e)
        })
    }
}
