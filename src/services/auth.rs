// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub sign-in orchestration.
//!
//! `sign_in` is a straight sequence: prompt, exchange code, fetch profile,
//! persist token, persist profile. Any error is caught here and turned into
//! an `AuthenticationResult` carrying a user-facing message; the cause only
//! goes to the log.

use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    AccessToken, AuthStatus, AuthenticationResult, GitHubRepository, GitHubUser, RepositoryQuery,
};
use crate::services::github::GitHubClient;
use crate::services::oauth::{AuthorizationRequest, OAuthClient, StateError, StateSigner};
use crate::services::prompt::{AuthorizationPrompt, PromptResult};
use crate::services::secure_storage::SecureStorage;

/// Orchestrates GitHub sign-in, sign-out and session restore.
#[derive(Clone)]
pub struct GitHubAuthService {
    config: Config,
    oauth: OAuthClient,
    github: GitHubClient,
    storage: SecureStorage,
    prompt: Arc<dyn AuthorizationPrompt>,
    state_signer: StateSigner,
}

impl GitHubAuthService {
    pub fn new(
        config: Config,
        storage: SecureStorage,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            oauth: OAuthClient::new(&config),
            github: GitHubClient::with_base_url(&config.api_base_url, &config.app_name),
            state_signer: StateSigner::random()?,
            config,
            storage,
            prompt,
        })
    }

    pub fn storage(&self) -> &SecureStorage {
        &self.storage
    }

    /// Page where the user can revoke this app's access on GitHub.
    pub fn revocation_url(&self) -> &str {
        &self.oauth.endpoints().revocation_endpoint
    }

    /// Build a fresh authorization request with a newly signed state.
    pub fn authorization_request(&self) -> Result<AuthorizationRequest, AppError> {
        Ok(AuthorizationRequest {
            authorization_endpoint: self.oauth.endpoints().authorization_endpoint.clone(),
            client_id: self.config.github_client_id.clone(),
            redirect_uri: self.config.redirect_uri(),
            scopes: self.config.scopes.clone(),
            state: self.state_signer.issue()?,
        })
    }

    // ─── Sign In ─────────────────────────────────────────────────────────────

    /// Run the interactive GitHub OAuth flow.
    pub async fn sign_in(&self) -> AuthenticationResult {
        match self.try_sign_in().await {
            Ok(result) => result,
            Err(e) => {
                let cause = std::error::Error::source(&e).map(|s| s.to_string());
                tracing::error!(error = %e, cause = ?cause, "GitHub authentication error");

                AuthenticationResult::Error {
                    kind: e.kind(),
                    message: e.user_message(),
                }
            }
        }
    }

    async fn try_sign_in(&self) -> Result<AuthenticationResult, AppError> {
        let request = self.authorization_request()?;

        tracing::info!(
            client_id = %request.client_id,
            redirect_uri = %request.redirect_uri,
            "Starting GitHub OAuth flow"
        );

        let (code, returned_state) = match self.prompt.prompt(&request).await? {
            PromptResult::Success { code, state } => (code, state),
            PromptResult::Cancel { state } => {
                // Only the redirect for this request may report a cancellation
                if let Err(e) = self.check_state(&request.state, state.as_deref()) {
                    tracing::warn!(error = %e, "Rejecting cancellation redirect");
                    return Ok(AuthenticationResult::ProviderFailure {
                        error: Some(e.to_string()),
                    });
                }
                tracing::info!("User cancelled authentication");
                return Ok(AuthenticationResult::Cancelled);
            }
            PromptResult::Dismiss => {
                tracing::info!("User dismissed authentication");
                return Ok(AuthenticationResult::Cancelled);
            }
            PromptResult::Error { error, description } => {
                tracing::warn!(error = %error, description = ?description, "Authentication failed");
                return Ok(AuthenticationResult::ProviderFailure { error: Some(error) });
            }
        };

        if let Err(e) = self.check_state(&request.state, returned_state.as_deref()) {
            tracing::warn!(error = %e, "Rejecting OAuth redirect");
            return Ok(AuthenticationResult::ProviderFailure {
                error: Some(e.to_string()),
            });
        }

        tracing::info!("OAuth authorization successful, exchanging code");
        let token = self
            .oauth
            .exchange_code(&code, &request.redirect_uri)
            .await?;
        tracing::info!(scope = ?token.scope, "Access token obtained");

        // Fetch before storing anything so a failed fetch leaves storage untouched
        let user = self.github.get_current_user(&token.access_token).await?;

        self.storage.store_access_token(&token.access_token).await?;
        self.storage.store_user_data(&user).await?;

        tracing::info!(
            login = %user.login,
            name = ?user.name,
            "Signed in, credentials stored"
        );

        Ok(AuthenticationResult::Success {
            user,
            access_token: token.access_token,
        })
    }

    fn check_state(&self, issued: &str, returned: Option<&str>) -> Result<(), StateError> {
        let returned = returned.ok_or(StateError::Malformed)?;

        if !bool::from(returned.as_bytes().ct_eq(issued.as_bytes())) {
            return Err(StateError::Mismatch);
        }

        self.state_signer.verify(returned)
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    /// Delete the stored token and profile.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        tracing::info!("Signing out user");
        self.storage.clear_auth_data().await?;
        tracing::info!("User signed out");
        Ok(())
    }

    /// Reconstruct the authentication status from storage.
    pub async fn get_auth_status(&self) -> AuthStatus {
        let (token, user) = tokio::join!(
            self.storage.get_access_token(),
            self.storage.get_user_data(),
        );

        AuthStatus {
            is_authenticated: token.as_ref().is_some_and(|t| !t.is_empty()),
            user,
            has_valid_token: token.is_some(),
        }
    }

    /// Re-fetch and store the profile. None on any failure.
    pub async fn refresh_user_data(&self) -> Option<GitHubUser> {
        match self.try_refresh_user_data().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh user data");
                None
            }
        }
    }

    async fn try_refresh_user_data(&self) -> Result<GitHubUser, AppError> {
        let token = self.stored_token().await?;
        let user = self.github.get_current_user(&token).await?;
        self.storage.store_user_data(&user).await?;
        Ok(user)
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// List the signed-in user's repositories.
    pub async fn list_repositories(
        &self,
        query: &RepositoryQuery,
    ) -> Result<Vec<GitHubRepository>, AppError> {
        let token = self.stored_token().await?;
        self.github.list_repositories(&token, query).await
    }

    /// Ask GitHub to invalidate the stored token.
    ///
    /// Returns false if no token was stored. Local storage is left as is.
    pub async fn revoke_access_token(&self) -> Result<bool, AppError> {
        match self.storage.get_access_token().await {
            Some(token) if !token.is_empty() => {
                self.oauth.revoke_token(&token).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stored_token(&self) -> Result<AccessToken, AppError> {
        self.storage
            .get_access_token()
            .await
            .filter(|t| !t.is_empty())
            .ok_or(AppError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use async_trait::async_trait;

    struct NeverPrompt;

    #[async_trait]
    impl AuthorizationPrompt for NeverPrompt {
        async fn prompt(&self, _: &AuthorizationRequest) -> Result<PromptResult, AppError> {
            Ok(PromptResult::Dismiss)
        }
    }

    fn service() -> GitHubAuthService {
        let storage = SecureStorage::new(Arc::new(MemoryCredentialStore::new()));
        GitHubAuthService::new(Config::default(), storage, Arc::new(NeverPrompt)).unwrap()
    }

    #[test]
    fn test_authorization_request() {
        let service = service();
        let request = service.authorization_request().unwrap();

        assert_eq!(request.client_id, "test_client_id");
        assert_eq!(request.scopes, vec!["repo", "user"]);
        assert_eq!(
            request.redirect_uri,
            "http://127.0.0.1:8765/auth/github/callback"
        );
        assert!(service.check_state(&request.state, Some(&request.state)).is_ok());
    }

    #[test]
    fn test_check_state_rejects_mismatch_and_missing() {
        let service = service();
        let first = service.authorization_request().unwrap();
        let second = service.authorization_request().unwrap();

        assert_eq!(
            service.check_state(&first.state, Some(&second.state)),
            Err(StateError::Mismatch)
        );
        assert_eq!(
            service.check_state(&first.state, None),
            Err(StateError::Malformed)
        );
    }

    #[test]
    fn test_revocation_url() {
        assert_eq!(
            service().revocation_url(),
            "https://github.com/settings/connections/applications/test_client_id"
        );
    }

    #[tokio::test]
    async fn test_list_repositories_requires_token() {
        let result = service().list_repositories(&RepositoryQuery::default()).await;
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }
}
