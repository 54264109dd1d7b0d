// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory authentication session.
//!
//! Holds the current `AuthStatus` so callers do not hit storage on every
//! read, and keeps a signing-in flag so only one OAuth flow runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{AuthStatus, AuthenticationResult, GitHubUser};
use crate::services::auth::GitHubAuthService;

/// Shared session state in front of [`GitHubAuthService`].
#[derive(Clone)]
pub struct AuthSession {
    service: GitHubAuthService,
    status: Arc<RwLock<AuthStatus>>,
    signing_in: Arc<AtomicBool>,
}

/// Clears the signing-in flag when the flow ends, however it ends.
struct SigningInGuard<'a>(&'a AtomicBool);

impl Drop for SigningInGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AuthSession {
    /// Create a session in the signed-out state. Call [`reload`](Self::reload)
    /// to pick up stored credentials.
    pub fn new(service: GitHubAuthService) -> Self {
        Self {
            service,
            status: Arc::new(RwLock::new(AuthStatus::signed_out())),
            signing_in: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn service(&self) -> &GitHubAuthService {
        &self.service
    }

    /// Restore the session from storage.
    pub async fn reload(&self) -> AuthStatus {
        let status = self.service.get_auth_status().await;
        *self.status.write().await = status.clone();
        status
    }

    pub async fn status(&self) -> AuthStatus {
        self.status.read().await.clone()
    }

    pub fn is_signing_in(&self) -> bool {
        self.signing_in.load(Ordering::Acquire)
    }

    /// Run the sign-in flow unless one is already in progress.
    pub async fn sign_in(&self) -> AuthenticationResult {
        if self
            .signing_in
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Sign-in already in progress");
            return AuthenticationResult::Error {
                kind: crate::models::AuthErrorKind::AuthError,
                message: "A sign-in is already in progress".to_string(),
            };
        }
        let _guard = SigningInGuard(&self.signing_in);

        let result = self.service.sign_in().await;

        if let AuthenticationResult::Success { user, .. } = &result {
            *self.status.write().await = AuthStatus {
                is_authenticated: true,
                user: Some(user.clone()),
                has_valid_token: true,
            };
        }

        result
    }

    /// Sign out and reset the in-memory status.
    ///
    /// The status is reset even if clearing storage fails, so the app never
    /// shows a signed-in user after an explicit sign-out.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let result = self.service.sign_out().await;
        *self.status.write().await = AuthStatus::signed_out();
        result
    }

    /// Re-fetch the profile and update the cached status on success.
    pub async fn refresh_user(&self) -> Option<GitHubUser> {
        let user = self.service.refresh_user_data().await?;
        self.status.write().await.user = Some(user.clone());
        Some(user)
    }
}
