// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication state and sign-in outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GitHubUser;

/// Opaque GitHub bearer token. Never parsed; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Authentication status derived from storage on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthStatus {
    /// A non-empty token is stored
    pub is_authenticated: bool,
    /// Stored profile, if any
    pub user: Option<GitHubUser>,
    /// A token entry exists
    pub has_valid_token: bool,
}

impl AuthStatus {
    pub fn signed_out() -> Self {
        Self::default()
    }
}

/// Category of a failed sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorKind {
    UserCancelled,
    AuthFailed,
    ApiError,
    StorageError,
    AuthError,
    UnknownError,
}

impl AuthErrorKind {
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::UserCancelled => "Authentication was cancelled by user",
            Self::AuthFailed => "Authentication failed",
            Self::ApiError => "Failed to fetch user information from GitHub",
            Self::StorageError => "Failed to store authentication data securely",
            Self::AuthError => "Authentication error",
            Self::UnknownError => "An unexpected error occurred during authentication",
        }
    }
}

/// Outcome of an interactive sign-in.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationResult {
    /// Token exchanged, profile fetched, both persisted.
    Success {
        user: GitHubUser,
        access_token: AccessToken,
    },
    /// The user dismissed or denied the authorization prompt.
    Cancelled,
    /// The provider reported an error or returned an unusable redirect.
    ProviderFailure { error: Option<String> },
    /// A later step failed; `message` is safe to show to the user.
    Error { kind: AuthErrorKind, message: String },
}

impl AuthenticationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Cancelled => Some(AuthErrorKind::UserCancelled),
            Self::ProviderFailure { .. } => Some(AuthErrorKind::AuthFailed),
            Self::Error { kind, .. } => Some(*kind),
        }
    }

    /// User-facing message for a failed sign-in.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message, .. } => Some(message),
            other => other.error_kind().map(|kind| kind.default_message()),
        }
    }
}
