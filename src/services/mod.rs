// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod crypto;
pub mod github;
pub mod oauth;
pub mod prompt;
pub mod secure_storage;
pub mod session;

pub use auth::GitHubAuthService;
pub use crypto::{CryptoError, SecretCipher};
pub use github::GitHubClient;
pub use oauth::{AuthorizationRequest, OAuthClient, StateError, StateSigner};
pub use prompt::{AuthorizationPrompt, LoopbackPrompt, PromptResult};
pub use secure_storage::SecureStorage;
pub use session::AuthSession;
