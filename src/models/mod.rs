// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod auth;
pub mod repository;
pub mod user;

pub use auth::{AccessToken, AuthErrorKind, AuthStatus, AuthenticationResult};
pub use repository::{
    GitHubRepository, RepositoryQuery, RepositorySort, RepositoryVisibility, SortDirection,
};
pub use user::GitHubUser;
