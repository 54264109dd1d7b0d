// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Noir: GitHub sign-in for the Noir notes app
//!
//! This crate provides the GitHub OAuth authorization-code flow, secure
//! storage of the resulting token and profile, and a thin client for the
//! GitHub REST API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{AuthSession, GitHubAuthService, SecureStorage};
