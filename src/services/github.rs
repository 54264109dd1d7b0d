// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub REST API client.
//!
//! Handles:
//! - Fetching the authenticated user profile
//! - Listing the user's repositories (paginated)
//!
//! Each call is stateless given a token. Non-2xx responses and transport
//! failures become `AppError::GitHubApi`; nothing is retried.

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{AccessToken, GitHubRepository, GitHubUser, RepositoryQuery};

/// Media type for the v3 REST API.
pub const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

pub const USER_ENDPOINT: &str = "/user";
pub const REPOS_ENDPOINT: &str = "/user/repos";

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl GitHubClient {
    /// Create a client rooted at `base_url` (api.github.com, GitHub
    /// Enterprise, tests).
    pub fn with_base_url(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the authenticated user's profile.
    pub async fn get_current_user(&self, token: &AccessToken) -> Result<GitHubUser, AppError> {
        let url = format!("{}{}", self.base_url, USER_ENDPOINT);
        tracing::debug!(url = %url, "Fetching GitHub user");

        let response = self.get(&url, token).send().await.map_err(network_error)?;

        let user: GitHubUser = self
            .check_response_json(response, "Failed to fetch user data")
            .await?;

        tracing::debug!(login = %user.login, "GitHub user received");
        Ok(user)
    }

    /// List repositories for the authenticated user (paginated).
    pub async fn list_repositories(
        &self,
        token: &AccessToken,
        query: &RepositoryQuery,
    ) -> Result<Vec<GitHubRepository>, AppError> {
        let url = format!("{}{}", self.base_url, REPOS_ENDPOINT);

        let response = self
            .get(&url, token)
            .query(&query.to_query_pairs())
            .send()
            .await
            .map_err(network_error)?;

        self.check_response_json(response, "Failed to fetch repositories")
            .await
    }

    fn get(&self, url: &str, token: &AccessToken) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(token.as_str())
            .header(ACCEPT, GITHUB_V3_MEDIA_TYPE)
            .header(USER_AGENT, &self.user_agent)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "GitHub API error");

            let reason = error_message(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            });
            return Err(AppError::GitHubApi(format!(
                "{}: {} {}",
                context,
                status.as_u16(),
                reason
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GitHubApi(format!("JSON parse error: {}", e)))
    }
}

/// GitHub error bodies look like `{"message": "Bad credentials", ...}`.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn network_error(e: reqwest::Error) -> AppError {
    tracing::error!(error = %e, "GitHub request failed");
    if e.is_connect() || e.is_timeout() {
        AppError::GitHubApi(
            "Network connectivity issue. Please check your internet connection.".to_string(),
        )
    } else {
        AppError::GitHubApi(e.to_string())
    }
}
