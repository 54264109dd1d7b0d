//! GitHub user model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the authenticated GitHub account (`GET /user`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    /// GitHub account ID
    pub id: u64,
    /// Username
    pub login: String,
    /// Display name (may be None if not set)
    pub name: Option<String>,
    /// Public email (may be None if not shared)
    pub email: Option<String>,
    /// Profile picture URL
    pub avatar_url: String,
    /// Profile page URL
    pub html_url: String,
    pub bio: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GitHubUser {
    /// Name to greet the user with: display name, else login.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{
        "login": "octocat",
        "id": 583231,
        "node_id": "MDQ6VXNlcjU4MzIzMQ==",
        "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
        "html_url": "https://github.com/octocat",
        "type": "User",
        "site_admin": false,
        "name": "The Octocat",
        "company": "@github",
        "blog": "https://github.blog",
        "location": "San Francisco",
        "email": null,
        "bio": null,
        "public_repos": 8,
        "public_gists": 8,
        "followers": 17802,
        "following": 9,
        "created_at": "2011-01-25T18:44:36Z",
        "updated_at": "2024-01-22T12:12:58Z"
    }"#;

    #[test]
    fn test_deserialize_github_user() {
        let user: GitHubUser = serde_json::from_str(USER_JSON).unwrap();
        assert_eq!(user.id, 583231);
        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert_eq!(user.email, None);
        assert_eq!(user.followers, 17802);
        assert_eq!(user.created_at.to_rfc3339(), "2011-01-25T18:44:36+00:00");
    }

    #[test]
    fn test_display_name_falls_back_to_login() {
        let mut user: GitHubUser = serde_json::from_str(USER_JSON).unwrap();
        assert_eq!(user.display_name(), "The Octocat");

        user.name = None;
        assert_eq!(user.display_name(), "octocat");

        user.name = Some("  ".to_string());
        assert_eq!(user.display_name(), "octocat");
    }
}
