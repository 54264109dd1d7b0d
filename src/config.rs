//! Application configuration loaded from environment variables.
//!
//! The GitHub client credentials can also be baked in at build time; the
//! runtime environment (and `.env`) always wins over the compiled-in value.

use std::env;
use std::path::PathBuf;

/// Default OAuth scopes requested from GitHub.
pub const DEFAULT_SCOPES: &[&str] = &["repo", "user"];

/// Path on the loopback server that GitHub redirects back to.
pub const CALLBACK_PATH: &str = "/auth/github/callback";

/// Fixed set of GitHub OAuth endpoints (the discovery document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revocation_endpoint: String,
}

impl OAuthEndpoints {
    /// Endpoints on github.com.
    pub fn github(client_id: &str) -> Self {
        Self::with_base("https://github.com", client_id)
    }

    /// Endpoints rooted at an arbitrary base URL (GitHub Enterprise, tests).
    pub fn with_base(base_url: &str, client_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            authorization_endpoint: format!("{}/login/oauth/authorize", base),
            token_endpoint: format!("{}/login/oauth/access_token", base),
            revocation_endpoint: format!("{}/settings/connections/applications/{}", base, client_id),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- GitHub OAuth app ---
    /// GitHub OAuth client ID (public)
    pub github_client_id: String,
    /// GitHub OAuth client secret
    pub github_client_secret: String,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
    /// OAuth discovery endpoints
    pub oauth: OAuthEndpoints,
    /// GitHub REST API base URL
    pub api_base_url: String,

    // --- App ---
    /// Display name, also sent as the User-Agent
    pub app_name: String,
    /// URL scheme of the app; namespaces the data directory
    pub app_scheme: String,
    /// Loopback port registered as the OAuth callback
    pub callback_port: u16,
    /// How long the sign-in prompt waits for the browser redirect
    pub prompt_timeout_secs: u64,
    /// Directory holding the credential store
    pub data_dir: PathBuf,
    /// Optional passphrase for the credential store key
    pub store_key: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            github_client_id: "test_client_id".to_string(),
            github_client_secret: "test_secret".to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            oauth: OAuthEndpoints::github("test_client_id"),
            api_base_url: "https://api.github.com".to_string(),
            app_name: "Noir".to_string(),
            app_scheme: "noir".to_string(),
            callback_port: 8765,
            prompt_timeout_secs: 300,
            data_dir: env::temp_dir().join("noir-test"),
            store_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let github_client_id = env::var("GITHUB_CLIENT_ID")
            .ok()
            .or_else(|| option_env!("GITHUB_CLIENT_ID").map(str::to_string))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("GITHUB_CLIENT_ID"))?;

        let github_client_secret = env::var("GITHUB_CLIENT_SECRET")
            .ok()
            .or_else(|| option_env!("GITHUB_CLIENT_SECRET").map(str::to_string))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("GITHUB_CLIENT_SECRET"))?;

        let scopes = match env::var("GITHUB_SCOPES") {
            Ok(raw) => parse_scopes(&raw),
            Err(_) => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        let oauth_base =
            env::var("GITHUB_OAUTH_URL").unwrap_or_else(|_| "https://github.com".to_string());

        let app_scheme = env::var("NOIR_APP_SCHEME").unwrap_or_else(|_| "noir".to_string());

        let callback_port = parse_var("NOIR_CALLBACK_PORT", 8765)?;
        let prompt_timeout_secs = parse_var("NOIR_PROMPT_TIMEOUT_SECS", 300)?;

        let data_dir = match env::var("NOIR_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(&app_scheme),
        };

        Ok(Self {
            oauth: OAuthEndpoints::with_base(&oauth_base, &github_client_id),
            github_client_id,
            github_client_secret,
            scopes,
            api_base_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            app_name: env::var("NOIR_APP_NAME").unwrap_or_else(|_| "Noir".to_string()),
            app_scheme,
            callback_port,
            prompt_timeout_secs,
            data_dir,
            store_key: env::var("NOIR_STORE_KEY").ok().filter(|k| !k.is_empty()),
        })
    }

    /// Redirect URI registered with the GitHub OAuth app.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.callback_port, CALLBACK_PATH)
    }
}

/// Split a comma or space separated scope list.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
