// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth 2.0 authorization-code grant.
//!
//! Builds the authorization request, signs and verifies the `state`
//! parameter, exchanges the returned code for a bearer token, and revokes
//! tokens on request.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::{Config, OAuthEndpoints};
use crate::error::AppError;
use crate::models::AccessToken;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long an issued `state` stays acceptable.
pub const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

// ─────────────────────────────────────────────────────────────────────────────
// Authorization request
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the prompt needs to send the user to GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub authorization_endpoint: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub state: String,
}

impl AuthorizationRequest {
    /// Full authorization URL with `response_type=code`.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            self.authorization_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
            urlencoding::encode(&self.state)
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signed state
// ─────────────────────────────────────────────────────────────────────────────

/// Why a returned `state` was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state parameter is malformed")]
    Malformed,
    #[error("state signature mismatch")]
    BadSignature,
    #[error("state has expired")]
    Expired,
    #[error("state does not match the issued request")]
    Mismatch,
}

/// Issues and verifies HMAC-signed OAuth `state` values.
///
/// Format before encoding: `nonce_hex|timestamp_hex|signature_hex`,
/// then URL-safe base64 without padding.
#[derive(Clone)]
pub struct StateSigner {
    key: Vec<u8>,
    rng: SystemRandom,
}

impl StateSigner {
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: key.to_vec(),
            rng: SystemRandom::new(),
        }
    }

    /// Signer with a fresh random key, valid for this process only.
    pub fn random() -> Result<Self, AppError> {
        let rng = SystemRandom::new();
        let mut key = [0u8; 32];
        rng.fill(&mut key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate state key")))?;
        Ok(Self::new(&key))
    }

    /// Issue a new state value.
    pub fn issue(&self) -> Result<String, AppError> {
        let mut nonce = [0u8; 16];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate state nonce")))?;

        self.sign(&hex::encode(nonce), chrono::Utc::now().timestamp_millis())
    }

    fn sign(&self, nonce_hex: &str, timestamp_ms: i64) -> Result<String, AppError> {
        // Create the data payload: "nonce|timestamp_hex"
        let payload = format!("{}|{:x}", nonce_hex, timestamp_ms);

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        let signed = format!("{}|{}", payload, hex::encode(signature));
        Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
    }

    /// Verify signature and age of a returned state.
    pub fn verify(&self, state: &str) -> Result<(), StateError> {
        self.verify_at(state, chrono::Utc::now().timestamp_millis())
    }

    fn verify_at(&self, state: &str, now_ms: i64) -> Result<(), StateError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(state)
            .map_err(|_| StateError::Malformed)?;
        let state_str = String::from_utf8(bytes).map_err(|_| StateError::Malformed)?;

        let parts: Vec<&str> = state_str.splitn(3, '|').collect();
        if parts.len() != 3 {
            return Err(StateError::Malformed);
        }

        let (nonce_hex, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2]);
        let signature = hex::decode(signature_hex).map_err(|_| StateError::Malformed)?;

        let payload = format!("{}|{}", nonce_hex, timestamp_hex);
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| StateError::BadSignature)?;
        mac.update(payload.as_bytes());

        if mac.verify_slice(&signature).is_err() {
            tracing::error!("OAuth state signature mismatch! Potential tampering.");
            return Err(StateError::BadSignature);
        }

        let issued_ms = i64::from_str_radix(timestamp_hex, 16).map_err(|_| StateError::Malformed)?;
        if now_ms - issued_ms > STATE_MAX_AGE_MS || issued_ms > now_ms {
            return Err(StateError::Expired);
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// Successful token exchange.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// GitHub answers 200 with either a token or an `error` field.
#[derive(Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the OAuth token and revocation endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    endpoints: OAuthEndpoints,
    client_id: String,
    client_secret: String,
    api_base_url: String,
    user_agent: String,
}

impl OAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints: config.oauth.clone(),
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            user_agent: config.app_name.clone(),
        }
    }

    pub fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "GitHub token exchange failed");
            return Err(AppError::OAuth(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let raw: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::OAuth(format!("Failed to parse token response: {}", e)))?;

        if let Some(error) = raw.error {
            let description = raw.error_description.unwrap_or_default();
            tracing::warn!(error = %error, description = %description, "GitHub rejected authorization code");
            return Err(AppError::OAuth(format!("{}: {}", error, description)));
        }

        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Authentication("No access token received from GitHub".to_string())
            })?;

        Ok(TokenResponse {
            access_token: AccessToken::new(access_token),
            token_type: raw.token_type,
            scope: raw.scope,
        })
    }

    /// Revoke an access token for this OAuth app.
    ///
    /// DELETE /applications/{client_id}/token
    /// Authorization: Basic client_id:client_secret
    ///
    /// A token GitHub no longer knows (404) counts as revoked.
    pub async fn revoke_token(&self, token: &AccessToken) -> Result<(), AppError> {
        let url = format!(
            "{}/applications/{}/token",
            self.api_base_url,
            urlencoding::encode(&self.client_id)
        );

        let response = self
            .http
            .delete(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::ACCEPT, crate::services::github::GITHUB_V3_MEDIA_TYPE)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .json(&serde_json::json!({ "access_token": token.as_str() }))
            .send()
            .await
            .map_err(|e| AppError::GitHubApi(format!("Token revocation request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(status = %status, "GitHub token revoked");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "GitHub token revocation failed");
        Err(AppError::GitHubApi(format!(
            "Failed to revoke token: {}",
            status.as_u16()
        )))
    }
}
