// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive authorization prompt.
//!
//! The prompt sends the user to GitHub and suspends until the browser comes
//! back to the redirect URI, the user gives up, or the wait times out.

use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::error::AppError;
use crate::routes::{self, CallbackParams, CallbackState};
use crate::services::oauth::AuthorizationRequest;

/// GitHub's error code when the user clicks "Cancel" on the consent page.
const ACCESS_DENIED: &str = "access_denied";

/// How long to wait for the callback server to finish its last response.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// What came back from the authorization prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// Redirect carried an authorization code.
    Success { code: String, state: Option<String> },
    /// User declined on the consent page.
    Cancel { state: Option<String> },
    /// User abandoned the prompt (interrupt, timeout, closed channel).
    Dismiss,
    /// Provider reported an error.
    Error {
        error: String,
        description: Option<String>,
    },
}

impl From<CallbackParams> for PromptResult {
    fn from(params: CallbackParams) -> Self {
        match (params.code, params.error) {
            (_, Some(error)) if error == ACCESS_DENIED => PromptResult::Cancel {
                state: params.state,
            },
            (_, Some(error)) => PromptResult::Error {
                error,
                description: params.error_description,
            },
            (Some(code), None) => PromptResult::Success {
                code,
                state: params.state,
            },
            (None, None) => PromptResult::Error {
                error: "missing_code".to_string(),
                description: None,
            },
        }
    }
}

/// Presents an authorization request to the user.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn prompt(&self, request: &AuthorizationRequest) -> Result<PromptResult, AppError>;
}

/// Prompt that opens the system browser and listens on a loopback port
/// for GitHub's redirect.
#[derive(Debug, Clone)]
pub struct LoopbackPrompt {
    bind_addr: SocketAddr,
    timeout: Duration,
    open_browser: bool,
}

impl LoopbackPrompt {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            timeout,
            open_browser: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.callback_port,
            Duration::from_secs(config.prompt_timeout_secs),
        )
    }

    /// Only print the URL; do not launch a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    fn present(&self, url: &str) {
        eprintln!("Open this URL in your browser to sign in with GitHub:");
        eprintln!("   {}", url);
        eprintln!();
        eprintln!(
            "Waiting for GitHub to redirect back on port {}...",
            self.bind_addr.port()
        );

        if self.open_browser {
            if let Err(e) = webbrowser::open(url) {
                tracing::warn!(error = %e, "Could not open browser automatically");
            }
        }
    }
}

#[async_trait]
impl AuthorizationPrompt for LoopbackPrompt {
    async fn prompt(&self, request: &AuthorizationRequest) -> Result<PromptResult, AppError> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to bind callback server on {}: {}",
                    self.bind_addr,
                    e
                ))
            })?;

        let (params_tx, params_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = routes::create_router(CallbackState::new(params_tx, request.state.clone()));

        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(address = %self.bind_addr, "Callback server listening");
        self.present(&request.authorization_url());

        let result = tokio::select! {
            received = tokio::time::timeout(self.timeout, params_rx) => match received {
                Ok(Ok(params)) => PromptResult::from(params),
                Ok(Err(_)) => PromptResult::Dismiss,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.timeout.as_secs(),
                        "Timed out waiting for GitHub redirect"
                    );
                    PromptResult::Dismiss
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Sign-in interrupted");
                PromptResult::Dismiss
            }
        };

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Callback server error"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Callback server task failed"),
            Err(_) => server.abort(),
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: Some("s".to_string()),
            error: error.map(str::to_string),
            error_description: error.map(|_| "details".to_string()),
        }
    }

    #[test]
    fn test_code_is_success() {
        assert_eq!(
            PromptResult::from(params(Some("abc"), None)),
            PromptResult::Success {
                code: "abc".to_string(),
                state: Some("s".to_string())
            }
        );
    }

    #[test]
    fn test_access_denied_is_cancel() {
        assert_eq!(
            PromptResult::from(params(None, Some("access_denied"))),
            PromptResult::Cancel {
                state: Some("s".to_string())
            }
        );
    }

    #[test]
    fn test_other_error_is_error() {
        assert_eq!(
            PromptResult::from(params(Some("abc"), Some("redirect_uri_mismatch"))),
            PromptResult::Error {
                error: "redirect_uri_mismatch".to_string(),
                description: Some("details".to_string())
            }
        );
    }

    #[test]
    fn test_empty_redirect_is_error() {
        assert!(matches!(
            PromptResult::from(CallbackParams::default()),
            PromptResult::Error { .. }
        ));
    }
}
