// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth redirect handler.
//!
//! Receives the browser redirect once and hands the parameters to the
//! waiting sign-in prompt.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{oneshot, Mutex};

use crate::config::CALLBACK_PATH;
use crate::error::{AppError, Result};

pub fn routes() -> Router<Arc<CallbackState>> {
    Router::new().route(CALLBACK_PATH, get(auth_callback))
}

/// Query parameters GitHub appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Shared state: the one-shot channel back to the prompt and the `state`
/// value the redirect must carry.
pub struct CallbackState {
    sender: Mutex<Option<oneshot::Sender<CallbackParams>>>,
    expected_state: String,
}

impl CallbackState {
    pub fn new(sender: oneshot::Sender<CallbackParams>, expected_state: String) -> Arc<Self> {
        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            expected_state,
        })
    }

    fn state_matches(&self, returned: Option<&str>) -> bool {
        returned.is_some_and(|s| bool::from(s.as_bytes().ct_eq(self.expected_state.as_bytes())))
    }
}

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Noir - Signed in</title></head>
<body>
    <h1>You're signed in</h1>
    <p>You can close this window and return to Noir.</p>
</body>
</html>
"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Noir - Sign-in not completed</title></head>
<body>
    <h1>Sign-in was not completed</h1>
    <p>You can close this window and return to Noir.</p>
</body>
</html>
"#;

/// OAuth callback - forward code or error to the prompt.
///
/// Requests without the issued `state` are rejected and leave the prompt
/// waiting for the real redirect.
async fn auth_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<&'static str>> {
    if params.code.is_none() && params.error.is_none() {
        return Err(AppError::BadRequest(
            "Missing code or error parameter".to_string(),
        ));
    }

    if !state.state_matches(params.state.as_deref()) {
        tracing::warn!("Ignoring callback with unknown state");
        return Err(AppError::BadRequest("Unknown state".to_string()));
    }

    let sender = state
        .sender
        .lock()
        .await
        .take()
        .ok_or_else(|| AppError::BadRequest("Sign-in already completed".to_string()))?;

    let page = if params.error.is_some() {
        tracing::warn!(error = ?params.error, "GitHub redirected with an error");
        FAILURE_PAGE
    } else {
        tracing::info!("Received GitHub authorization redirect");
        SUCCESS_PAGE
    };

    if sender.send(params).is_err() {
        tracing::warn!("Sign-in prompt stopped waiting before the redirect arrived");
    }

    Ok(Html(page))
}
