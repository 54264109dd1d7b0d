// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::AuthErrorKind;
use crate::store::StoreError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Authentication(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap a store failure with a short description of what was attempted.
    pub fn storage(context: impl Into<String>, source: StoreError) -> Self {
        AppError::Storage {
            context: context.into(),
            source,
        }
    }

    /// Category reported to the user for a failed sign-in.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AppError::GitHubApi(_) => AuthErrorKind::ApiError,
            AppError::Storage { .. } => AuthErrorKind::StorageError,
            AppError::Authentication(_) => AuthErrorKind::AuthError,
            _ => AuthErrorKind::UnknownError,
        }
    }

    /// Message safe to show to an end user. Causes stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Authentication(msg) => msg.clone(),
            _ => self.kind().default_message().to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            other => {
                tracing::error!(error = %other, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
