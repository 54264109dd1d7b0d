// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: a local stand-in for GitHub, a scripted sign-in
//! prompt, and a credential store that fails on demand.

use async_trait::async_trait;
use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use noir_auth::config::{Config, OAuthEndpoints};
use noir_auth::error::AppError;
use noir_auth::services::{AuthorizationPrompt, AuthorizationRequest, PromptResult};
use noir_auth::store::{CredentialStore, MemoryCredentialStore, StoreError};
use noir_auth::{GitHubAuthService, SecureStorage};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_TOKEN: &str = "gho_test_token_123";
pub const TEST_CODE: &str = "auth_code_abc";

/// Profile returned by the mock `GET /user`.
#[allow(dead_code)]
pub fn sample_user_json() -> Value {
    json!({
        "id": 583231,
        "login": "octocat",
        "name": "The Octocat",
        "email": null,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
        "html_url": "https://github.com/octocat",
        "bio": null,
        "public_repos": 8,
        "followers": 9000,
        "following": 9,
        "created_at": "2011-01-25T18:44:36Z",
        "updated_at": "2024-01-22T12:00:00Z"
    })
}

#[allow(dead_code)]
pub fn sample_repo_json(id: u64, name: &str, private: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("octocat/{}", name),
        "description": null,
        "private": private,
        "html_url": format!("https://github.com/octocat/{}", name),
        "clone_url": format!("https://github.com/octocat/{}.git", name),
        "ssh_url": format!("git@github.com:octocat/{}.git", name),
        "default_branch": "main",
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "pushed_at": null,
        "stargazers_count": 1,
        "watchers_count": 1,
        "forks_count": 0,
        "language": "Markdown"
    })
}

// ─── Mock GitHub ─────────────────────────────────────────────────────────────

/// Recorded traffic and canned responses for the mock server.
pub struct MockState {
    pub token_requests: AtomicUsize,
    pub user_requests: AtomicUsize,
    pub repo_requests: AtomicUsize,
    pub revoke_requests: AtomicUsize,

    pub token_response: Mutex<Value>,
    pub user_status: Mutex<StatusCode>,
    pub revoke_status: Mutex<StatusCode>,

    pub last_token_form: Mutex<Option<HashMap<String, String>>>,
    pub last_authorization: Mutex<Option<String>>,
    pub last_repo_query: Mutex<Option<HashMap<String, String>>>,
    pub last_revoke_client: Mutex<Option<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            token_requests: AtomicUsize::new(0),
            user_requests: AtomicUsize::new(0),
            repo_requests: AtomicUsize::new(0),
            revoke_requests: AtomicUsize::new(0),
            token_response: Mutex::new(json!({
                "access_token": TEST_TOKEN,
                "token_type": "bearer",
                "scope": "repo,user"
            })),
            user_status: Mutex::new(StatusCode::OK),
            revoke_status: Mutex::new(StatusCode::NO_CONTENT),
            last_token_form: Mutex::new(None),
            last_authorization: Mutex::new(None),
            last_repo_query: Mutex::new(None),
            last_revoke_client: Mutex::new(None),
        }
    }
}

#[allow(dead_code)]
impl MockState {
    pub fn set_token_response(&self, value: Value) {
        *self.token_response.lock().unwrap() = value;
    }

    pub fn set_user_status(&self, status: StatusCode) {
        *self.user_status.lock().unwrap() = status;
    }

    pub fn set_revoke_status(&self, status: StatusCode) {
        *self.revoke_status.lock().unwrap() = status;
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn user_requests(&self) -> usize {
        self.user_requests.load(Ordering::SeqCst)
    }

    pub fn repo_requests(&self) -> usize {
        self.repo_requests.load(Ordering::SeqCst)
    }

    pub fn revoke_requests(&self) -> usize {
        self.revoke_requests.load(Ordering::SeqCst)
    }
}

/// GitHub's OAuth and REST endpoints served from 127.0.0.1.
pub struct MockGitHub {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockGitHub {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/login/oauth/access_token", post(token_handler))
            .route("/user", get(user_handler))
            .route("/user/repos", get(repos_handler))
            .route("/applications/{client_id}/token", delete(revoke_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock GitHub");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Config with every GitHub URL pointed at this server.
    pub fn config(&self) -> Config {
        Config {
            oauth: OAuthEndpoints::with_base(&self.base_url, "test_client_id"),
            api_base_url: self.base_url.clone(),
            ..Config::default()
        }
    }
}

async fn token_handler(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock().unwrap() = Some(form);
    Json(state.token_response.lock().unwrap().clone())
}

async fn user_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.user_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let status = *state.user_status.lock().unwrap();
    if status.is_success() {
        Json(sample_user_json()).into_response()
    } else {
        (
            status,
            Json(json!({
                "message": "Bad credentials",
                "documentation_url": "https://docs.github.com/rest"
            })),
        )
            .into_response()
    }
}

async fn repos_handler(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.repo_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_repo_query.lock().unwrap() = Some(query);
    Json(json!([
        sample_repo_json(1, "notes", true),
        sample_repo_json(2, "Hello-World", false),
    ]))
}

async fn revoke_handler(
    State(state): State<Arc<MockState>>,
    Path(client_id): Path<String>,
) -> StatusCode {
    state.revoke_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_revoke_client.lock().unwrap() = Some(client_id);
    *state.revoke_status.lock().unwrap()
}

// ─── Scripted prompt ─────────────────────────────────────────────────────────

/// What the fake user does when shown the consent page.
#[allow(dead_code)]
#[derive(Clone)]
pub enum Script {
    /// Approve; the redirect echoes the issued state.
    Approve,
    /// Approve, but the redirect carries this state instead.
    ApproveWithState(Option<String>),
    /// Deny on the consent page; the redirect echoes the issued state.
    Cancel,
    /// Deny, but the redirect carries this state instead.
    CancelWithState(Option<String>),
    Dismiss,
    ProviderError(String),
    /// The prompt itself fails.
    Fail,
}

pub struct ScriptedPrompt {
    script: Script,
    pub requests: Mutex<Vec<AuthorizationRequest>>,
}

#[allow(dead_code)]
impl ScriptedPrompt {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> Option<AuthorizationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AuthorizationPrompt for ScriptedPrompt {
    async fn prompt(&self, request: &AuthorizationRequest) -> Result<PromptResult, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        Ok(match &self.script {
            Script::Approve => PromptResult::Success {
                code: TEST_CODE.to_string(),
                state: Some(request.state.clone()),
            },
            Script::ApproveWithState(state) => PromptResult::Success {
                code: TEST_CODE.to_string(),
                state: state.clone(),
            },
            Script::Cancel => PromptResult::Cancel {
                state: Some(request.state.clone()),
            },
            Script::CancelWithState(state) => PromptResult::Cancel {
                state: state.clone(),
            },
            Script::Dismiss => PromptResult::Dismiss,
            Script::ProviderError(error) => PromptResult::Error {
                error: error.clone(),
                description: None,
            },
            Script::Fail => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "callback server could not start"
                )))
            }
        })
    }
}

// ─── Failing store ───────────────────────────────────────────────────────────

/// Memory store that fails selected operations.
#[derive(Clone, Default)]
pub struct FailingStore {
    pub inner: MemoryCredentialStore,
    pub fail_set: Option<&'static str>,
    pub fail_delete: bool,
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("keychain locked".to_string())
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_set == Some(key) {
            return Err(unavailable());
        }
        self.inner.set_item(key, value).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_item(key).await
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_delete {
            return Err(unavailable());
        }
        self.inner.delete_item(key).await
    }
}

// ─── Builders ────────────────────────────────────────────────────────────────

/// Service backed by the mock server and a fresh in-memory store.
#[allow(dead_code)]
pub fn create_test_service(
    mock: &MockGitHub,
    prompt: Arc<dyn AuthorizationPrompt>,
) -> (GitHubAuthService, MemoryCredentialStore) {
    let store = MemoryCredentialStore::new();
    let service = create_service_with_store(mock, prompt, Arc::new(store.clone()));
    (service, store)
}

#[allow(dead_code)]
pub fn create_service_with_store(
    mock: &MockGitHub,
    prompt: Arc<dyn AuthorizationPrompt>,
    store: Arc<dyn CredentialStore>,
) -> GitHubAuthService {
    GitHubAuthService::new(mock.config(), SecureStorage::new(store), prompt)
        .expect("Failed to create auth service")
}
