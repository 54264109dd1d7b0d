// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Noir GitHub sign-in CLI
//!
//! Signs the Noir notes app into GitHub, shows who is signed in, and lists
//! the repositories notes can sync to.

use anyhow::Context;
use clap::{Parser, Subcommand};
use noir_auth::{
    config::Config,
    models::{
        AuthenticationResult, RepositoryQuery, RepositorySort, RepositoryVisibility,
        SortDirection,
    },
    services::LoopbackPrompt,
    store::FileCredentialStore,
    AuthSession, GitHubAuthService, SecureStorage,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sign Noir into GitHub
#[derive(Parser, Debug)]
#[command(name = "noir", version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with GitHub in the browser
    Login,

    /// Delete the stored token and profile
    Logout {
        /// Also ask GitHub to revoke the token
        #[arg(long)]
        revoke: bool,
    },

    /// Show the current sign-in status
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Re-fetch the GitHub profile
    Refresh,

    /// List repositories of the signed-in user
    Repos {
        #[arg(long, default_value_t = RepositoryVisibility::All)]
        visibility: RepositoryVisibility,

        #[arg(long, default_value_t = RepositorySort::Updated)]
        sort: RepositorySort,

        #[arg(long, default_value_t = SortDirection::Desc)]
        direction: SortDirection,

        #[arg(long, default_value_t = 30)]
        per_page: u32,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.verbose);

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        api = %config.api_base_url,
        "Configuration loaded"
    );

    let store = FileCredentialStore::open_default(&config)
        .await
        .context("Failed to open credential store")?;
    let storage = SecureStorage::new(Arc::new(store));
    let prompt = Arc::new(LoopbackPrompt::from_config(&config));
    let session = AuthSession::new(GitHubAuthService::new(config, storage, prompt)?);

    match cli.command {
        Command::Login => login(&session).await,
        Command::Logout { revoke } => logout(&session, revoke).await,
        Command::Status { json } => status(&session, json).await,
        Command::Refresh => refresh(&session).await,
        Command::Repos {
            visibility,
            sort,
            direction,
            per_page,
            page,
            json,
        } => {
            let query = RepositoryQuery {
                visibility,
                sort,
                direction,
                per_page,
                page,
            };
            repos(&session, &query, json).await
        }
    }
}

async fn login(session: &AuthSession) -> anyhow::Result<ExitCode> {
    match session.sign_in().await {
        AuthenticationResult::Success { user, .. } => {
            println!(
                "Welcome {}! You can now sync your notes with GitHub.",
                user.display_name()
            );
            Ok(ExitCode::SUCCESS)
        }
        AuthenticationResult::Cancelled => {
            eprintln!("Authentication was cancelled.");
            Ok(ExitCode::FAILURE)
        }
        AuthenticationResult::ProviderFailure { error } => {
            match error {
                Some(e) => eprintln!("Authentication failed: {}", e),
                None => eprintln!("Authentication failed."),
            }
            Ok(ExitCode::FAILURE)
        }
        AuthenticationResult::Error { message, .. } => {
            eprintln!("Sign in failed: {}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn logout(session: &AuthSession, revoke: bool) -> anyhow::Result<ExitCode> {
    if revoke {
        match session.service().revoke_access_token().await {
            Ok(true) => println!("Token revoked on GitHub."),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Token revocation failed");
                eprintln!(
                    "Could not revoke the token. Revoke it manually at {}",
                    session.service().revocation_url()
                );
            }
        }
    }

    session.sign_out().await?;
    println!("Signed out.");
    Ok(ExitCode::SUCCESS)
}

async fn status(session: &AuthSession, json: bool) -> anyhow::Result<ExitCode> {
    let status = session.reload().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(ExitCode::SUCCESS);
    }

    match (&status.user, status.is_authenticated) {
        (Some(user), true) => {
            println!("Signed in as {} ({})", user.display_name(), user.login);
            println!("   Profile: {}", user.html_url);
        }
        (None, true) => println!("Signed in (no profile stored, run `noir refresh`)"),
        (_, false) => println!("Not signed in"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn refresh(session: &AuthSession) -> anyhow::Result<ExitCode> {
    match session.refresh_user().await {
        Some(user) => {
            println!(
                "Profile refreshed: {} ({} public repos)",
                user.display_name(),
                user.public_repos
            );
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Could not refresh profile. Are you signed in?");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn repos(
    session: &AuthSession,
    query: &RepositoryQuery,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let repos = session.service().list_repositories(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&repos)?);
        return Ok(ExitCode::SUCCESS);
    }

    for repo in &repos {
        let visibility = if repo.private { "private" } else { "public" };
        match &repo.description {
            Some(desc) => println!("{:<40} {:<8} {}", repo.full_name, visibility, desc),
            None => println!("{:<40} {}", repo.full_name, visibility),
        }
    }
    tracing::debug!(count = repos.len(), page = query.page, "Listed repositories");
    Ok(ExitCode::SUCCESS)
}

/// Initialize logging on stderr. JSON lines when requested, compact text
/// otherwise; `RUST_LOG` overrides the default level.
fn init_logging(json: bool, verbose: bool) {
    let default = if verbose {
        "noir_auth=debug,noir=debug,info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
