//! securita-admin - command-line client for the Securita admin API
//!
//! Drives the same workflow functions as the browser console, so every
//! console operation can be scripted or checked against a backend without
//! a browser.

mod client;
mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use shared::{ApiClientConfig, ApiError, AuthMode, ConsoleFeatures, SessionStore};

use client::NativeApiClient;
use config::FileSessionStore;

const DEFAULT_SERVER: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "securita-admin")]
#[command(about = "Manage Securita organizations, users, groups and sessions", long_about = None)]
struct Cli {
    /// Server URL (defaults to the one used at login)
    #[arg(short, long, env = "SECURITA_SERVER")]
    server: Option<String>,

    /// Bearer token, overriding the stored session
    #[arg(short, long, env = "SECURITA_TOKEN")]
    token: Option<String>,

    /// How the session credential is sent
    #[arg(long, env = "SECURITA_AUTH_MODE")]
    auth_mode: Option<AuthModeArg>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum AuthModeArg {
    Cookie,
    Bearer,
}

impl From<AuthModeArg> for AuthMode {
    fn from(arg: AuthModeArg) -> Self {
        match arg {
            AuthModeArg::Cookie => AuthMode::Cookie,
            AuthModeArg::Bearer => AuthMode::Bearer,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in (prompts for the MFA code when required)
    Login {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "SECURITA_PASSWORD")]
        password: Option<String>,
        /// 6-digit MFA code; prompted for when required and omitted
        #[arg(long)]
        code: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the stored session
    Status,

    /// Organization management
    Orgs {
        #[command(subcommand)]
        action: OrgAction,
    },

    /// User management
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Group management
    Groups {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Active connections
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Connection history with filters, sorting and CSV export
    History(commands::HistoryArgs),
}

#[derive(Subcommand)]
pub enum OrgAction {
    /// List organizations
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// all, active or inactive
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Show one organization with its admins
    Show { id: String },
    /// Create an organization, optionally with its first admin
    Create {
        name: String,
        #[arg(long, requires = "admin_password")]
        admin_username: Option<String>,
        #[arg(long, requires = "admin_username")]
        admin_password: Option<String>,
    },
    /// Flip an organization between active and inactive
    Toggle { id: String },
    /// Create an admin account for an organization
    AssignAdmin {
        organization_id: String,
        username: String,
        #[arg(long, env = "SECURITA_ADMIN_PASSWORD")]
        password: String,
    },
    /// Revoke an organization admin
    RemoveAdmin {
        organization_id: String,
        user_id: String,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// List users
    List {
        /// Only users of this organization (fetched server-side)
        #[arg(long)]
        org: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
        /// all, active or inactive
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Create a user
    Create(commands::UserFields),
    /// Update a user; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: commands::UserUpdateFields,
    },
    /// Flip a user between active and inactive
    Toggle { id: String },
    /// Enable MFA for a user
    GenerateMfa { id: String },
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// List groups
    List {
        #[arg(long)]
        org: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Create an empty group in an organization
    Create { organization_id: String, name: String },
    /// Rename a group
    Rename { id: String, name: String },
    /// Add an organization user to a group
    AddMember { group_id: String, user_id: String },
    /// Remove a user from a group
    RemoveMember { group_id: String, user_id: String },
    /// Delete a group
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List active sessions
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Terminate sessions by id
    Kill {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Everything a command needs to talk to the backend.
pub struct CliContext {
    pub api: NativeApiClient,
    pub store: FileSessionStore,
    pub server: String,
    pub features: ConsoleFeatures,
    pub format: OutputFormat,
}

fn build_context(cli: &Cli, store: FileSessionStore) -> Result<CliContext> {
    // An unreadable session file behaves like no session; login rewrites it
    let stored = store.load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring stored session: {}", e);
        None
    });

    let server = match &cli.server {
        Some(server) => server.clone(),
        None => store
            .server()
            .ok()
            .flatten()
            .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
    };
    let auth_mode = cli
        .auth_mode
        .map(AuthMode::from)
        .or_else(|| stored.as_ref().map(|s| s.auth_mode))
        .unwrap_or_default();

    let mut config = ApiClientConfig::new(&server).with_auth_mode(auth_mode);
    if let Some(token) = cli
        .token
        .clone()
        .or_else(|| stored.as_ref().and_then(|s| s.token.clone()))
    {
        config = config.with_token(token);
    }

    let api = NativeApiClient::new(config)?;
    if let Some(cookies) = store.cookie_header().ok().flatten() {
        api.restore_cookies(&cookies)
            .context("Failed to restore session cookies")?;
    }

    Ok(CliContext {
        api,
        store,
        server,
        features: ConsoleFeatures::default().with_auth_mode(auth_mode),
        format: cli.format,
    })
}

async fn run(cli: Cli, ctx: &CliContext) -> Result<()> {
    match cli.command {
        Commands::Login {
            username,
            password,
            code,
        } => commands::login(ctx, username, password, code).await,
        Commands::Logout => commands::logout(ctx).await,
        Commands::Status => commands::status(ctx),
        Commands::Orgs { action } => commands::orgs(ctx, action).await,
        Commands::Users { action } => commands::users(ctx, action).await,
        Commands::Groups { action } => commands::groups(ctx, action).await,
        Commands::Sessions { action } => commands::sessions(ctx, action).await,
        Commands::History(args) => commands::history(ctx, args).await,
    }
}

fn session_path() -> Result<PathBuf> {
    match std::env::var_os("SECURITA_SESSION_FILE") {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(FileSessionStore::default_location()?.path().to_path_buf()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let store = FileSessionStore::at(session_path()?);
    let ctx = build_context(&cli, store)?;

    if let Err(e) = run(cli, &ctx).await {
        // A 401 means the stored session is dead
        if e
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(err) if err.is_unauthorized()))
        {
            tracing::info!("Clearing expired session");
            let _ = ctx.store.clear();
            eprintln!("{} Session expired, run `securita-admin login`", "✗".red());
        } else {
            eprintln!("{} {}", "✗".red(), e);
        }
        std::process::exit(1);
    }

    Ok(())
}
