//! Subcommand handlers. Each one is a thin shell over `shared::workflow`
//! plus table / JSON rendering.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use shared::auth::AuthStep;
use shared::filter::{filter_items, ListQuery};
use shared::history::{
    to_csv, HistoryStats, SortConfig, SortDirection, SortKey, TimeRange,
};
use shared::validate::{
    sanitize_otp, AdminDraft, FormMode, GroupDraft, LoginDraft, OrganizationDraft, OtpDraft,
    UserDraft,
};
use shared::workflow::{self, WorkflowError};
use shared::{
    ActiveSession, AdminApi, ApiError, AuthFlow, EntityList, Group, HistoryRecord, Organization,
    QrOutcome, Selection, SessionStore, User,
};
use tabled::{Table, Tabled};

use crate::{CliContext, GroupAction, OrgAction, OutputFormat, SessionAction, UserAction};

// =============================================================================
// Helpers
// =============================================================================

/// Keep the `ApiError` in the chain (main looks for 401s) but show the
/// user-facing message.
fn api_error(e: ApiError) -> anyhow::Error {
    let message = e.user_message();
    anyhow::Error::new(e).context(message)
}

fn workflow_error(e: WorkflowError) -> anyhow::Error {
    match e {
        WorkflowError::Api(e) => api_error(e),
        other => anyhow::Error::new(other),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn done(message: impl AsRef<str>) {
    println!("{} {}", "✓".green(), message.as_ref());
}

fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "!".yellow(), message.as_ref());
}

/// A follow-up call that failed after the primary write still fails the
/// command, with the primary entity already reported.
fn follow_up(outcome: Option<Result<(), ApiError>>, what: &str) -> Result<()> {
    match outcome {
        Some(Err(e)) => {
            let message = format!("{} failed: {}", what, e.user_message());
            Err(anyhow::Error::new(e).context(message))
        }
        _ => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render<T, R>(ctx: &CliContext, items: &[&T], empty: &str, row: impl Fn(&T) -> R) -> Result<()>
where
    T: Serialize,
    R: Tabled,
{
    match ctx.format {
        OutputFormat::Json => print_json(items),
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", empty);
            } else {
                println!("{}", Table::new(items.iter().map(|item| row(*item))));
            }
            Ok(())
        }
    }
}

fn dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn status_label(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

async fn loaded<T, F>(fetch: F) -> Result<EntityList<T>>
where
    T: shared::Keyed + Clone,
    F: std::future::Future<Output = Result<Vec<T>, ApiError>>,
{
    let mut list = EntityList::new();
    workflow::load_into(&mut list, fetch)
        .await
        .map_err(api_error)?;
    Ok(list)
}

// =============================================================================
// Auth
// =============================================================================

pub async fn login(
    ctx: &CliContext,
    username: String,
    password: Option<String>,
    code: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };
    let draft = LoginDraft { username, password };
    let mut flow = AuthFlow::new(ctx.features.auth_mode);

    let mut session = workflow::login(&ctx.api, &ctx.store, &mut flow, &draft)
        .await
        .map_err(workflow_error)?;

    if session.is_none() {
        if !matches!(flow.step(), AuthStep::MfaRequired { .. }) {
            bail!("{}", flow.error().unwrap_or("Login failed"));
        }
        workflow::fetch_qr(&ctx.api, &mut flow)
            .await
            .map_err(workflow_error)?;
        if let Some(err) = flow.error() {
            warn(format!("Could not load MFA setup: {}", err));
        }
        if let AuthStep::AwaitingOtp {
            qr: QrOutcome::Image(_),
            ..
        } = flow.step()
        {
            println!(
                "{} MFA is not set up for this account yet. Scan the QR code in the web console first.",
                "→".blue()
            );
        }

        let code = match code {
            Some(code) => code,
            None => prompt("MFA code")?,
        };
        let otp = OtpDraft {
            code: sanitize_otp(&code),
        };
        session = workflow::verify_otp(&ctx.api, &ctx.store, &mut flow, &otp)
            .await
            .map_err(workflow_error)?;
        if session.is_none() {
            bail!("{}", flow.error().unwrap_or("MFA verification failed"));
        }
    }

    ctx.store
        .set_connection(&ctx.server, ctx.api.cookie_header())
        .context("Failed to save session")?;
    tracing::info!("Logged in to {}", ctx.server);
    done(format!("Logged in as {}", draft.username.trim().bold()));
    Ok(())
}

pub async fn logout(ctx: &CliContext) -> Result<()> {
    workflow::logout(&ctx.api, &ctx.store)
        .await
        .map_err(workflow_error)?;
    done("Logged out");
    Ok(())
}

pub fn status(ctx: &CliContext) -> Result<()> {
    let session = ctx.store.load().context("Failed to read stored session")?;
    match (ctx.format, session) {
        (OutputFormat::Json, session) => print_json(&session),
        (OutputFormat::Table, Some(session)) => {
            println!("{} {}", "User:".bold(), session.username);
            println!("  Server: {}", ctx.server);
            println!("  Auth mode: {:?}", session.auth_mode);
            println!("  Session file: {}", ctx.store.path().display());
            Ok(())
        }
        (OutputFormat::Table, None) => {
            println!("{} Not logged in", "✗".red());
            Ok(())
        }
    }
}

// =============================================================================
// Organizations
// =============================================================================

#[derive(Tabled)]
struct OrganizationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Admins")]
    admins: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn organization_row(org: &Organization) -> OrganizationRow {
    OrganizationRow {
        id: org.id.clone(),
        name: org.name.clone(),
        status: status_label(org.active),
        admins: dash(
            &org.admins
                .iter()
                .map(|a| a.username.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        created: org
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

pub async fn orgs(ctx: &CliContext, action: OrgAction) -> Result<()> {
    match action {
        OrgAction::List { search, status } => {
            let orgs = ctx.api.list_organizations().await.map_err(api_error)?;
            let query = ListQuery::search(search).with_status(status);
            let visible = filter_items(&orgs, &query);
            render(ctx, &visible, "No organizations found", organization_row)
        }
        OrgAction::Show { id } => {
            let detail = ctx.api.get_organization(&id).await.map_err(api_error)?;
            if ctx.format == OutputFormat::Json {
                return print_json(&detail);
            }
            let org = &detail.organization;
            println!("{} {}", "Organization:".bold(), org.name);
            println!("  ID: {}", org.id);
            println!("  Status: {}", status_label(org.active));
            println!("  Users: {}", detail.user_count);
            println!("  Primary admin: {}", detail.primary_admin().unwrap_or("-"));
            for assignment in detail.assignments() {
                println!(
                    "    {} {} ({})",
                    "●".cyan(),
                    assignment.user.username,
                    assignment.user.id
                );
            }
            Ok(())
        }
        OrgAction::Create {
            name,
            admin_username,
            admin_password,
        } => {
            let admin = admin_username
                .zip(admin_password)
                .map(|(username, password)| AdminDraft { username, password });
            let mut features = ctx.features;
            features.admin_assignment = admin.is_some();
            let draft = OrganizationDraft { name, admin };

            let created = workflow::create_organization(&ctx.api, &draft, &features)
                .await
                .map_err(api_error)?;
            if ctx.format == OutputFormat::Json {
                print_json(&created.organization)?;
            } else {
                match &created.admin {
                    Some(Err(_)) => done("Organization created"),
                    Some(Ok(())) => done("Organization and admin created successfully"),
                    None => done("Organization created successfully"),
                }
                if let Some(org) = &created.organization {
                    println!("  ID: {}", org.id);
                }
            }
            follow_up(created.admin, "Admin creation")
        }
        OrgAction::Toggle { id } => {
            let mut list = loaded(ctx.api.list_organizations()).await?;
            let active = workflow::toggle_organization(&ctx.api, &mut list, &id)
                .await
                .map_err(api_error)?;
            done(format!("Organization {} is now {}", id, status_label(active)));
            Ok(())
        }
        OrgAction::AssignAdmin {
            organization_id,
            username,
            password,
        } => {
            let draft = AdminDraft { username, password };
            workflow::assign_admin(&ctx.api, &organization_id, &draft)
                .await
                .map_err(api_error)?;
            done(format!("{} is now an admin of {}", draft.username, organization_id));
            Ok(())
        }
        OrgAction::RemoveAdmin {
            organization_id,
            user_id,
        } => {
            workflow::remove_admin(&ctx.api, &organization_id, &user_id)
                .await
                .map_err(api_error)?;
            done("Admin removed successfully");
            Ok(())
        }
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Args)]
pub struct UserFields {
    pub username: String,
    #[arg(long, env = "SECURITA_USER_PASSWORD")]
    pub password: String,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    /// Organization id; repeat for several
    #[arg(long = "org", required = true)]
    pub organizations: Vec<String>,
    /// Enable MFA once the user exists
    #[arg(long)]
    pub mfa: bool,
}

impl UserFields {
    fn into_draft(self) -> UserDraft {
        UserDraft {
            mode: FormMode::Create,
            organization_ids: self.organizations,
            username: self.username,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            mfa_enabled: self.mfa,
        }
    }
}

#[derive(Args, Default)]
pub struct UserUpdateFields {
    #[arg(long)]
    pub username: Option<String>,
    /// New password; the current one is kept when omitted
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Replace the organization list; repeat for several
    #[arg(long = "org")]
    pub organizations: Vec<String>,
    #[arg(long)]
    pub mfa: Option<bool>,
}

impl UserUpdateFields {
    fn apply(self, draft: &mut UserDraft) {
        let fields = [
            (self.username, &mut draft.username),
            (self.password, &mut draft.password),
            (self.first_name, &mut draft.first_name),
            (self.last_name, &mut draft.last_name),
            (self.email, &mut draft.email),
            (self.phone, &mut draft.phone),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if !self.organizations.is_empty() {
            draft.organization_ids = self.organizations;
        }
        if let Some(mfa) = self.mfa {
            draft.mfa_enabled = mfa;
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Organizations")]
    organizations: String,
    #[tabled(rename = "MFA")]
    mfa: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
}

fn user_row(user: &User) -> UserRow {
    UserRow {
        id: user.id.clone(),
        username: user.username.clone(),
        name: dash(&user.full_name()),
        email: dash(&user.email),
        organizations: dash(&user.organization_names.join(", ")),
        mfa: if user.mfa_enabled { "on" } else { "off" },
        status: status_label(user.active),
    }
}

pub async fn users(ctx: &CliContext, action: UserAction) -> Result<()> {
    match action {
        UserAction::List { org, search, status } => {
            let users = match &org {
                Some(org_id) => ctx.api.list_users_by_organization(org_id).await,
                None => ctx.api.list_users().await,
            }
            .map_err(api_error)?;
            let query = ListQuery::search(search).with_status(status);
            let visible = filter_items(&users, &query);
            render(ctx, &visible, "No users found", user_row)
        }
        UserAction::Create(fields) => {
            let draft = fields.into_draft();
            let saved = workflow::save_user(&ctx.api, None, &draft, &ctx.features)
                .await
                .map_err(api_error)?;
            if ctx.format == OutputFormat::Json {
                print_json(&saved.user)?;
            } else {
                done("User created successfully");
                if let Some(user) = &saved.user {
                    println!("  ID: {}", user.id);
                }
                if let Some(Ok(())) = &saved.mfa {
                    done("MFA enabled");
                }
            }
            follow_up(saved.mfa, "MFA setup")
        }
        UserAction::Update { id, fields } => {
            let users = ctx.api.list_users().await.map_err(api_error)?;
            let Some(user) = users.iter().find(|u| u.id == id) else {
                return Err(api_error(ApiError::NotFound(id)));
            };
            let mut draft = UserDraft::edit(user);
            fields.apply(&mut draft);
            let saved = workflow::save_user(&ctx.api, Some(&id), &draft, &ctx.features)
                .await
                .map_err(api_error)?;
            if ctx.format == OutputFormat::Json {
                return print_json(&saved.user);
            }
            done("User updated successfully");
            Ok(())
        }
        UserAction::Toggle { id } => {
            let mut list = loaded(ctx.api.list_users()).await?;
            let active = workflow::toggle_user(&ctx.api, &mut list, &id)
                .await
                .map_err(api_error)?;
            done(format!("User {} is now {}", id, status_label(active)));
            Ok(())
        }
        UserAction::GenerateMfa { id } => {
            ctx.api.generate_mfa(&id).await.map_err(api_error)?;
            done(format!("MFA enabled for {}", id));
            Ok(())
        }
    }
}

// =============================================================================
// Groups
// =============================================================================

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Organization")]
    organization: String,
    #[tabled(rename = "Members")]
    members: String,
}

fn group_row(group: &Group) -> GroupRow {
    GroupRow {
        id: group.id.clone(),
        name: group.name.clone(),
        organization: dash(group.organization.as_ref().map_or("", |o| o.name.as_str())),
        members: dash(
            &group
                .members
                .iter()
                .map(|m| m.username.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

pub async fn groups(ctx: &CliContext, action: GroupAction) -> Result<()> {
    match action {
        GroupAction::List { org, search } => {
            let groups = ctx.api.list_groups().await.map_err(api_error)?;
            let mut query = ListQuery::search(search);
            if let Some(org_id) = org {
                query = query.with_organization(org_id);
            }
            let visible = filter_items(&groups, &query);
            render(ctx, &visible, "No groups found", group_row)
        }
        GroupAction::Create {
            organization_id,
            name,
        } => {
            let draft = GroupDraft {
                name,
                organization_id,
            };
            let group = workflow::create_group(&ctx.api, &draft)
                .await
                .map_err(api_error)?;
            if ctx.format == OutputFormat::Json {
                return print_json(&group);
            }
            done("Group created successfully");
            if let Some(group) = group {
                println!("  ID: {}", group.id);
            }
            Ok(())
        }
        GroupAction::Rename { id, name } => {
            let mut list = loaded(ctx.api.list_groups()).await?;
            let group = workflow::rename_group(&ctx.api, &mut list, &id, &name)
                .await
                .map_err(api_error)?;
            done(format!("Group renamed to {}", group.name));
            Ok(())
        }
        GroupAction::AddMember { group_id, user_id } => {
            let mut list = loaded(ctx.api.list_groups()).await?;
            let Some(group) = list.get(&group_id).cloned() else {
                return Err(api_error(ApiError::NotFound(group_id)));
            };
            if group.has_member(&user_id) {
                done(format!("{} is already a member of {}", user_id, group.name));
                return Ok(());
            }
            // Members must come from the group's organization
            let pool = match group.organization_id() {
                Some(org_id) => ctx
                    .api
                    .list_users_by_organization(org_id)
                    .await
                    .map_err(api_error)?,
                None => Vec::new(),
            };
            let Some(user) = workflow::member_candidates(&group, &pool)
                .into_iter()
                .find(|u| u.id == user_id)
            else {
                bail!("User {} is not in the group's organization", user_id);
            };
            let updated = workflow::add_member(&ctx.api, &mut list, &group_id, &user.summary())
                .await
                .map_err(api_error)?;
            done(format!(
                "Added {} to {} ({} members)",
                user.username,
                updated.name,
                updated.members.len()
            ));
            Ok(())
        }
        GroupAction::RemoveMember { group_id, user_id } => {
            let mut list = loaded(ctx.api.list_groups()).await?;
            let updated = workflow::remove_member(&ctx.api, &mut list, &group_id, &user_id)
                .await
                .map_err(api_error)?;
            done(format!(
                "Removed {} from {} ({} members)",
                user_id,
                updated.name,
                updated.members.len()
            ));
            Ok(())
        }
        GroupAction::Delete { id } => {
            let mut list = EntityList::new();
            workflow::delete_group(&ctx.api, &mut list, &id)
                .await
                .map_err(api_error)?;
            done("Group deleted successfully");
            Ok(())
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Active since")]
    active_since: String,
    #[tabled(rename = "Remote host")]
    remote_host: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

fn session_row(session: &ActiveSession) -> SessionRow {
    SessionRow {
        id: session.id.clone(),
        username: session.username.clone(),
        active_since: session.active_since.clone(),
        remote_host: dash(&session.remote_host),
        connection: dash(&session.connection_name),
        duration: dash(session.duration.as_deref().unwrap_or_default()),
    }
}

pub async fn sessions(ctx: &CliContext, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::List { search } => {
            let sessions = ctx.api.list_active_sessions().await.map_err(api_error)?;
            let visible = filter_items(&sessions, &ListQuery::search(search));
            render(ctx, &visible, "No active sessions", session_row)
        }
        SessionAction::Kill { ids } => {
            let mut list = loaded(ctx.api.list_active_sessions()).await?;
            let mut selection = Selection::new();
            for id in &ids {
                if list.get(id).is_some() {
                    selection.toggle(id);
                } else {
                    warn(format!("{} is not an active session, skipping", id));
                }
            }
            let killed = workflow::kill_selected(&ctx.api, &mut list, &mut selection)
                .await
                .map_err(api_error)?;
            done(format!("Terminated {} session(s)", killed));
            Ok(())
        }
    }
}

// =============================================================================
// History
// =============================================================================

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum SortArg {
    Username,
    StartTime,
    EndTime,
    Duration,
    ConnectionName,
    RemoteHost,
    Status,
    Protocol,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Username => SortKey::Username,
            SortArg::StartTime => SortKey::StartTime,
            SortArg::EndTime => SortKey::EndTime,
            SortArg::Duration => SortKey::Duration,
            SortArg::ConnectionName => SortKey::ConnectionName,
            SortArg::RemoteHost => SortKey::RemoteHost,
            SortArg::Status => SortKey::Status,
            SortArg::Protocol => SortKey::Protocol,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(Args, Default)]
pub struct HistoryArgs {
    /// all, completed or failed
    #[arg(long, default_value = "all", value_parser = ["all", "completed", "failed"])]
    pub status: String,
    /// all, today, week or month
    #[arg(long, default_value = "all", value_parser = ["all", "today", "week", "month"])]
    pub range: String,
    #[arg(long, default_value = "")]
    pub search: String,
    /// Sort column (default: newest start time first)
    #[arg(long)]
    pub sort: Option<SortArg>,
    #[arg(long)]
    pub order: Option<OrderArg>,
    /// Export only these record ids; repeat for several
    #[arg(long = "id")]
    pub ids: Vec<String>,
    /// Write CSV to this file ("-" for stdout)
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

impl HistoryArgs {
    /// A new sort column starts ascending, like a header click.
    fn sort_config(&self) -> SortConfig {
        let mut config = match self.sort {
            Some(key) => SortConfig::default().toggled(key.into()),
            None => SortConfig::default(),
        };
        if let Some(order) = self.order {
            config.direction = match order {
                OrderArg::Asc => SortDirection::Asc,
                OrderArg::Desc => SortDirection::Desc,
            };
        }
        config
    }

    /// Filtered, sorted view; `ids` narrows it to a selection.
    fn select<'a>(&self, records: &'a [HistoryRecord], now: NaiveDateTime) -> Vec<&'a HistoryRecord> {
        let range = TimeRange::parse(&self.range).unwrap_or_default();
        let query = ListQuery::search(self.search.clone()).with_status(self.status.clone());
        let mut selection = Selection::new();
        for id in &self.ids {
            selection.toggle(id);
        }
        let mut visible: Vec<&HistoryRecord> = filter_items(records, &query)
            .into_iter()
            .filter(|r| range.contains(&r.start_time, now))
            .filter(|r| selection.is_empty() || selection.contains(&r.id))
            .collect();
        self.sort_config().sort(&mut visible);
        visible
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Remote host")]
    remote_host: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Protocol")]
    protocol: String,
}

fn history_row(record: &HistoryRecord) -> HistoryRow {
    HistoryRow {
        id: record.id.clone(),
        username: record.username.clone(),
        start: record.start_time.clone(),
        end: dash(record.end_time.as_deref().unwrap_or_default()),
        duration: dash(record.duration.as_deref().unwrap_or_default()),
        connection: dash(&record.connection_name),
        remote_host: dash(&record.remote_host),
        status: record.status.as_str(),
        protocol: dash(&record.protocol),
    }
}

pub async fn history(ctx: &CliContext, args: HistoryArgs) -> Result<()> {
    let records = ctx.api.list_history().await.map_err(api_error)?;
    let now = chrono::Local::now().naive_local();
    let visible = args.select(&records, now);

    if let Some(path) = &args.csv {
        let csv = to_csv(visible.iter().copied());
        if path.as_os_str() == "-" {
            println!("{}", csv);
        } else {
            fs::write(path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            done(format!("Exported {} record(s) to {}", visible.len(), path.display()));
        }
        return Ok(());
    }

    if ctx.format == OutputFormat::Table {
        let stats = HistoryStats::compute(visible.iter().copied());
        println!(
            "{} {}  {} {}  {} {}  {} {}",
            "Total:".bold(),
            stats.total,
            "Completed:".bold(),
            stats.completed.to_string().green(),
            "Failed:".bold(),
            stats.failed.to_string().red(),
            "Users:".bold(),
            stats.unique_users
        );
    }
    render(ctx, &visible, "No sessions match the current filters", history_row)
}
