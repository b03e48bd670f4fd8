use shared::{AdminApi, Session, SessionStore};
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::StatCard;
use crate::hooks::use_entity_list;
use crate::session_store::LocalStorageSessionStore;

/// Landing page after login: headline counts for each collection.
#[function_component(HomePage)]
pub fn home_page() -> Html {
    let organizations = use_entity_list("organizations", || async {
        WasmApiClient::from_session().list_organizations().await
    });
    let users = use_entity_list("users", || async {
        WasmApiClient::from_session().list_users().await
    });
    let groups = use_entity_list("groups", || async {
        WasmApiClient::from_session().list_groups().await
    });
    let sessions = use_entity_list("active sessions", || async {
        WasmApiClient::from_session().list_active_sessions().await
    });

    let username = match LocalStorageSessionStore.load() {
        Ok(Some(Session { username, .. })) if !username.is_empty() => username,
        _ => "admin".to_string(),
    };
    let active_orgs = organizations
        .list
        .items()
        .iter()
        .filter(|o| o.active)
        .count();

    let count = |loading: bool, n: usize| if loading { "…".to_string() } else { n.to_string() };

    html! {
        <div class="page home-page">
            <h1>{ format!("Welcome, {}", username) }</h1>
            <div class="stat-grid">
                <StatCard label="Organizations"
                    value={count(organizations.list.is_loading(), organizations.list.len())} />
                <StatCard label="Active organizations" class="success"
                    value={count(organizations.list.is_loading(), active_orgs)} />
                <StatCard label="Users" value={count(users.list.is_loading(), users.list.len())} />
                <StatCard label="Groups" value={count(groups.list.is_loading(), groups.list.len())} />
                <StatCard label="Active sessions"
                    value={count(sessions.list.is_loading(), sessions.list.len())} />
            </div>
        </div>
    }
}
