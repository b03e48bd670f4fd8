use shared::filter::{filter_items, ListQuery};
use shared::{workflow, AdminApi, EntityId, Organization, User};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::{NoticeBanner, SearchBar, SelectFilter, StatusBadge, UserForm};
use crate::hooks::{report_error, use_entity_list, use_notice, ListAction};
use crate::pages::organizations::status_options;

/// Form currently open over the list.
#[derive(Clone, PartialEq)]
enum Editing {
    None,
    Create,
    Edit(User),
}

pub(crate) fn organization_options(orgs: &[Organization]) -> Vec<(String, String)> {
    let mut options = vec![(String::new(), "All organizations".to_string())];
    options.extend(orgs.iter().map(|o| (o.id.clone(), o.name.clone())));
    options
}

#[function_component(UsersPage)]
pub fn users_page() -> Html {
    let users = use_entity_list("users", || async {
        WasmApiClient::from_session().list_users().await
    });
    let orgs = use_entity_list("organizations", || async {
        WasmApiClient::from_session().list_organizations().await
    });
    let notice = use_notice();
    let search = use_state(String::new);
    let org_filter = use_state(String::new);
    let status = use_state(|| "all".to_string());
    let editing = use_state(|| Editing::None);

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };
    let on_org_filter = {
        let org_filter = org_filter.clone();
        Callback::from(move |value: String| org_filter.set(value))
    };
    let on_status = {
        let status = status.clone();
        Callback::from(move |value: String| status.set(value))
    };

    let on_toggle = {
        let list = users.list.clone();
        let dispatch = users.dispatch.clone();
        let success = notice.success.clone();
        let error = notice.error.clone();
        Callback::from(move |id: EntityId| {
            let mut snapshot = list.clone();
            let dispatch = dispatch.clone();
            let success = success.clone();
            let error = error.clone();
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                match workflow::toggle_user(&api, &mut snapshot, &id).await {
                    Ok(active) => {
                        if let Some(updated) = snapshot.get(&id).cloned() {
                            dispatch.dispatch(ListAction::Upsert(updated));
                        }
                        success.emit(if active {
                            "User activated".to_string()
                        } else {
                            "User deactivated".to_string()
                        });
                    }
                    Err(e) => {
                        report_error("Failed to toggle user", &e);
                        if e.is_not_found() {
                            dispatch.dispatch(ListAction::Remove(id));
                        }
                        error.emit(e.user_message());
                    }
                }
            });
        })
    };

    let on_saved = {
        let editing = editing.clone();
        let refresh = users.refresh.clone();
        let success = notice.success.clone();
        Callback::from(move |message: String| {
            editing.set(Editing::None);
            success.emit(message);
            refresh.emit(());
        })
    };
    let on_cancel = {
        let editing = editing.clone();
        Callback::from(move |_| editing.set(Editing::None))
    };
    let open_create = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(Editing::Create))
    };
    let on_edit = {
        let editing = editing.clone();
        Callback::from(move |user: User| editing.set(Editing::Edit(user)))
    };

    let query = ListQuery::search((*search).clone())
        .with_status((*status).clone())
        .with_organization((*org_filter).clone());
    let visible = filter_items(users.list.items(), &query);
    let org_items = orgs.list.items().to_vec();

    let form = match &*editing {
        Editing::None => None,
        Editing::Create => Some(html! {
            <UserForm organizations={org_items.clone()} on_saved={on_saved.clone()}
                on_cancel={on_cancel.clone()} />
        }),
        Editing::Edit(user) => Some(html! {
            <UserForm key={user.id.clone()} user={Some(user.clone())} organizations={org_items.clone()}
                on_saved={on_saved.clone()} on_cancel={on_cancel.clone()} />
        }),
    };

    html! {
        <div class="page users-page">
            <div class="page-header">
                <h1>{ "Users" }</h1>
                <button class="primary-btn" onclick={open_create}>{ "Create User" }</button>
            </div>
            <NoticeBanner notice={notice.current.clone()} on_dismiss={notice.dismiss.clone()} />
            {
                if let Some(err) = users.list.error() {
                    html! { <div class="error-message">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <div class="toolbar">
                <SearchBar value={(*search).clone()} on_search={on_search} placeholder="Search users..." />
                <SelectFilter value={(*org_filter).clone()} options={organization_options(&org_items)}
                    on_change={on_org_filter} />
                <SelectFilter value={(*status).clone()} options={status_options()} on_change={on_status} />
            </div>
            {
                if users.list.is_loading() && users.list.is_empty() {
                    html! { <div class="loading">{ "Loading users..." }</div> }
                } else if visible.is_empty() {
                    html! { <div class="empty-state">{ "No users found" }</div> }
                } else {
                    html! {
                        <table class="data-table">
                            <thead>
                                <tr>
                                    <th>{ "Username" }</th>
                                    <th>{ "Name" }</th>
                                    <th>{ "Email" }</th>
                                    <th>{ "Organizations" }</th>
                                    <th>{ "MFA" }</th>
                                    <th>{ "Status" }</th>
                                    <th>{ "Actions" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                { for visible.iter().map(|user| user_row(user, &on_edit, &on_toggle)) }
                            </tbody>
                        </table>
                    }
                }
            }
            {
                if let Some(form) = form {
                    html! {
                        <div class="modal-overlay">
                            <div class="modal-content">{ form }</div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn user_row(user: &User, on_edit: &Callback<User>, on_toggle: &Callback<EntityId>) -> Html {
    let edit = {
        let on_edit = on_edit.clone();
        let user = user.clone();
        Callback::from(move |_: MouseEvent| on_edit.emit(user.clone()))
    };
    let toggle = {
        let on_toggle = on_toggle.clone();
        let id = user.id.clone();
        Callback::from(move |_: MouseEvent| on_toggle.emit(id.clone()))
    };

    html! {
        <tr key={user.id.clone()}>
            <td>{ &user.username }</td>
            <td>{ user.full_name() }</td>
            <td>{ &user.email }</td>
            <td>{ user.organization_names.join(", ") }</td>
            <td>{ if user.mfa_enabled { "Enabled" } else { "-" } }</td>
            <td><StatusBadge active={user.active} /></td>
            <td class="row-actions">
                <button onclick={edit}>{ "Edit" }</button>
                <button class="toggle-btn" onclick={toggle}>
                    { if user.active { "Deactivate" } else { "Activate" } }
                </button>
            </td>
        </tr>
    }
}
