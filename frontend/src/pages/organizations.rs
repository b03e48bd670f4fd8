use shared::filter::{filter_items, ListQuery};
use shared::{workflow, AdminApi, EntityId, Organization};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::{
    NoticeBanner, OrganizationForm, OrganizationModal, SearchBar, SelectFilter, StatusBadge,
};
use crate::hooks::{report_error, use_entity_list, use_notice, ListAction};
use crate::utils;

pub(crate) fn status_options() -> Vec<(String, String)> {
    vec![
        ("all".to_string(), "All statuses".to_string()),
        ("active".to_string(), "Active".to_string()),
        ("inactive".to_string(), "Inactive".to_string()),
    ]
}

#[function_component(OrganizationsPage)]
pub fn organizations_page() -> Html {
    let orgs = use_entity_list("organizations", || async {
        WasmApiClient::from_session().list_organizations().await
    });
    let notice = use_notice();
    let search = use_state(String::new);
    let status = use_state(|| "all".to_string());
    let show_form = use_state(|| false);
    let viewing = use_state(|| None::<EntityId>);

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };
    let on_status = {
        let status = status.clone();
        Callback::from(move |value: String| status.set(value))
    };

    let on_toggle = {
        let list = orgs.list.clone();
        let dispatch = orgs.dispatch.clone();
        let success = notice.success.clone();
        let error = notice.error.clone();
        Callback::from(move |id: EntityId| {
            let mut snapshot = list.clone();
            let dispatch = dispatch.clone();
            let success = success.clone();
            let error = error.clone();
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                match workflow::toggle_organization(&api, &mut snapshot, &id).await {
                    Ok(active) => {
                        if let Some(updated) = snapshot.get(&id).cloned() {
                            dispatch.dispatch(ListAction::Upsert(updated));
                        }
                        success.emit(if active {
                            "Organization activated".to_string()
                        } else {
                            "Organization deactivated".to_string()
                        });
                    }
                    Err(e) => {
                        report_error("Failed to toggle organization", &e);
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
        let show_form = show_form.clone();
        let refresh = orgs.refresh.clone();
        let success = notice.success.clone();
        Callback::from(move |message: String| {
            show_form.set(false);
            success.emit(message);
            refresh.emit(());
        })
    };

    let on_changed = {
        let refresh = orgs.refresh.clone();
        let success = notice.success.clone();
        Callback::from(move |message: String| {
            success.emit(message);
            refresh.emit(());
        })
    };

    let open_form = {
        let show_form = show_form.clone();
        Callback::from(move |_: MouseEvent| show_form.set(true))
    };
    let close_form = {
        let show_form = show_form.clone();
        Callback::from(move |_| show_form.set(false))
    };
    let close_modal = {
        let viewing = viewing.clone();
        Callback::from(move |_| viewing.set(None))
    };

    let query = ListQuery::search((*search).clone()).with_status((*status).clone());
    let visible = filter_items(orgs.list.items(), &query);

    html! {
        <div class="page organizations-page">
            <div class="page-header">
                <h1>{ "Organizations" }</h1>
                <button class="primary-btn" onclick={open_form}>{ "Create Organization" }</button>
            </div>
            <NoticeBanner notice={notice.current.clone()} on_dismiss={notice.dismiss.clone()} />
            {
                if let Some(err) = orgs.list.error() {
                    html! { <div class="error-message">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <div class="toolbar">
                <SearchBar value={(*search).clone()} on_search={on_search}
                    placeholder="Search organizations..." />
                <SelectFilter value={(*status).clone()} options={status_options()} on_change={on_status} />
            </div>
            {
                if orgs.list.is_loading() && orgs.list.is_empty() {
                    html! { <div class="loading">{ "Loading organizations..." }</div> }
                } else if visible.is_empty() {
                    html! { <div class="empty-state">{ "No organizations found" }</div> }
                } else {
                    html! {
                        <table class="data-table">
                            <thead>
                                <tr>
                                    <th>{ "Name" }</th>
                                    <th>{ "Status" }</th>
                                    <th>{ "Admins" }</th>
                                    <th>{ "Created" }</th>
                                    <th>{ "Actions" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                { for visible.iter().map(|org| organization_row(org, &on_toggle, &viewing)) }
                            </tbody>
                        </table>
                    }
                }
            }
            {
                if *show_form {
                    html! {
                        <div class="modal-overlay">
                            <div class="modal-content">
                                <OrganizationForm on_saved={on_saved} on_cancel={close_form} />
                            </div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            {
                if let Some(id) = (*viewing).clone() {
                    html! {
                        <OrganizationModal organization_id={id} on_close={close_modal}
                            on_changed={on_changed} />
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn organization_row(
    org: &Organization,
    on_toggle: &Callback<EntityId>,
    viewing: &UseStateHandle<Option<EntityId>>,
) -> Html {
    let toggle = {
        let on_toggle = on_toggle.clone();
        let id = org.id.clone();
        Callback::from(move |_: MouseEvent| on_toggle.emit(id.clone()))
    };
    let view = {
        let viewing = viewing.clone();
        let id = org.id.clone();
        Callback::from(move |_: MouseEvent| viewing.set(Some(id.clone())))
    };
    let admins = org
        .admins
        .iter()
        .map(|a| a.username.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    html! {
        <tr key={org.id.clone()}>
            <td>{ &org.name }</td>
            <td><StatusBadge active={org.active} /></td>
            <td>{ if admins.is_empty() { "-".to_string() } else { admins } }</td>
            <td>{ org.created_at.map(|t| utils::format_timestamp(&t.to_rfc3339())).unwrap_or_default() }</td>
            <td class="row-actions">
                <button onclick={view}>{ "View" }</button>
                <button class="toggle-btn" onclick={toggle}>
                    { if org.active { "Deactivate" } else { "Activate" } }
                </button>
            </td>
        </tr>
    }
}
