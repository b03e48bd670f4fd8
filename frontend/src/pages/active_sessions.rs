use shared::filter::{filter_items, ListQuery};
use shared::{workflow, ActiveSession, AdminApi, EntityId, EntityList, Selection};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::{ConfirmModal, NoticeBanner, SearchBar};
use crate::hooks::{report_error, use_entity_list, use_notice, ListAction};
use crate::utils;

/// Live connections with bulk termination.
#[function_component(ActiveSessionsPage)]
pub fn active_sessions_page() -> Html {
    let sessions = use_entity_list("active sessions", || async {
        WasmApiClient::from_session().list_active_sessions().await
    });
    let notice = use_notice();
    let search = use_state(String::new);
    let selection = use_state(Selection::new);
    let confirming = use_state(|| false);
    let killing = use_state(|| false);

    // Drop selected ids that vanished on refresh
    {
        let selection = selection.clone();
        use_effect_with(sessions.list.clone(), move |list: &EntityList<ActiveSession>| {
            let mut next = (*selection).clone();
            next.retain_existing(list.items());
            if next != *selection {
                selection.set(next);
            }
            || ()
        });
    }

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };

    let query = ListQuery::search((*search).clone());
    let visible = filter_items(sessions.list.items(), &query);

    let on_toggle_row = {
        let selection = selection.clone();
        Callback::from(move |id: EntityId| {
            let mut next = (*selection).clone();
            next.toggle(&id);
            selection.set(next);
        })
    };
    let on_toggle_all = {
        let selection = selection.clone();
        let visible: Vec<ActiveSession> = visible.iter().map(|s| (*s).clone()).collect();
        Callback::from(move |_: Event| {
            let refs: Vec<&ActiveSession> = visible.iter().collect();
            let mut next = (*selection).clone();
            next.toggle_all(&refs);
            selection.set(next);
        })
    };

    let ask_kill = {
        let confirming = confirming.clone();
        Callback::from(move |_: MouseEvent| confirming.set(true))
    };
    let cancel_kill = {
        let confirming = confirming.clone();
        Callback::from(move |_| confirming.set(false))
    };
    let on_kill = {
        let confirming = confirming.clone();
        let killing = killing.clone();
        let selection = selection.clone();
        let list = sessions.list.clone();
        let dispatch = sessions.dispatch.clone();
        let success = notice.success.clone();
        let error = notice.error.clone();
        Callback::from(move |_| {
            confirming.set(false);
            let mut snapshot = list.clone();
            let mut chosen = (*selection).clone();
            let ids = chosen.ids();
            let killing = killing.clone();
            let selection = selection.clone();
            let dispatch = dispatch.clone();
            let success = success.clone();
            let error = error.clone();
            killing.set(true);
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result = workflow::kill_selected(&api, &mut snapshot, &mut chosen).await;
                killing.set(false);
                match result {
                    Ok(0) => {}
                    Ok(count) => {
                        dispatch.dispatch(ListAction::RemoveMany(ids));
                        selection.set(chosen);
                        log::info!("Terminated {} sessions", count);
                        success.emit(format!("Terminated {} session(s)", count));
                    }
                    Err(e) => {
                        report_error("Failed to terminate sessions", &e);
                        error.emit(e.user_message());
                    }
                }
            });
        })
    };

    let on_refresh = {
        let refresh = sessions.refresh.clone();
        Callback::from(move |_: MouseEvent| refresh.emit(()))
    };
    let all_selected = !visible.is_empty() && selection.all_selected(&visible);

    html! {
        <div class="page active-sessions-page">
            <div class="page-header">
                <h1>{ "Active Sessions" }</h1>
                <button class="delete-btn" onclick={ask_kill}
                    disabled={selection.is_empty() || *killing}>
                    { format!("Kill selected ({})", selection.len()) }
                </button>
            </div>
            <NoticeBanner notice={notice.current.clone()} on_dismiss={notice.dismiss.clone()} />
            {
                if let Some(err) = sessions.list.error() {
                    html! { <div class="error-message">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <div class="toolbar">
                <SearchBar value={(*search).clone()} on_search={on_search} placeholder="Search sessions..." />
                <button class="refresh-btn" onclick={on_refresh}>{ "Refresh" }</button>
            </div>
            {
                if sessions.list.is_loading() && sessions.list.is_empty() {
                    html! { <div class="loading">{ "Loading sessions..." }</div> }
                } else if visible.is_empty() {
                    html! { <div class="empty-state">{ "No active sessions" }</div> }
                } else {
                    html! {
                        <table class="data-table">
                            <thead>
                                <tr>
                                    <th><input type="checkbox" checked={all_selected} onchange={on_toggle_all} /></th>
                                    <th>{ "User" }</th>
                                    <th>{ "Active since" }</th>
                                    <th>{ "Remote host" }</th>
                                    <th>{ "Connection" }</th>
                                    <th>{ "Duration" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                {
                                    for visible.iter().map(|session| {
                                        let checked = selection.contains(&session.id);
                                        let toggle = {
                                            let on_toggle_row = on_toggle_row.clone();
                                            let id = session.id.clone();
                                            Callback::from(move |_: Event| on_toggle_row.emit(id.clone()))
                                        };
                                        html! {
                                            <tr key={session.id.clone()} class={classes!(checked.then_some("selected"))}>
                                                <td><input type="checkbox" checked={checked} onchange={toggle} /></td>
                                                <td>{ &session.username }</td>
                                                <td>{ utils::format_timestamp(&session.active_since) }</td>
                                                <td>{ &session.remote_host }</td>
                                                <td>{ &session.connection_name }</td>
                                                <td>{ session.duration.clone().unwrap_or_default() }</td>
                                            </tr>
                                        }
                                    })
                                }
                            </tbody>
                        </table>
                    }
                }
            }
            {
                if *confirming {
                    html! {
                        <ConfirmModal
                            message={format!("Terminate {} selected session(s)?", selection.len())}
                            on_confirm={on_kill}
                            on_cancel={cancel_kill}
                        />
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
