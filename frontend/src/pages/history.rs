//! Connection history: status tabs, time range, sortable columns, summary
//! cards and CSV export.

use shared::filter::{filter_items, ListQuery};
use shared::history::{
    to_csv, HistoryStats, SortConfig, SortDirection, SortKey, TimeRange, CSV_FILENAME,
};
use shared::{AdminApi, EntityId, HistoryRecord, Selection};
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::{NoticeBanner, SearchBar, SelectFilter, StatCard};
use crate::hooks::{use_entity_list, use_notice};
use crate::utils;

const STATUS_TABS: [(&str, &str); 3] = [
    ("all", "All"),
    ("completed", "Completed"),
    ("failed", "Failed"),
];

const COLUMNS: [(SortKey, &str); 8] = [
    (SortKey::Username, "User"),
    (SortKey::StartTime, "Start time"),
    (SortKey::EndTime, "End time"),
    (SortKey::Duration, "Duration"),
    (SortKey::ConnectionName, "Connection"),
    (SortKey::RemoteHost, "Remote host"),
    (SortKey::Status, "Status"),
    (SortKey::Protocol, "Protocol"),
];

fn range_options() -> Vec<(String, String)> {
    TimeRange::ALL
        .iter()
        .map(|r| (r.as_str().to_string(), r.label().to_string()))
        .collect()
}

fn sort_indicator(sort: &SortConfig, key: SortKey) -> &'static str {
    match (sort.key == key, sort.direction) {
        (false, _) => "",
        (true, SortDirection::Asc) => " ▲",
        (true, SortDirection::Desc) => " ▼",
    }
}

#[function_component(HistoryPage)]
pub fn history_page() -> Html {
    let history = use_entity_list("history", || async {
        WasmApiClient::from_session().list_history().await
    });
    let notice = use_notice();
    let search = use_state(String::new);
    let status = use_state(|| "all".to_string());
    let range = use_state(TimeRange::default);
    let sort = use_state(SortConfig::default);
    let selection = use_state(Selection::new);

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };
    let on_range = {
        let range = range.clone();
        Callback::from(move |value: String| range.set(TimeRange::parse(&value).unwrap_or_default()))
    };

    let now = utils::local_now();
    let query = ListQuery::search((*search).clone()).with_status((*status).clone());
    let mut visible: Vec<&HistoryRecord> = filter_items(history.list.items(), &query)
        .into_iter()
        .filter(|r| range.contains(&r.start_time, now))
        .collect();
    sort.sort(&mut visible);
    let stats = HistoryStats::compute(visible.iter().copied());

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
        let rows: Vec<HistoryRecord> = visible.iter().map(|r| (*r).clone()).collect();
        Callback::from(move |_: Event| {
            let refs: Vec<&HistoryRecord> = rows.iter().collect();
            let mut next = (*selection).clone();
            next.toggle_all(&refs);
            selection.set(next);
        })
    };

    let on_export = {
        let selection = selection.clone();
        let rows: Vec<HistoryRecord> = visible.iter().map(|r| (*r).clone()).collect();
        let success = notice.success.clone();
        let error = notice.error.clone();
        Callback::from(move |_: MouseEvent| {
            // Selected rows if any, otherwise everything currently shown
            let chosen: Vec<&HistoryRecord> = if selection.is_empty() {
                rows.iter().collect()
            } else {
                rows.iter().filter(|r| selection.contains(&r.id)).collect()
            };
            if chosen.is_empty() {
                error.emit("Nothing to export".to_string());
                return;
            }
            let csv = to_csv(chosen.iter().copied());
            match utils::download_text(CSV_FILENAME, "text/csv;charset=utf-8", &csv) {
                Ok(()) => success.emit(format!("Exported {} record(s)", chosen.len())),
                Err(e) => {
                    log::error!("CSV export failed: {:?}", e);
                    error.emit("Export failed".to_string());
                }
            }
        })
    };

    let all_selected = !visible.is_empty() && selection.all_selected(&visible);

    html! {
        <div class="page history-page">
            <div class="page-header">
                <h1>{ "Session History" }</h1>
                <button class="primary-btn" onclick={on_export}>
                    {
                        if selection.is_empty() {
                            "Export CSV".to_string()
                        } else {
                            format!("Export selected ({})", selection.len())
                        }
                    }
                </button>
            </div>
            <NoticeBanner notice={notice.current.clone()} on_dismiss={notice.dismiss.clone()} />
            {
                if let Some(err) = history.list.error() {
                    html! { <div class="error-message">{ err }</div> }
                } else {
                    html! {}
                }
            }

            <div class="stat-grid">
                <StatCard label="Total sessions" value={stats.total.to_string()} />
                <StatCard label="Completed" class="success" value={stats.completed.to_string()} />
                <StatCard label="Failed" class="danger" value={stats.failed.to_string()} />
                <StatCard label="Unique users" value={stats.unique_users.to_string()} />
            </div>

            <div class="tabs">
                {
                    STATUS_TABS.iter().map(|(value, label)| {
                        let active = status.as_str() == *value;
                        let on_click = {
                            let status = status.clone();
                            let value = value.to_string();
                            Callback::from(move |_: MouseEvent| status.set(value.clone()))
                        };
                        html! {
                            <button class={classes!("tab", active.then_some("active"))} onclick={on_click}>
                                { *label }
                            </button>
                        }
                    }).collect::<Html>()
                }
            </div>

            <div class="toolbar">
                <SearchBar value={(*search).clone()} on_search={on_search} placeholder="Search history..." />
                <SelectFilter value={range.as_str()} options={range_options()} on_change={on_range} />
            </div>

            {
                if history.list.is_loading() && history.list.is_empty() {
                    html! { <div class="loading">{ "Loading history..." }</div> }
                } else if visible.is_empty() {
                    html! { <div class="empty-state">{ "No sessions match the current filters" }</div> }
                } else {
                    html! {
                        <table class="data-table history-table">
                            <thead>
                                <tr>
                                    <th><input type="checkbox" checked={all_selected} onchange={on_toggle_all} /></th>
                                    {
                                        COLUMNS.iter().map(|(key, label)| {
                                            let key = *key;
                                            let on_click = {
                                                let sort = sort.clone();
                                                Callback::from(move |_: MouseEvent| sort.set(sort.toggled(key)))
                                            };
                                            html! {
                                                <th class="sortable" onclick={on_click}>
                                                    { format!("{}{}", label, sort_indicator(&sort, key)) }
                                                </th>
                                            }
                                        }).collect::<Html>()
                                    }
                                    <th>{ "Logs" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                {
                                    for visible.iter().map(|record| {
                                        let checked = selection.contains(&record.id);
                                        let toggle = {
                                            let on_toggle_row = on_toggle_row.clone();
                                            let id = record.id.clone();
                                            Callback::from(move |_: Event| on_toggle_row.emit(id.clone()))
                                        };
                                        history_row(record, checked, toggle)
                                    })
                                }
                            </tbody>
                        </table>
                    }
                }
            }
        </div>
    }
}

fn history_row(record: &HistoryRecord, checked: bool, on_toggle: Callback<Event>) -> Html {
    let status = record.status.as_str();
    html! {
        <tr key={record.id.clone()} class={classes!(checked.then_some("selected"))}>
            <td><input type="checkbox" checked={checked} onchange={on_toggle} /></td>
            <td>{ &record.username }</td>
            <td>{ &record.start_time }</td>
            <td>{ record.end_time.clone().unwrap_or_else(|| "-".to_string()) }</td>
            <td>{ record.duration.clone().unwrap_or_else(|| "-".to_string()) }</td>
            <td>{ &record.connection_name }</td>
            <td>{ &record.remote_host }</td>
            <td><span class={classes!("status-badge", status)}>{ status }</span></td>
            <td>{ &record.protocol }</td>
            <td>
                {
                    match &record.logs_link {
                        Some(link) => html! { <a href={link.clone()} target="_blank">{ "View" }</a> },
                        None => html! { "-" },
                    }
                }
            </td>
        </tr>
    }
}
