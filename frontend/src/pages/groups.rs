use shared::filter::{filter_items, ListQuery};
use shared::validate::GroupDraft;
use shared::{workflow, AdminApi, ApiError, EntityId, Group};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::{GroupModal, NoticeBanner, SearchBar, SelectFilter};
use crate::hooks::{report_error, use_entity_list, use_notice, ListAction};
use crate::pages::users::organization_options;

#[function_component(GroupsPage)]
pub fn groups_page() -> Html {
    let groups = use_entity_list("groups", || async {
        WasmApiClient::from_session().list_groups().await
    });
    let orgs = use_entity_list("organizations", || async {
        WasmApiClient::from_session().list_organizations().await
    });
    let notice = use_notice();
    let search = use_state(String::new);
    let org_filter = use_state(String::new);
    let draft = use_state(GroupDraft::default);
    let draft_error = use_state(|| None::<String>);
    let creating = use_state(|| false);
    let managing = use_state(|| None::<Group>);

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };
    let on_org_filter = {
        let org_filter = org_filter.clone();
        Callback::from(move |value: String| org_filter.set(value))
    };

    let on_draft_org = {
        let draft = draft.clone();
        let draft_error = draft_error.clone();
        Callback::from(move |value: String| {
            draft.set(GroupDraft {
                organization_id: value,
                ..(*draft).clone()
            });
            draft_error.set(None);
        })
    };
    let on_draft_name = {
        let draft = draft.clone();
        let draft_error = draft_error.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            draft.set(GroupDraft {
                name: input.value(),
                ..(*draft).clone()
            });
            draft_error.set(None);
        })
    };

    let on_create = {
        let draft = draft.clone();
        let draft_error = draft_error.clone();
        let creating = creating.clone();
        let dispatch = groups.dispatch.clone();
        let refresh = groups.refresh.clone();
        let success = notice.success.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let draft_value = (*draft).clone();
            let draft = draft.clone();
            let draft_error = draft_error.clone();
            let creating = creating.clone();
            let dispatch = dispatch.clone();
            let refresh = refresh.clone();
            let success = success.clone();
            creating.set(true);
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result = workflow::create_group(&api, &draft_value).await;
                creating.set(false);
                match result {
                    Ok(created) => {
                        match created {
                            Some(group) => dispatch.dispatch(ListAction::Upsert(group)),
                            None => refresh.emit(()),
                        }
                        draft.set(GroupDraft {
                            organization_id: draft_value.organization_id,
                            name: String::new(),
                        });
                        success.emit("Group created successfully".to_string());
                    }
                    Err(ApiError::Validation(errors)) => {
                        draft_error.set(errors.first_message().map(str::to_string));
                    }
                    Err(e) => {
                        report_error("Failed to create group", &e);
                        draft_error.set(Some(e.user_message()));
                    }
                }
            });
        })
    };

    let close_modal = {
        let managing = managing.clone();
        Callback::from(move |_| managing.set(None))
    };
    let on_updated = {
        let managing = managing.clone();
        let dispatch = groups.dispatch.clone();
        let success = notice.success.clone();
        Callback::from(move |(group, message): (Group, String)| {
            dispatch.dispatch(ListAction::Upsert(group.clone()));
            managing.set(Some(group));
            success.emit(message);
        })
    };
    let on_deleted = {
        let managing = managing.clone();
        let dispatch = groups.dispatch.clone();
        let success = notice.success.clone();
        Callback::from(move |(id, message): (EntityId, String)| {
            dispatch.dispatch(ListAction::Remove(id));
            managing.set(None);
            success.emit(message);
        })
    };
    let on_vanished = {
        let managing = managing.clone();
        let refresh = groups.refresh.clone();
        let error = notice.error.clone();
        Callback::from(move |message: String| {
            managing.set(None);
            error.emit(message);
            refresh.emit(());
        })
    };

    let query = ListQuery::search((*search).clone()).with_organization((*org_filter).clone());
    let visible = filter_items(groups.list.items(), &query);
    let org_items = orgs.list.items().to_vec();
    let mut draft_org_options = vec![(String::new(), "Select organization...".to_string())];
    draft_org_options.extend(org_items.iter().map(|o| (o.id.clone(), o.name.clone())));

    html! {
        <div class="page groups-page">
            <div class="page-header">
                <h1>{ "Groups" }</h1>
            </div>
            <NoticeBanner notice={notice.current.clone()} on_dismiss={notice.dismiss.clone()} />
            {
                if let Some(err) = groups.list.error() {
                    html! { <div class="error-message">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <form class="inline-form create-group" onsubmit={on_create}>
                <SelectFilter value={draft.organization_id.clone()} options={draft_org_options}
                    on_change={on_draft_org} />
                <input type="text" placeholder="Group name" value={draft.name.clone()}
                    oninput={on_draft_name} />
                <button type="submit" disabled={*creating}>
                    { if *creating { "Creating..." } else { "Create Group" } }
                </button>
                {
                    if let Some(ref err) = *draft_error {
                        html! { <span class="field-error">{ err }</span> }
                    } else {
                        html! {}
                    }
                }
            </form>
            <div class="toolbar">
                <SearchBar value={(*search).clone()} on_search={on_search} placeholder="Search groups..." />
                <SelectFilter value={(*org_filter).clone()} options={organization_options(&org_items)}
                    on_change={on_org_filter} />
            </div>
            {
                if groups.list.is_loading() && groups.list.is_empty() {
                    html! { <div class="loading">{ "Loading groups..." }</div> }
                } else if visible.is_empty() {
                    html! { <div class="empty-state">{ "No groups found" }</div> }
                } else {
                    html! {
                        <table class="data-table">
                            <thead>
                                <tr>
                                    <th>{ "Name" }</th>
                                    <th>{ "Organization" }</th>
                                    <th>{ "Members" }</th>
                                    <th>{ "Actions" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                { for visible.iter().map(|group| group_row(group, &managing)) }
                            </tbody>
                        </table>
                    }
                }
            }
            {
                if let Some(group) = (*managing).clone() {
                    html! {
                        <GroupModal
                            key={group.id.clone()}
                            group={group.clone()}
                            on_close={close_modal}
                            on_updated={on_updated}
                            on_deleted={on_deleted}
                            on_vanished={on_vanished}
                        />
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn group_row(group: &Group, managing: &UseStateHandle<Option<Group>>) -> Html {
    let manage = {
        let managing = managing.clone();
        let group = group.clone();
        Callback::from(move |_: MouseEvent| managing.set(Some(group.clone())))
    };
    let org_name = group
        .organization
        .as_ref()
        .map(|o| o.name.clone())
        .unwrap_or_else(|| "-".to_string());

    html! {
        <tr key={group.id.clone()}>
            <td>{ &group.name }</td>
            <td>{ org_name }</td>
            <td>{ group.members.len() }</td>
            <td class="row-actions">
                <button onclick={manage}>{ "Manage" }</button>
            </td>
        </tr>
    }
}
