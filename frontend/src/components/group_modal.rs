use shared::validate::validate_group_rename;
use shared::workflow;
use shared::{AdminApi, ApiError, EntityId, EntityList, Group, User};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::ConfirmModal;
use crate::hooks::report_error;

#[derive(Properties, PartialEq)]
pub struct GroupModalProps {
    pub group: Group,
    pub on_close: Callback<()>,
    /// Server confirmed a change to this group
    pub on_updated: Callback<(Group, String)>,
    pub on_deleted: Callback<(EntityId, String)>,
    /// The group is gone server-side
    pub on_vanished: Callback<String>,
}

pub enum GroupModalMsg {
    CandidatesLoaded(Result<Vec<User>, ApiError>),
    SelectCandidate(String),
    AddMember,
    RemoveMember(EntityId),
    UpdateName(String),
    Rename,
    AskDelete(bool),
    Delete,
    Updated(Result<Group, ApiError>, &'static str),
    Deleted(Result<(), ApiError>),
}

/// Members of one group with add / remove / rename / delete.
pub struct GroupModal {
    group: Group,
    candidates: Vec<User>,
    selected: String,
    name: String,
    confirm_delete: bool,
    busy: bool,
    error: Option<String>,
}

impl GroupModal {
    /// One-entry list so the shared membership workflow can reconcile it.
    fn scratch(&self) -> EntityList<Group> {
        let mut list = EntityList::new();
        list.fetch_succeeded(vec![self.group.clone()]);
        list
    }

    fn fail(&mut self, ctx: &Context<Self>, context: &str, e: ApiError) -> bool {
        report_error(context, &e);
        self.busy = false;
        if e.is_not_found() {
            ctx.props().on_vanished.emit(e.user_message());
            return false;
        }
        self.error = Some(e.user_message());
        true
    }
}

impl Component for GroupModal {
    type Message = GroupModalMsg;
    type Properties = GroupModalProps;

    fn create(ctx: &Context<Self>) -> Self {
        let group = ctx.props().group.clone();
        if let Some(org_id) = group.organization_id().map(str::to_string) {
            let link = ctx.link().clone();
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result = api.list_users_by_organization(&org_id).await;
                link.send_message(GroupModalMsg::CandidatesLoaded(result));
            });
        }
        Self {
            name: group.name.clone(),
            group,
            candidates: Vec::new(),
            selected: String::new(),
            confirm_delete: false,
            busy: false,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            GroupModalMsg::CandidatesLoaded(Ok(users)) => {
                self.candidates = users;
                true
            }
            GroupModalMsg::CandidatesLoaded(Err(e)) => {
                self.fail(ctx, "Failed to load organization users", e)
            }
            GroupModalMsg::SelectCandidate(id) => {
                self.selected = id;
                true
            }
            GroupModalMsg::AddMember => {
                let Some(user) = self.candidates.iter().find(|u| u.id == self.selected) else {
                    self.error = Some("Select a user to add".to_string());
                    return true;
                };
                let summary = user.summary();
                let group_id = self.group.id.clone();
                let mut list = self.scratch();
                let link = ctx.link().clone();
                self.busy = true;
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::add_member(&api, &mut list, &group_id, &summary).await;
                    link.send_message(GroupModalMsg::Updated(result, "Member added"));
                });
                true
            }
            GroupModalMsg::RemoveMember(user_id) => {
                let group_id = self.group.id.clone();
                let mut list = self.scratch();
                let link = ctx.link().clone();
                self.busy = true;
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::remove_member(&api, &mut list, &group_id, &user_id).await;
                    link.send_message(GroupModalMsg::Updated(result, "Member removed"));
                });
                true
            }
            GroupModalMsg::UpdateName(name) => {
                self.name = name;
                true
            }
            GroupModalMsg::Rename => {
                if let Some(message) = validate_group_rename(&self.name).first_message() {
                    self.error = Some(message.to_string());
                    return true;
                }
                let group_id = self.group.id.clone();
                let name = self.name.clone();
                let mut list = self.scratch();
                let link = ctx.link().clone();
                self.busy = true;
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::rename_group(&api, &mut list, &group_id, &name).await;
                    link.send_message(GroupModalMsg::Updated(result, "Group updated successfully"));
                });
                true
            }
            GroupModalMsg::AskDelete(ask) => {
                self.confirm_delete = ask;
                true
            }
            GroupModalMsg::Delete => {
                self.confirm_delete = false;
                let group_id = self.group.id.clone();
                let mut list = self.scratch();
                let link = ctx.link().clone();
                self.busy = true;
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::delete_group(&api, &mut list, &group_id).await;
                    link.send_message(GroupModalMsg::Deleted(result));
                });
                true
            }
            GroupModalMsg::Updated(Ok(group), message) => {
                self.busy = false;
                self.error = None;
                self.selected.clear();
                self.name = group.name.clone();
                self.group = group.clone();
                ctx.props().on_updated.emit((group, message.to_string()));
                true
            }
            GroupModalMsg::Updated(Err(e), _) => self.fail(ctx, "Failed to update group", e),
            GroupModalMsg::Deleted(Ok(())) => {
                self.busy = false;
                ctx.props()
                    .on_deleted
                    .emit((self.group.id.clone(), "Group deleted successfully".to_string()));
                false
            }
            GroupModalMsg::Deleted(Err(e)) => self.fail(ctx, "Failed to delete group", e),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_close = ctx.props().on_close.clone();
        let on_overlay_click = {
            let on_close = on_close.clone();
            Callback::from(move |_| on_close.emit(()))
        };
        let on_dialog_click = Callback::from(|e: MouseEvent| e.stop_propagation());

        let on_name_input = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            GroupModalMsg::UpdateName(input.value())
        });
        let on_rename = ctx.link().callback(|_: MouseEvent| GroupModalMsg::Rename);
        let on_select = ctx.link().callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            GroupModalMsg::SelectCandidate(select.value())
        });
        let on_add = ctx.link().callback(|_: MouseEvent| GroupModalMsg::AddMember);
        let on_ask_delete = ctx.link().callback(|_: MouseEvent| GroupModalMsg::AskDelete(true));
        let on_cancel_delete = ctx.link().callback(|_| GroupModalMsg::AskDelete(false));
        let on_confirm_delete = ctx.link().callback(|_| GroupModalMsg::Delete);

        let candidates = workflow::member_candidates(&self.group, &self.candidates);
        let org_name = self
            .group
            .organization
            .as_ref()
            .map(|o| o.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("-");

        html! {
            <div class="modal-overlay" onclick={on_overlay_click}>
                <div class="modal-content detail-modal" onclick={on_dialog_click}>
                    <div class="modal-header">
                        <h2>{ &self.group.name }</h2>
                        <button class="modal-close" onclick={move |_| on_close.emit(())}>{ "×" }</button>
                    </div>
                    <p class="modal-subtitle">{ format!("Organization: {}", org_name) }</p>
                    {
                        if let Some(error) = &self.error {
                            html! { <div class="form-error">{ error }</div> }
                        } else {
                            html! {}
                        }
                    }

                    <div class="rename-group">
                        <input type="text" value={self.name.clone()} oninput={on_name_input} />
                        <button onclick={on_rename} disabled={self.busy}>{ "Rename" }</button>
                    </div>

                    <h3>{ format!("Members ({})", self.group.members.len()) }</h3>
                    {
                        if self.group.members.is_empty() {
                            html! { <div class="member-empty">{ "No members yet" }</div> }
                        } else {
                            html! {
                                <ul class="member-list">
                                    { for self.group.members.iter().map(|member| {
                                        let user_id = member.id.clone();
                                        let on_remove = ctx.link().callback(move |_: MouseEvent| {
                                            GroupModalMsg::RemoveMember(user_id.clone())
                                        });
                                        html! {
                                            <li key={member.id.clone()}>
                                                <span>{ &member.username }</span>
                                                <button class="member-remove" onclick={on_remove}
                                                    disabled={self.busy} title="Remove member">{ "×" }</button>
                                            </li>
                                        }
                                    }) }
                                </ul>
                            }
                        }
                    }

                    <div class="add-member">
                        <select onchange={on_select}>
                            <option value="" selected={self.selected.is_empty()}>{ "Select user..." }</option>
                            {
                                candidates.iter().map(|user| html! {
                                    <option value={user.id.clone()} selected={self.selected == user.id}>
                                        { &user.username }
                                    </option>
                                }).collect::<Html>()
                            }
                        </select>
                        <button onclick={on_add} disabled={self.busy || candidates.is_empty()}>{ "Add" }</button>
                    </div>

                    <div class="modal-actions">
                        <button class="delete-btn" onclick={on_ask_delete} disabled={self.busy}>
                            { "Delete group" }
                        </button>
                    </div>

                    {
                        if self.confirm_delete {
                            html! {
                                <ConfirmModal
                                    message={format!("Delete group \"{}\"?", self.group.name)}
                                    on_confirm={on_confirm_delete}
                                    on_cancel={on_cancel_delete}
                                />
                            }
                        } else {
                            html! {}
                        }
                    }
                </div>
            </div>
        }
    }
}
