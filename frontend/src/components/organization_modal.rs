use shared::validate::{AdminDraft, FieldErrors};
use shared::{workflow, AdminApi, ApiError, EntityId, OrganizationDetail, Validate};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::StatusBadge;
use crate::hooks::report_error;

#[derive(Properties, PartialEq)]
pub struct OrganizationModalProps {
    pub organization_id: EntityId,
    pub on_close: Callback<()>,
    /// Something changed server-side; the parent should re-fetch
    pub on_changed: Callback<String>,
}

pub enum OrganizationModalMsg {
    Load,
    Loaded(Result<OrganizationDetail, ApiError>),
    ToggleActive,
    UpdateAdminUsername(String),
    UpdateAdminPassword(String),
    AssignAdmin,
    RemoveAdmin(EntityId),
    ActionDone(Result<String, ApiError>),
}

/// Detail view of one organization with its admin actions.
pub struct OrganizationModal {
    detail: Option<OrganizationDetail>,
    loading: bool,
    busy: bool,
    admin_draft: AdminDraft,
    field_errors: FieldErrors,
    error: Option<String>,
}

impl Component for OrganizationModal {
    type Message = OrganizationModalMsg;
    type Properties = OrganizationModalProps;

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_message(OrganizationModalMsg::Load);
        Self {
            detail: None,
            loading: true,
            busy: false,
            admin_draft: AdminDraft::default(),
            field_errors: FieldErrors::new(),
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let org_id = ctx.props().organization_id.clone();
        match msg {
            OrganizationModalMsg::Load => {
                self.loading = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = api.get_organization(&org_id).await;
                    link.send_message(OrganizationModalMsg::Loaded(result));
                });
                true
            }
            OrganizationModalMsg::Loaded(Ok(detail)) => {
                self.detail = Some(detail);
                self.loading = false;
                true
            }
            OrganizationModalMsg::Loaded(Err(e)) => {
                report_error("Failed to load organization", &e);
                self.loading = false;
                if e.is_not_found() {
                    ctx.props().on_changed.emit(e.user_message());
                    ctx.props().on_close.emit(());
                    return false;
                }
                self.error = Some(e.user_message());
                true
            }
            OrganizationModalMsg::ToggleActive => {
                let Some(active) = self.detail.as_ref().map(|d| d.organization.active) else {
                    return false;
                };
                self.busy = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = api
                        .set_organization_active(&org_id, !active)
                        .await
                        .map(|_| {
                            if active {
                                "Organization deactivated".to_string()
                            } else {
                                "Organization activated".to_string()
                            }
                        });
                    link.send_message(OrganizationModalMsg::ActionDone(result));
                });
                true
            }
            OrganizationModalMsg::UpdateAdminUsername(value) => {
                self.admin_draft.username = value;
                self.field_errors.clear("admin_username");
                true
            }
            OrganizationModalMsg::UpdateAdminPassword(value) => {
                self.admin_draft.password = value;
                self.field_errors.clear("admin_password");
                true
            }
            OrganizationModalMsg::AssignAdmin => {
                let found = self.admin_draft.validate();
                if !found.is_empty() {
                    self.field_errors = found;
                    return true;
                }
                self.busy = true;
                let draft = self.admin_draft.clone();
                let link = ctx.link().clone();
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::assign_admin(&api, &org_id, &draft)
                        .await
                        .map(|_| "Admin assigned successfully".to_string());
                    link.send_message(OrganizationModalMsg::ActionDone(result));
                });
                true
            }
            OrganizationModalMsg::RemoveAdmin(user_id) => {
                self.busy = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let api = WasmApiClient::from_session();
                    let result = workflow::remove_admin(&api, &org_id, &user_id)
                        .await
                        .map(|_| "Admin removed successfully".to_string());
                    link.send_message(OrganizationModalMsg::ActionDone(result));
                });
                true
            }
            OrganizationModalMsg::ActionDone(Ok(message)) => {
                self.busy = false;
                self.error = None;
                self.admin_draft = AdminDraft::default();
                ctx.props().on_changed.emit(message);
                ctx.link().send_message(OrganizationModalMsg::Load);
                true
            }
            OrganizationModalMsg::ActionDone(Err(e)) => {
                report_error("Organization action failed", &e);
                self.busy = false;
                if e.is_not_found() {
                    ctx.props().on_changed.emit(e.user_message());
                    ctx.props().on_close.emit(());
                    return false;
                }
                self.error = Some(e.user_message());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_close = ctx.props().on_close.clone();
        let on_overlay_click = {
            let on_close = on_close.clone();
            Callback::from(move |_| on_close.emit(()))
        };
        let on_dialog_click = Callback::from(|e: MouseEvent| e.stop_propagation());

        html! {
            <div class="modal-overlay" onclick={on_overlay_click}>
                <div class="modal-content detail-modal" onclick={on_dialog_click}>
                    <div class="modal-header">
                        <h2>{ self.detail.as_ref().map(|d| d.organization.name.clone()).unwrap_or_else(|| "Organization".to_string()) }</h2>
                        <button class="modal-close" onclick={move |_| on_close.emit(())}>{ "×" }</button>
                    </div>
                    {
                        if let Some(error) = &self.error {
                            html! { <div class="form-error">{ error }</div> }
                        } else {
                            html! {}
                        }
                    }
                    {
                        match &self.detail {
                            _ if self.loading && self.detail.is_none() => html! {
                                <div class="modal-loading">{ "Loading..." }</div>
                            },
                            Some(detail) => self.view_detail(ctx, detail),
                            None => html! {},
                        }
                    }
                </div>
            </div>
        }
    }
}

impl OrganizationModal {
    fn view_detail(&self, ctx: &Context<Self>, detail: &OrganizationDetail) -> Html {
        let org = &detail.organization;
        let on_toggle = ctx.link().callback(|_: MouseEvent| OrganizationModalMsg::ToggleActive);
        let on_username = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            OrganizationModalMsg::UpdateAdminUsername(input.value())
        });
        let on_password = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            OrganizationModalMsg::UpdateAdminPassword(input.value())
        });
        let on_assign = ctx.link().callback(|_: MouseEvent| OrganizationModalMsg::AssignAdmin);

        html! {
            <div class="organization-detail">
                <dl class="detail-grid">
                    <dt>{ "Status" }</dt>
                    <dd><StatusBadge active={org.active} /></dd>
                    <dt>{ "Users" }</dt>
                    <dd>{ detail.user_count }</dd>
                    <dt>{ "Primary admin" }</dt>
                    <dd>{ detail.primary_admin().unwrap_or("-") }</dd>
                </dl>

                <button class="toggle-btn" onclick={on_toggle} disabled={self.busy}>
                    { if org.active { "Deactivate" } else { "Activate" } }
                </button>

                <h3>{ format!("Admins ({})", detail.admins.len()) }</h3>
                <ul class="member-list">
                    {
                        detail.admins.iter().map(|admin| {
                            let user_id = admin.id.clone();
                            let on_remove = ctx.link().callback(move |_: MouseEvent| {
                                OrganizationModalMsg::RemoveAdmin(user_id.clone())
                            });
                            html! {
                                <li key={admin.id.clone()}>
                                    <span>{ &admin.username }</span>
                                    <button class="member-remove" onclick={on_remove} disabled={self.busy}
                                        title="Remove admin">{ "×" }</button>
                                </li>
                            }
                        }).collect::<Html>()
                    }
                </ul>

                <div class="assign-admin">
                    <h3>{ "Assign admin" }</h3>
                    <input type="text" placeholder="Username" value={self.admin_draft.username.clone()}
                        oninput={on_username} />
                    { self.field_error("admin_username") }
                    <input type="password" placeholder="Password" value={self.admin_draft.password.clone()}
                        oninput={on_password} />
                    { self.field_error("admin_password") }
                    <button onclick={on_assign} disabled={self.busy}>{ "Assign" }</button>
                </div>
            </div>
        }
    }

    fn field_error(&self, field: &str) -> Html {
        match self.field_errors.get(field) {
            Some(message) => html! { <span class="field-error">{ message }</span> },
            None => html! {},
        }
    }
}
