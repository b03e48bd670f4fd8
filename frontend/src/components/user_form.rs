//! Create / edit form for a user.

use shared::validate::{FieldErrors, FormMode, UserDraft};
use shared::workflow;
use shared::{Organization, User, Validate};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::TextField;
use crate::hooks::report_error;
use crate::utils;

#[derive(Properties, PartialEq)]
pub struct UserFormProps {
    /// `None` creates a new user
    #[prop_or_default]
    pub user: Option<User>,
    pub organizations: Vec<Organization>,
    /// Success message; the parent re-fetches
    pub on_saved: Callback<String>,
    pub on_cancel: Callback<()>,
}

#[function_component(UserForm)]
pub fn user_form(props: &UserFormProps) -> Html {
    let draft = use_state(|| {
        props
            .user
            .as_ref()
            .map(UserDraft::edit)
            .unwrap_or_else(UserDraft::create)
    });
    let errors = use_state(FieldErrors::new);
    let server_error = use_state(|| None::<String>);
    let submitting = use_state(|| false);
    let features = utils::features();

    let update = |field: &'static str, apply: fn(&mut UserDraft, String)| {
        let draft = draft.clone();
        let errors = errors.clone();
        Callback::from(move |value: String| {
            let mut next = (*draft).clone();
            apply(&mut next, value);
            draft.set(next);
            let mut remaining = (*errors).clone();
            remaining.clear(field);
            errors.set(remaining);
        })
    };

    let on_username = update("username", |d, v| d.username = v);
    let on_password = update("password", |d, v| d.password = v);
    let on_first_name = update("first_name", |d, v| d.first_name = v);
    let on_last_name = update("last_name", |d, v| d.last_name = v);
    let on_email = update("email", |d, v| d.email = v);
    let on_phone = update("phone", |d, v| d.phone = v);

    let toggle_org = {
        let draft = draft.clone();
        let errors = errors.clone();
        Callback::from(move |org_id: String| {
            let mut next = (*draft).clone();
            next.toggle_organization(&org_id);
            draft.set(next);
            let mut remaining = (*errors).clone();
            remaining.clear("organization_ids");
            errors.set(remaining);
        })
    };

    let toggle_mfa = {
        let draft = draft.clone();
        Callback::from(move |_: Event| {
            let mut next = (*draft).clone();
            next.mfa_enabled = !next.mfa_enabled;
            draft.set(next);
        })
    };

    let on_submit = {
        let draft = draft.clone();
        let errors = errors.clone();
        let server_error = server_error.clone();
        let submitting = submitting.clone();
        let on_saved = props.on_saved.clone();
        let user_id = props.user.as_ref().map(|u| u.id.clone());
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let found = draft.validate();
            if !found.is_empty() {
                errors.set(found);
                return;
            }

            let draft_value = (*draft).clone();
            let draft = draft.clone();
            let server_error = server_error.clone();
            let submitting = submitting.clone();
            let on_saved = on_saved.clone();
            let user_id = user_id.clone();
            submitting.set(true);
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result =
                    workflow::save_user(&api, user_id.as_deref(), &draft_value, &features).await;
                submitting.set(false);
                match result {
                    Ok(saved) => {
                        let mut message = match draft_value.mode {
                            FormMode::Create => "User created successfully".to_string(),
                            FormMode::Update => "User updated successfully".to_string(),
                        };
                        match &saved.mfa {
                            Some(Ok(())) => message.push_str(", MFA enabled"),
                            Some(Err(e)) => {
                                report_error("Failed to enable MFA", e);
                                message =
                                    format!("{} (MFA setup failed: {})", message, e.user_message());
                            }
                            None => {}
                        }
                        server_error.set(None);
                        draft.set(UserDraft::create());
                        on_saved.emit(message);
                    }
                    Err(e) => {
                        report_error("Failed to save user", &e);
                        server_error.set(Some(e.user_message()));
                    }
                }
            });
        })
    };

    let on_cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    let error_for = |field: &str| errors.get(field).map(|m| AttrValue::from(m.to_string()));
    let is_create = draft.mode == FormMode::Create;

    html! {
        <form class="entity-form user-form" onsubmit={on_submit}>
            <h2>{ if is_create { "Create User" } else { "Edit User" } }</h2>
            {
                if let Some(ref err) = *server_error {
                    html! { <div class="form-error">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <TextField label="Username" value={draft.username.clone()} on_input={on_username}
                error={error_for("username")} />
            <TextField
                label={if is_create { "Password" } else { "Password (leave blank to keep)" }}
                input_type="password"
                value={draft.password.clone()}
                on_input={on_password}
                error={error_for("password")}
            />
            <div class="form-row">
                <TextField label="First name" value={draft.first_name.clone()} on_input={on_first_name} />
                <TextField label="Last name" value={draft.last_name.clone()} on_input={on_last_name} />
            </div>
            <TextField label="Email" input_type="email" value={draft.email.clone()} on_input={on_email}
                error={error_for("email")} />
            <TextField label="Phone" value={draft.phone.clone()} on_input={on_phone}
                error={error_for("phone")} />

            <fieldset class="org-picker">
                <legend>{ "Organizations" }</legend>
                {
                    props.organizations.iter().map(|org| {
                        let checked = draft.organization_ids.contains(&org.id);
                        let toggle_org = toggle_org.clone();
                        let org_id = org.id.clone();
                        html! {
                            <label class="checkbox" key={org.id.clone()}>
                                <input
                                    type="checkbox"
                                    checked={checked}
                                    onchange={Callback::from(move |_: Event| toggle_org.emit(org_id.clone()))}
                                />
                                { &org.name }
                            </label>
                        }
                    }).collect::<Html>()
                }
                {
                    if let Some(err) = errors.get("organization_ids") {
                        html! { <span class="field-error">{ err }</span> }
                    } else {
                        html! {}
                    }
                }
            </fieldset>

            {
                if is_create && features.mfa_on_create {
                    html! {
                        <label class="checkbox">
                            <input type="checkbox" checked={draft.mfa_enabled} onchange={toggle_mfa} />
                            { "Enable MFA" }
                        </label>
                    }
                } else {
                    html! {}
                }
            }

            <div class="modal-actions">
                <button type="button" class="modal-cancel" onclick={on_cancel}>{ "Cancel" }</button>
                <button type="submit" class="modal-confirm" disabled={*submitting}>
                    { if *submitting { "Saving..." } else if is_create { "Create" } else { "Save" } }
                </button>
            </div>
        </form>
    }
}
