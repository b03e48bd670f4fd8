use shared::validate::{AdminDraft, FieldErrors, OrganizationDraft};
use shared::{workflow, Validate};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::client::WasmApiClient;
use crate::components::TextField;
use crate::hooks::report_error;
use crate::utils;

#[derive(Properties, PartialEq)]
pub struct OrganizationFormProps {
    pub on_saved: Callback<String>,
    pub on_cancel: Callback<()>,
}

fn empty_draft(with_admin: bool) -> OrganizationDraft {
    OrganizationDraft {
        name: String::new(),
        admin: with_admin.then(AdminDraft::default),
    }
}

/// New organization, plus its first admin when admin assignment is enabled.
#[function_component(OrganizationForm)]
pub fn organization_form(props: &OrganizationFormProps) -> Html {
    let features = utils::features();
    let draft = use_state(|| empty_draft(features.admin_assignment));
    let errors = use_state(FieldErrors::new);
    let server_error = use_state(|| None::<String>);
    let submitting = use_state(|| false);

    let update = |field: &'static str, apply: fn(&mut OrganizationDraft, String)| {
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

    let on_name = update("name", |d, v| d.name = v);
    let on_admin_username = update("admin_username", |d, v| {
        if let Some(admin) = d.admin.as_mut() {
            admin.username = v;
        }
    });
    let on_admin_password = update("admin_password", |d, v| {
        if let Some(admin) = d.admin.as_mut() {
            admin.password = v;
        }
    });

    let on_submit = {
        let draft = draft.clone();
        let errors = errors.clone();
        let server_error = server_error.clone();
        let submitting = submitting.clone();
        let on_saved = props.on_saved.clone();
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
            submitting.set(true);
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result = workflow::create_organization(&api, &draft_value, &features).await;
                submitting.set(false);
                match result {
                    Ok(created) => {
                        let message = match created.admin {
                            Some(Err(e)) => {
                                report_error("Failed to create admin", &e);
                                format!(
                                    "Organization created, but admin creation failed: {}",
                                    e.user_message()
                                )
                            }
                            Some(Ok(())) => "Organization and admin created successfully".to_string(),
                            None => "Organization created successfully".to_string(),
                        };
                        server_error.set(None);
                        draft.set(empty_draft(features.admin_assignment));
                        on_saved.emit(message);
                    }
                    Err(e) => {
                        report_error("Failed to create organization", &e);
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

    html! {
        <form class="entity-form organization-form" onsubmit={on_submit}>
            <h2>{ "Create Organization" }</h2>
            {
                if let Some(ref err) = *server_error {
                    html! { <div class="form-error">{ err }</div> }
                } else {
                    html! {}
                }
            }
            <TextField label="Organization name" value={draft.name.clone()} on_input={on_name}
                error={error_for("name")} />
            {
                if let Some(ref admin) = draft.admin {
                    html! {
                        <fieldset class="admin-fields">
                            <legend>{ "Organization admin" }</legend>
                            <TextField label="Admin username" value={admin.username.clone()}
                                on_input={on_admin_username} error={error_for("admin_username")} />
                            <TextField label="Admin password" input_type="password"
                                value={admin.password.clone()} on_input={on_admin_password}
                                error={error_for("admin_password")} />
                        </fieldset>
                    }
                } else {
                    html! {}
                }
            }
            <div class="modal-actions">
                <button type="button" class="modal-cancel" onclick={on_cancel}>{ "Cancel" }</button>
                <button type="submit" class="modal-confirm" disabled={*submitting}>
                    { if *submitting { "Creating..." } else { "Create" } }
                </button>
            </div>
        </form>
    }
}
