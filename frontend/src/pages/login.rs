use shared::auth::AuthStep;
use shared::validate::{FieldErrors, LoginDraft};
use shared::{workflow, AuthFlow, Validate};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::client::WasmApiClient;
use crate::components::TextField;
use crate::session_store::LocalStorageSessionStore;
use crate::utils;
use crate::Route;

/// Credentials step of the auth gate.
#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let navigator = use_navigator();
    let auth_mode = utils::features().auth_mode;
    let draft = use_state(LoginDraft::default);
    let errors = use_state(FieldErrors::new);
    let flow = use_state(|| AuthFlow::new(auth_mode));

    let on_username = {
        let draft = draft.clone();
        let errors = errors.clone();
        Callback::from(move |value: String| {
            draft.set(LoginDraft {
                username: value,
                ..(*draft).clone()
            });
            let mut remaining = (*errors).clone();
            remaining.clear("username");
            errors.set(remaining);
        })
    };

    let on_password = {
        let draft = draft.clone();
        let errors = errors.clone();
        Callback::from(move |value: String| {
            draft.set(LoginDraft {
                password: value,
                ..(*draft).clone()
            });
            let mut remaining = (*errors).clone();
            remaining.clear("password");
            errors.set(remaining);
        })
    };

    let on_submit = {
        let draft = draft.clone();
        let errors = errors.clone();
        let flow = flow.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if flow.is_pending() {
                return;
            }
            let found = draft.validate();
            if !found.is_empty() {
                errors.set(found);
                return;
            }

            let draft_value = (*draft).clone();
            let mut next = AuthFlow::new(auth_mode);
            let flow = flow.clone();
            let navigator = navigator.clone();
            // Show the pending state while the request is in flight
            let mut pending = next.clone();
            let _ = pending.submit_credentials(&draft_value.username);
            flow.set(pending);
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result =
                    workflow::login(&api, &LocalStorageSessionStore, &mut next, &draft_value).await;
                let target = match (&result, next.step()) {
                    (Ok(Some(_)), _) => Some(Route::Home),
                    (_, AuthStep::MfaRequired { user_id }) => Some(Route::MfaVerify {
                        user_id: user_id.clone(),
                    }),
                    _ => None,
                };
                if let Err(e) = &result {
                    log::error!("Login failed: {}", e);
                    if next.error().is_none() {
                        next.reject(e.user_message());
                    }
                }
                flow.set(next);
                if let (Some(route), Some(navigator)) = (target, navigator) {
                    log::info!("Login step complete, navigating to {}", route.to_path());
                    navigator.push(&route);
                }
            });
        })
    };

    let error_for = |field: &str| errors.get(field).map(|m| AttrValue::from(m.to_string()));
    let pending = flow.is_pending();

    html! {
        <div class="auth-container">
            <form class="auth-card" onsubmit={on_submit}>
                <h1>{ "Securita" }</h1>
                <p class="auth-subtitle">{ "Sign in to the admin console" }</p>
                {
                    if let Some(message) = flow.error() {
                        html! { <div class="form-error">{ message }</div> }
                    } else {
                        html! {}
                    }
                }
                <TextField label="Username" value={draft.username.clone()} on_input={on_username}
                    error={error_for("username")} disabled={pending} />
                <TextField label="Password" input_type="password" value={draft.password.clone()}
                    on_input={on_password} error={error_for("password")} disabled={pending} />
                <button type="submit" class="auth-submit" disabled={pending}>
                    { if pending { "Signing in..." } else { "Sign in" } }
                </button>
            </form>
        </div>
    }
}
