use shared::auth::AuthStep;
use shared::validate::{sanitize_otp, OtpDraft};
use shared::{workflow, AuthFlow, QrOutcome, Validate};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::client::WasmApiClient;
use crate::session_store::LocalStorageSessionStore;
use crate::utils;
use crate::Route;

#[derive(Properties, PartialEq)]
pub struct MfaVerifyPageProps {
    pub user_id: AttrValue,
}

/// Second factor: provisioning QR (first enrollment only) and the 6-digit code.
#[function_component(MfaVerifyPage)]
pub fn mfa_verify_page(props: &MfaVerifyPageProps) -> Html {
    let navigator = use_navigator();
    let auth_mode = utils::features().auth_mode;
    let flow = use_state(|| AuthFlow::resume_mfa(auth_mode, props.user_id.to_string()));
    let code = use_state(String::new);

    // Fetch the QR once per user id
    {
        let flow = flow.clone();
        use_effect_with(props.user_id.clone(), move |user_id| {
            let mut next = AuthFlow::resume_mfa(auth_mode, user_id.to_string());
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                if let Err(e) = workflow::fetch_qr(&api, &mut next).await {
                    log::error!("Failed to load MFA QR code: {}", e);
                }
                flow.set(next);
            });
            || ()
        });
    }

    let on_code_input = {
        let code = code.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let sanitized = sanitize_otp(&input.value());
            // Reflect the stripped value back into the field
            input.set_value(&sanitized);
            code.set(sanitized);
        })
    };

    let on_submit = {
        let flow = flow.clone();
        let code = code.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if !matches!(flow.step(), AuthStep::AwaitingOtp { .. }) {
                return;
            }
            let draft = OtpDraft {
                code: (*code).clone(),
            };
            let mut next = (*flow).clone();
            let mut pending = next.clone();
            if draft.validate().is_empty() && pending.submit_otp().is_ok() {
                flow.set(pending);
            }
            let flow = flow.clone();
            let navigator = navigator.clone();
            spawn_local(async move {
                let api = WasmApiClient::from_session();
                let result =
                    workflow::verify_otp(&api, &LocalStorageSessionStore, &mut next, &draft).await;
                let authenticated = matches!(result, Ok(Some(_)));
                if let Err(e) = &result {
                    log::error!("MFA verification failed: {}", e);
                }
                flow.set(next);
                if authenticated {
                    log::info!("MFA verified");
                    if let Some(navigator) = navigator {
                        navigator.push(&Route::Home);
                    }
                }
            });
        })
    };

    let (qr, pending) = match flow.step() {
        AuthStep::AwaitingOtp { qr, .. } => (Some(qr.clone()), false),
        AuthStep::OtpPending { qr, .. } => (Some(qr.clone()), true),
        _ => (None, false),
    };

    html! {
        <div class="auth-container">
            <form class="auth-card mfa-card" onsubmit={on_submit}>
                <h1>{ "Two-factor verification" }</h1>
                {
                    match qr {
                        None => html! { <div class="modal-loading">{ "Loading..." }</div> },
                        Some(QrOutcome::Image(src)) => html! {
                            <div class="mfa-qr">
                                <p>{ "Scan this code with your authenticator app, then enter the 6-digit code." }</p>
                                <img src={src} alt="MFA QR code" />
                            </div>
                        },
                        Some(QrOutcome::AlreadyShown) => html! {
                            <p class="mfa-note">{ "Enter the 6-digit code from your authenticator app." }</p>
                        },
                    }
                }
                {
                    if let Some(message) = flow.error() {
                        html! { <div class="form-error">{ message }</div> }
                    } else {
                        html! {}
                    }
                }
                <input
                    class="otp-input"
                    type="text"
                    inputmode="numeric"
                    autocomplete="one-time-code"
                    maxlength="6"
                    placeholder="000000"
                    value={(*code).clone()}
                    oninput={on_code_input}
                    disabled={pending}
                />
                <button type="submit" class="auth-submit" disabled={pending || code.is_empty()}>
                    { if pending { "Verifying..." } else { "Verify" } }
                </button>
            </form>
        </div>
    }
}
