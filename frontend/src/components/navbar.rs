use shared::workflow;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::client::WasmApiClient;
use crate::session_store::LocalStorageSessionStore;
use crate::Route;

const LINKS: [(Route, &str); 6] = [
    (Route::Home, "Home"),
    (Route::Organizations, "Organizations"),
    (Route::Users, "Users"),
    (Route::Groups, "Groups"),
    (Route::ActiveSessions, "Active Sessions"),
    (Route::History, "History"),
];

#[function_component(Navbar)]
pub fn navbar() -> Html {
    let navigator = use_navigator();
    let current = use_route::<Route>();

    let on_logout = Callback::from(move |_: MouseEvent| {
        let navigator = navigator.clone();
        spawn_local(async move {
            let api = WasmApiClient::from_session();
            if let Err(e) = workflow::logout(&api, &LocalStorageSessionStore).await {
                log::error!("Logout failed: {}", e);
            }
            log::info!("Logged out");
            if let Some(navigator) = navigator {
                navigator.push(&Route::Login);
            }
        });
    });

    html! {
        <nav class="navbar">
            <span class="navbar-brand">{ "Securita" }</span>
            <ul class="navbar-links">
                {
                    LINKS.iter().map(|(route, label)| {
                        let active = current.as_ref() == Some(route);
                        html! {
                            <li class={classes!(active.then_some("active"))}>
                                <Link<Route> to={route.clone()}>{ *label }</Link<Route>>
                            </li>
                        }
                    }).collect::<Html>()
                }
            </ul>
            <button class="logout-btn" onclick={on_logout}>{ "Logout" }</button>
        </nav>
    }
}
