mod client;
mod components;
mod hooks;
mod pages;
mod session_store;
pub mod utils;

use components::Navbar;
use pages::{
    active_sessions::ActiveSessionsPage, groups::GroupsPage, history::HistoryPage,
    home::HomePage, login::LoginPage, mfa_verify::MfaVerifyPage,
    organizations::OrganizationsPage, users::UsersPage,
};
use session_store::LocalStorageSessionStore;
use shared::SessionStore;
use yew::prelude::*;
use yew_router::prelude::*;

#[derive(Clone, Debug, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Root,
    #[at("/login")]
    Login,
    #[at("/mfa-verify/:user_id")]
    MfaVerify { user_id: String },
    #[at("/home-page")]
    Home,
    #[at("/organization")]
    Organizations,
    #[at("/users")]
    Users,
    #[at("/groups")]
    Groups,
    #[at("/active-sessions")]
    ActiveSessions,
    #[at("/history")]
    History,
    #[not_found]
    #[at("/404")]
    NotFound,
}

#[derive(Properties, PartialEq)]
struct ConsoleShellProps {
    children: Html,
}

/// Console chrome for signed-in pages; anyone else goes back to login.
#[function_component(ConsoleShell)]
fn console_shell(props: &ConsoleShellProps) -> Html {
    if !LocalStorageSessionStore.is_authenticated() {
        return html! { <Redirect<Route> to={Route::Login} /> };
    }
    html! {
        <div class="console">
            <Navbar />
            <main class="console-main">{ props.children.clone() }</main>
        </div>
    }
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Root | Route::Login | Route::NotFound => html! { <LoginPage /> },
        Route::MfaVerify { user_id } => html! { <MfaVerifyPage user_id={user_id} /> },
        Route::Home => html! { <ConsoleShell><HomePage /></ConsoleShell> },
        Route::Organizations => html! { <ConsoleShell><OrganizationsPage /></ConsoleShell> },
        Route::Users => html! { <ConsoleShell><UsersPage /></ConsoleShell> },
        Route::Groups => html! { <ConsoleShell><GroupsPage /></ConsoleShell> },
        Route::ActiveSessions => html! { <ConsoleShell><ActiveSessionsPage /></ConsoleShell> },
        Route::History => html! { <ConsoleShell><HistoryPage /></ConsoleShell> },
    }
}

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
