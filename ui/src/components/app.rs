use dioxus::prelude::*;

use poap_api::ApiError;

use super::admin_view::AdminView;
use super::claim_view::ClaimView;
use super::events_view::EventsView;
use super::hooks::{
    refresh_wallet_status, sleep_ms, use_notice, use_notice_provider, use_signed_in,
    use_signed_in_provider, use_wallet_status_provider,
};
use super::organizer_view::OrganizerView;
use super::services::{use_services, Services};
use super::wallet_bar::WalletBar;

const HEARTBEAT_MS: u32 = 30_000;
/// Heartbeats between token refreshes.
const REFRESH_EVERY: u32 = 10;

#[derive(Clone, Debug, PartialEq, Routable)]
pub enum Route {
    #[layout(AppLayout)]
    #[route("/")]
    Home {},
    #[route("/claim/:event_id")]
    Claim { event_id: u32 },
    #[route("/organizer")]
    Organizer {},
    #[route("/admin")]
    Admin {},
}

#[component]
pub fn App() -> Element {
    let services = use_hook(Services::build);

    match services {
        Ok(services) => rsx! { Shell { services } },
        Err(err) => rsx! {
            div { class: "poap-app",
                p { class: "error", "Failed to start: {err}" }
            }
        },
    }
}

/// Installs the shared contexts, restores the last wallet session and keeps
/// the backend connection alive.
#[component]
fn Shell(services: Services) -> Element {
    use_context_provider(|| services.clone());
    let status = use_wallet_status_provider(services.registry.clone());
    let signed_in = use_signed_in_provider();
    let notice = use_notice_provider();
    let mut online = use_context_provider(|| Signal::new(true));

    // Reconnect the wallet used last time
    {
        let services = services.clone();
        use_hook(move || {
            spawn(async move {
                if let Err(err) = services.registry.restore_selection().await {
                    tracing::warn!(%err, "could not restore wallet session");
                }
                refresh_wallet_status(status, &services.registry);
            });
        });
    }

    // Pick up a cached backend token whenever the connected account changes
    {
        let services = services.clone();
        use_effect(move || {
            let account = status.read().account().map(str::to_string);
            match account {
                Some(account) if services.auth.resume(&account) => {
                    tracing::info!(%account, "resumed backend session");
                    signed_in.set(Some(account));
                }
                _ => {
                    services.auth.client().set_token(None);
                    signed_in.set(None);
                }
            }
        });
    }

    use_coroutine(move |_: UnboundedReceiver<()>| {
        let services = services.clone();
        async move {
            let mut ticks = 0u32;
            loop {
                let alive = services.api().heartbeat().await;
                if let Err(err) = &alive {
                    tracing::debug!(%err, "heartbeat failed");
                }
                online.set(alive.is_ok());

                ticks += 1;
                if alive.is_ok() && ticks % REFRESH_EVERY == 0 {
                    if let Some(account) = signed_in.account() {
                        match services.auth.refresh(&account).await {
                            Ok(()) => tracing::debug!(%account, "token refreshed"),
                            Err(ApiError::Unauthorized) => {
                                signed_in.set(None);
                                notice.show("Session expired, please sign in again");
                            }
                            Err(err) => tracing::warn!(%err, "token refresh failed"),
                        }
                    }
                }
                sleep_ms(HEARTBEAT_MS).await;
            }
        }
    });

    rsx! { Router::<Route> {} }
}

#[component]
fn AppLayout() -> Element {
    let services = use_services();
    let notice = use_notice();
    let signed_in = use_signed_in();
    let online = use_context::<Signal<bool>>();
    let nav = use_navigator();

    let message = notice.0.read().clone();
    let network = services.config.network;

    rsx! {
        div { class: "poap-app",
            header { class: "app-header",
                div { class: "header-top",
                    h1 { "POAP" }
                    span { class: "network-badge", "{network}" }
                    WalletBar {}
                }
                nav {
                    button {
                        onclick: move |_| { nav.push(Route::Home {}); },
                        "Events"
                    }
                    button {
                        onclick: move |_| { nav.push(Route::Organizer {}); },
                        "Organizer"
                    }
                    if signed_in.account().is_some() {
                        button {
                            onclick: move |_| { nav.push(Route::Admin {}); },
                            "Admin"
                        }
                    }
                }
            }
            if !*online.read() {
                div { class: "offline-banner", "The platform is unreachable. Retrying…" }
            }
            if let Some(message) = message {
                div { class: "notice",
                    span { "{message}" }
                    button { class: "close", onclick: move |_| notice.dismiss(), "×" }
                }
            }
            main {
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Home() -> Element {
    rsx! { EventsView {} }
}

/// Route component: claim page for the event in the URL.
#[component]
fn Claim(event_id: u32) -> Element {
    rsx! { ClaimView { key: "{event_id}", event_id } }
}

#[component]
fn Organizer() -> Element {
    rsx! { OrganizerView {} }
}

#[component]
fn Admin() -> Element {
    rsx! { AdminView {} }
}
