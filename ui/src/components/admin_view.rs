use dioxus::prelude::*;

use poap_api::ApiError;
use poap_common::event::PlatformStats;

use super::hooks::{sleep_ms, use_signed_in};
use super::services::use_services;

const STATS_POLL_MS: u32 = 10_000;

/// Platform statistics, refreshed every few seconds while mounted.
#[component]
pub fn AdminView() -> Element {
    let services = use_services();
    let signed_in = use_signed_in();
    let mut stats = use_signal(|| None::<PlatformStats>);
    let mut error_msg = use_signal(|| None::<String>);

    use_coroutine(move |_: UnboundedReceiver<()>| {
        let api = services.api();
        async move {
            loop {
                if signed_in.account().is_some() {
                    match api.admin_stats().await {
                        Ok(s) => {
                            stats.set(Some(s));
                            error_msg.set(None);
                        }
                        Err(ApiError::Unauthorized) => {
                            error_msg.set(Some("Admin access required".to_string()));
                        }
                        Err(e) => error_msg.set(Some(e.to_string())),
                    }
                }
                sleep_ms(STATS_POLL_MS).await;
            }
        }
    });

    let current = stats.read().clone();

    rsx! {
        div { class: "admin-view",
            h2 { "Platform statistics" }
            if signed_in.account().is_none() {
                p { "Sign in with an admin account." }
            }
            if let Some(err) = error_msg.read().as_ref() {
                p { class: "error", "{err}" }
            }
            if let Some(s) = current {
                div { class: "stats-grid",
                    StatCard { label: "Users", value: s.users }
                    StatCard { label: "Organizers", value: s.organizers }
                    StatCard { label: "Events", value: s.events.total() }
                    StatCard { label: "NFTs claimed", value: s.claimed_nfts }
                }
                table { class: "event-counts",
                    tbody {
                        tr { td { "Pending" } td { "{s.events.pending}" } }
                        tr { td { "Active" } td { "{s.events.active}" } }
                        tr { td { "Closed" } td { "{s.events.closed}" } }
                        tr { td { "Canceled" } td { "{s.events.canceled}" } }
                    }
                }
            }
        }
    }
}

#[component]
fn StatCard(label: &'static str, value: u64) -> Element {
    rsx! {
        div { class: "stat-card card",
            span { class: "stat-value", "{value}" }
            span { class: "stat-label", "{label}" }
        }
    }
}
