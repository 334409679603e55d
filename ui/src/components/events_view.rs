use dioxus::prelude::*;

use poap_common::event::{EventInfo, EventStatus};

use super::app::Route;
use super::services::use_services;

const PUBLIC_EVENT_LIMIT: u32 = 20;

/// Landing page: upcoming and running public events.
#[component]
pub fn EventsView() -> Element {
    let services = use_services();
    let mut events = use_signal(Vec::<EventInfo>::new);
    let mut error_msg = use_signal(|| None::<String>);
    let mut loading = use_signal(|| true);

    use_effect(move || {
        let api = services.api();
        spawn(async move {
            match api.public_events(Some(PUBLIC_EVENT_LIMIT)).await {
                Ok(list) => events.set(list),
                Err(e) => error_msg.set(Some(e.to_string())),
            }
            loading.set(false);
        });
    });

    let list = events.read().clone();

    rsx! {
        div { class: "events-view",
            h2 { "Events" }
            if *loading.read() {
                p { "Loading events…" }
            } else if let Some(err) = error_msg.read().as_ref() {
                p { class: "error", "{err}" }
            } else if list.is_empty() {
                p { "No public events right now." }
            } else {
                ul { class: "event-list",
                    for event in list {
                        EventCard { key: "{event.id}", event }
                    }
                }
            }
        }
    }
}

#[component]
fn EventCard(event: EventInfo) -> Element {
    let dates = format!(
        "{} – {}",
        event.date_start.format("%Y-%m-%d %H:%M"),
        event.date_end.format("%Y-%m-%d %H:%M")
    );
    let claimable = event.status == EventStatus::Active;

    rsx! {
        li { class: "event-card card",
            if let Some(url) = event.image_url.clone() {
                img { class: "event-image", src: "{url}", alt: "{event.title}" }
            }
            h3 { "{event.title}" }
            p { class: "event-meta", "{event.location} · {dates}" }
            if !event.description.is_empty() {
                p { "{event.description}" }
            }
            p { class: "event-stats",
                "{event.attendees} / {event.token_count} claimed · {event.status.label()}"
            }
            if claimable {
                Link { to: Route::Claim { event_id: event.id }, "Claim NFT" }
            }
        }
    }
}
