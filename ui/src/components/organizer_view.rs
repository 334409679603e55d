use dioxus::prelude::*;

use poap_common::event::{EventInfo, EventStatus};

use super::app::Route;
use super::event_setup_view::EventSetupView;
use super::hooks::{use_notice, use_signed_in};
use super::services::use_services;

/// Events owned by the signed-in organizer, plus the create dialog.
#[component]
pub fn OrganizerView() -> Element {
    let services = use_services();
    let signed_in = use_signed_in();
    let notice = use_notice();

    let mut events = use_signal(Vec::<EventInfo>::new);
    let mut loading = use_signal(|| false);
    let mut creating = use_signal(|| false);
    let mut reload = use_signal(|| 0u32);

    {
        let services = services.clone();
        use_effect(move || {
            let _ = reload.read();
            if signed_in.0.read().is_none() {
                events.set(Vec::new());
                return;
            }
            let api = services.api();
            spawn(async move {
                loading.set(true);
                match api.owned_events().await {
                    Ok(list) => events.set(list),
                    Err(e) => notice.show(format!("Could not load your events: {e}")),
                }
                loading.set(false);
            });
        });
    }

    if signed_in.account().is_none() {
        return rsx! {
            div { class: "organizer-view card",
                h2 { "Organizer" }
                p { "Connect a wallet and sign in to manage your events." }
            }
        };
    }

    let list = events.read().clone();

    rsx! {
        div { class: "organizer-view",
            div { class: "section-header",
                h2 { "Your events" }
                button {
                    disabled: *creating.read(),
                    onclick: move |_| creating.set(true),
                    "Create event"
                }
            }

            if *creating.read() {
                EventSetupView {
                    on_close: move |_| {
                        creating.set(false);
                        *reload.write() += 1;
                    },
                }
            }

            if *loading.read() {
                p { "Loading…" }
            } else if list.is_empty() {
                p { "You have not created any events yet." }
            } else {
                table { class: "event-table",
                    thead {
                        tr {
                            th { "#" }
                            th { "Title" }
                            th { "Dates" }
                            th { "Claimed" }
                            th { "Status" }
                            th {}
                        }
                    }
                    tbody {
                        for event in list {
                            OwnedEventRow {
                                key: "{event.id}",
                                event,
                                on_changed: move |_| *reload.write() += 1,
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn OwnedEventRow(event: EventInfo, on_changed: EventHandler<()>) -> Element {
    let services = use_services();
    let notice = use_notice();
    let mut canceling = use_signal(|| false);

    let event_id = event.id;
    let cancelable = matches!(event.status, EventStatus::Pending | EventStatus::Active);
    let dates = format!(
        "{} – {}",
        event.date_start.format("%Y-%m-%d"),
        event.date_end.format("%Y-%m-%d")
    );

    rsx! {
        tr {
            td { "{event_id}" }
            td {
                Link { to: Route::Claim { event_id }, "{event.title}" }
            }
            td { "{dates}" }
            td { "{event.attendees} / {event.token_count}" }
            td { "{event.status.label()}" }
            td {
                if cancelable {
                    button {
                        class: "danger",
                        disabled: *canceling.read(),
                        onclick: move |_| {
                            let api = services.api();
                            spawn(async move {
                                canceling.set(true);
                                match api.cancel_event(event_id).await {
                                    Ok(()) => {
                                        tracing::info!(event_id, "event canceled");
                                        on_changed.call(());
                                    }
                                    Err(e) => notice.show(format!("Cancel failed: {e}")),
                                }
                                canceling.set(false);
                            });
                        },
                        "Cancel"
                    }
                }
            }
        }
    }
}
