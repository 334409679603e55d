use dioxus::prelude::*;

use poap_common::backend::ClaimBackend;
use poap_common::claim::{ClaimFlow, ClaimRequest, ClaimStep};
use poap_common::event::EventInfo;
use poap_common::workflow::StepOutcome;

use super::hooks::{use_notice, use_signed_in, use_task_scope, use_wallet_status};
use super::services::use_services;
use super::steps::{step_list, SigningLinks};

/// Attendee claim page for one event: connect, claim, summary.
#[component]
pub fn ClaimView(event_id: u32) -> Element {
    let services = use_services();
    let status = use_wallet_status();
    let signed_in = use_signed_in();
    let notice = use_notice();
    let scope = use_task_scope();

    let mut flow = use_signal(move || ClaimFlow::new(event_id));
    let mut event = use_signal(|| None::<EventInfo>);
    let mut pending = use_signal(|| None::<(String, String)>);
    let mut busy = use_signal(|| false);

    // Event details
    {
        let api = services.api();
        use_effect(move || {
            let api = api.clone();
            spawn(async move {
                match api.event_info(event_id).await {
                    Ok(info) => event.set(Some(info)),
                    Err(err) => notice.show(err.to_string()),
                }
            });
        });
    }

    // Connection drives the Connect step
    use_effect(move || {
        let connected = status.read().snapshot.is_active();
        flow.write().set_connected(connected);
    });

    // Whether the signed-in account already holds the NFT
    {
        let api = services.api();
        use_effect(move || {
            let Some(account) = signed_in.0.read().clone() else {
                return;
            };
            let api = api.clone();
            spawn(async move {
                match api.claim_status(event_id, &account).await {
                    Ok(offer) => flow.write().set_claimed(offer.is_some_and(|o| o.claimed)),
                    Err(err) => tracing::warn!(%err, event_id, "claim status unavailable"),
                }
            });
        });
    }

    let on_claim = {
        let services = services.clone();
        move |_| {
            let services = services.clone();
            let scope = scope.clone();
            spawn(async move {
                let connector = services.registry.active();
                let (Some(account), Some(provider)) =
                    (connector.state().account(), connector.provider())
                else {
                    notice.show("Connect a wallet first");
                    return;
                };
                if signed_in.account().as_deref() != Some(account.as_str()) {
                    notice.show("Sign in with your wallet first");
                    return;
                }

                busy.set(true);
                flow.write().clear_error();
                let api = services.api();
                let attempt = async {
                    match ClaimFlow::request(&*api, provider.as_ref(), event_id, &account)
                        .await
                    {
                        Ok(ClaimRequest::AlreadyClaimed) => StepOutcome::AlreadyDone,
                        Ok(ClaimRequest::Signing(request)) => {
                            if let (Some(deep), Some(web)) =
                                (request.deep_link(), request.web_link())
                            {
                                pending.set(Some((deep, web)));
                            }
                            let outcome = StepOutcome::from_request(request).await;
                            pending.set(None);
                            outcome
                        }
                        Err(message) => StepOutcome::Failed(message),
                    }
                };
                if let Some(outcome) = scope.guard(attempt).await {
                    flow.write().finish_claim(outcome);
                    busy.set(false);
                }
            });
        }
    };

    let current = flow.read().clone();
    let active = current.workflow().active_step();
    let is_busy = *busy.read();
    let (title, meta) = match event.read().as_ref() {
        Some(info) => (
            info.title.clone(),
            Some(format!("{} · {}", info.location, info.date_start.format("%Y-%m-%d"))),
        ),
        None => (format!("Event #{event_id}"), None),
    };

    rsx! {
        div { class: "claim-view card",
            h2 { "Claim your attendance NFT" }
            h3 { "{title}" }
            if let Some(meta) = meta {
                p { class: "event-meta", "{meta}" }
            }

            {step_list(current.workflow())}

            {match active {
                Some(ClaimStep::Connect) => rsx! {
                    p { "Connect a wallet using the buttons above." }
                },
                Some(ClaimStep::Claim) => rsx! {
                    if let Some((deep, web)) = pending.read().clone() {
                        SigningLinks { deep_link: deep, web_link: web }
                    }
                    button {
                        disabled: is_busy,
                        onclick: on_claim,
                        if is_busy { "Claiming…" } else { "Claim NFT" }
                    }
                },
                Some(ClaimStep::Summary) => rsx! {
                    p { "The NFT is in your wallet." }
                    if let Some(hash) = current.claim_hash() {
                        p { class: "mono", "Transaction: {hash}" }
                    }
                    button {
                        onclick: move |_| flow.write().acknowledge(),
                        "Done"
                    }
                },
                None => rsx! {
                    p { "All done. Enjoy the event!" }
                },
            }}
        }
    }
}
