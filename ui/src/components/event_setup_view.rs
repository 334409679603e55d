use chrono::{DateTime, NaiveDateTime, Utc};
use dioxus::prelude::*;

use poap_common::event::EventDraft;
use poap_common::event_setup::{EventSetupFlow, EventSetupStep};
use poap_common::network::NetworkId;
use poap_common::transaction::drops_to_xrp;
use poap_common::workflow::StepOutcome;

use super::app::Route;
use super::hooks::{use_notice, use_signed_in, use_task_scope, use_wallet_status};
use super::services::use_services;
use super::steps::{step_list, SigningLinks};

const DATETIME_INPUT: &str = "%Y-%m-%dT%H:%M";

#[derive(Clone, Debug, Default, PartialEq)]
struct EventForm {
    title: String,
    description: String,
    location: String,
    image_url: String,
    token_count: String,
    date_start: String,
    date_end: String,
    is_managed: bool,
}

fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_INPUT)
        .map(|dt| dt.and_utc())
        .map_err(|_| format!("{field} is not a valid date"))
}

impl EventForm {
    fn to_draft(&self, network_id: NetworkId) -> Result<EventDraft, String> {
        let token_count = self
            .token_count
            .trim()
            .parse()
            .map_err(|_| "Token count must be a whole number".to_string())?;
        let image_url = Some(self.image_url.trim().to_string()).filter(|u| !u.is_empty());
        let draft = EventDraft {
            network_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            image_url,
            token_count,
            date_start: parse_datetime(&self.date_start, "Start")?,
            date_end: parse_datetime(&self.date_end, "End")?,
            is_managed: self.is_managed,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Organizer dialog: authorize the minter, register the event, pay the
/// deposit.
#[component]
pub fn EventSetupView(on_close: EventHandler<()>) -> Element {
    let services = use_services();
    let status = use_wallet_status();
    let signed_in = use_signed_in();
    let notice = use_notice();
    let scope = use_task_scope();

    let mut flow = use_signal(EventSetupFlow::new);
    let mut form = use_signal(EventForm::default);
    let mut pending = use_signal(|| None::<(String, String)>);
    let mut busy = use_signal(|| false);

    use_effect(move || {
        let connected = status.read().snapshot.is_active();
        flow.write().set_connected(connected);
    });

    // Platform addresses and minter authorization for the signed-in account
    {
        let api = services.api();
        let scope = scope.clone();
        use_effect(move || {
            let Some(account) = signed_in.0.read().clone() else {
                return;
            };
            let api = api.clone();
            let scope = scope.clone();
            spawn(async move {
                let fetch = EventSetupFlow::fetch_platform(&*api, &account);
                if let Some(loaded) = scope.guard(fetch).await {
                    flow.write().apply_platform(loaded);
                }
            });
        });
    }

    let on_authorize = {
        let services = services.clone();
        let scope = scope.clone();
        move |_| {
            let Some(provider) = services.registry.active().provider() else {
                notice.show("Connect a wallet first");
                return;
            };
            let scope = scope.clone();
            spawn(async move {
                busy.set(true);
                flow.write().clear_error(EventSetupStep::Authorize);
                let current = flow.peek().clone();
                let attempt = async {
                    match current.request_authorization(provider.as_ref()).await {
                        Ok(request) => StepOutcome::from_request(request).await,
                        Err(message) => StepOutcome::Failed(message),
                    }
                };
                if let Some(outcome) = scope.guard(attempt).await {
                    flow.write().finish_authorization(outcome);
                    busy.set(false);
                }
            });
        }
    };

    let on_register = {
        let services = services.clone();
        let scope = scope.clone();
        move |_| {
            let draft = match form.read().to_draft(services.config.network) {
                Ok(draft) => draft,
                Err(message) => {
                    notice.show(message);
                    return;
                }
            };
            let api = services.api();
            let scope = scope.clone();
            spawn(async move {
                busy.set(true);
                flow.write().clear_error(EventSetupStep::Register);
                let create = EventSetupFlow::create_event(&*api, &draft);
                if let Some(created) = scope.guard(create).await {
                    flow.write().finish_registration(created);
                    busy.set(false);
                }
            });
        }
    };

    let on_pay = {
        let services = services.clone();
        let scope = scope.clone();
        move |_| {
            let Some(provider) = services.registry.active().provider() else {
                notice.show("Connect a wallet first");
                return;
            };
            let api = services.api();
            let scope = scope.clone();
            spawn(async move {
                busy.set(true);
                flow.write().clear_error(EventSetupStep::Pay);
                let current = flow.peek().clone();
                let event_id = current.event().map(|e| e.event_id);
                let attempt = async {
                    let outcome = match current.request_payment(provider.as_ref()).await {
                        Ok(request) => {
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
                    };
                    EventSetupFlow::verify_payment(&*api, event_id, outcome).await
                };
                if let Some(result) = scope.guard(attempt).await {
                    flow.write().finish_payment(result);
                    busy.set(false);
                }
            });
        }
    };

    let current = flow.read().clone();
    let active = current.workflow().active_step();
    let is_busy = *busy.read();
    let fields = form.read().clone();
    let deposit = current
        .event()
        .map(|e| format!("{} XRP", drops_to_xrp(e.deposit.amount_drops)));
    let minter = current
        .context()
        .platform
        .as_ref()
        .map(|p| p.minter.clone())
        .unwrap_or_default();

    rsx! {
        div { class: "event-setup card",
            div { class: "dialog-header",
                h2 { "Create an event" }
                button { class: "close", onclick: move |_| on_close.call(()), "×" }
            }

            {step_list(current.workflow())}

            if let Some((deep, web)) = pending.read().clone() {
                SigningLinks { deep_link: deep, web_link: web }
            }

            {match active {
                Some(EventSetupStep::Authorize) => rsx! {
                    if current.context().connected {
                        p { "Allow the platform account to mint NFTs for you." }
                        if !minter.is_empty() {
                            p { class: "mono", "Minter: {minter}" }
                        }
                        button {
                            disabled: is_busy || minter.is_empty(),
                            onclick: on_authorize,
                            "Authorize minter"
                        }
                    } else {
                        p { "Connect a wallet and sign in to continue." }
                    }
                },
                Some(EventSetupStep::Register) => rsx! {
                    div { class: "form-group",
                        label { "Title" }
                        input {
                            value: "{fields.title}",
                            oninput: move |evt| form.write().title = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Description" }
                        textarea {
                            value: "{fields.description}",
                            oninput: move |evt| form.write().description = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Location" }
                        input {
                            value: "{fields.location}",
                            oninput: move |evt| form.write().location = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Image URL" }
                        input {
                            r#type: "url",
                            value: "{fields.image_url}",
                            oninput: move |evt| form.write().image_url = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Number of NFTs" }
                        input {
                            r#type: "number",
                            min: "1",
                            value: "{fields.token_count}",
                            oninput: move |evt| form.write().token_count = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Starts" }
                        input {
                            r#type: "datetime-local",
                            value: "{fields.date_start}",
                            oninput: move |evt| form.write().date_start = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label { "Ends" }
                        input {
                            r#type: "datetime-local",
                            value: "{fields.date_end}",
                            oninput: move |evt| form.write().date_end = evt.value(),
                        }
                    }
                    div { class: "form-group",
                        label {
                            input {
                                r#type: "checkbox",
                                checked: fields.is_managed,
                                onchange: move |evt| form.write().is_managed = evt.checked(),
                            }
                            " Let the platform distribute NFTs to attendees"
                        }
                    }
                    button {
                        disabled: is_busy,
                        onclick: on_register,
                        "Register event"
                    }
                },
                Some(EventSetupStep::Pay) => rsx! {
                    p { "Pay the deposit to start minting." }
                    if let Some(deposit) = deposit {
                        p { class: "deposit", "Deposit: {deposit}" }
                    }
                    button {
                        disabled: is_busy,
                        onclick: on_pay,
                        "Pay deposit"
                    }
                },
                Some(EventSetupStep::Summary) => rsx! {
                    if let Some(event) = current.event() {
                        p { "Event #{event.event_id} is set up." }
                        Link { to: Route::Claim { event_id: event.event_id }, "Open the claim page" }
                    }
                    if let Some(hash) = current.payment_hash() {
                        p { class: "mono", "Deposit transaction: {hash}" }
                    }
                    button {
                        onclick: move |_| flow.write().acknowledge(),
                        "Done"
                    }
                },
                None => rsx! {
                    p { "All set." }
                    button { onclick: move |_| on_close.call(()), "Close" }
                },
            }}
        }
    }
}
