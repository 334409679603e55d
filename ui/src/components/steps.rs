use dioxus::prelude::*;

use poap_common::workflow::{Workflow, WorkflowStep};

/// Progress header for a workflow: one entry per step, the active one
/// highlighted, errors shown under their step.
pub fn step_list<S: WorkflowStep>(workflow: &Workflow<S>) -> Element {
    let active = workflow.active_step();
    let items: Vec<(String, &'static str, Option<String>)> = workflow
        .steps()
        .enumerate()
        .map(|(i, (step, status))| {
            let class = if status.complete {
                "step step-complete"
            } else if Some(step) == active {
                "step step-active"
            } else {
                "step"
            };
            (
                format!("{}. {}", i + 1, step.label()),
                class,
                status.error.clone(),
            )
        })
        .collect();

    rsx! {
        ol { class: "workflow-steps",
            for (label, class, error) in items {
                li { class: "{class}",
                    span { "{label}" }
                    if let Some(error) = error {
                        p { class: "field-error", "{error}" }
                    }
                }
            }
        }
    }
}

/// "Open in Xumm" links for a pending signing request.
#[component]
pub fn SigningLinks(deep_link: String, web_link: String) -> Element {
    rsx! {
        div { class: "signing-pending",
            p { "Confirm the request in your wallet." }
            a { href: "{deep_link}", class: "button", "Open in Xumm" }
            a { href: "{web_link}", target: "_blank", "Show QR code" }
        }
    }
}
