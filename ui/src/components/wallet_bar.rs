use dioxus::prelude::*;

use poap_common::wallet::WalletType;

use super::hooks::{
    refresh_wallet_status, use_notice, use_signed_in, use_wallet_status, Notice, SignedIn,
    WalletStatus,
};
use super::services::{use_services, Services};

/// Connect the selected wallet, then log in to the backend with it.
async fn connect(
    services: Services,
    wallet: WalletType,
    status: Signal<WalletStatus>,
    signed_in: SignedIn,
    notice: Notice,
) {
    if let Err(err) = services.registry.connect(wallet).await {
        refresh_wallet_status(status, &services.registry);
        notice.show(format!("{}: {err}", wallet.display_name()));
        return;
    }
    refresh_wallet_status(status, &services.registry);
    sign_in(&services, signed_in, notice).await;
}

/// Log in to the backend as the connected account.
pub async fn sign_in(services: &Services, signed_in: SignedIn, notice: Notice) {
    let connector = services.registry.active();
    let (Some(account), Some(provider)) = (connector.state().account(), connector.provider())
    else {
        return;
    };
    match services
        .auth
        .ensure(&account, connector.wallet_type(), provider.as_ref())
        .await
    {
        Ok(()) => signed_in.set(Some(account)),
        Err(err) => {
            signed_in.set(None);
            notice.show(format!("Login failed: {err}"));
        }
    }
}

async fn disconnect(
    services: Services,
    status: Signal<WalletStatus>,
    signed_in: SignedIn,
    notice: Notice,
) {
    if let Some(account) = signed_in.account() {
        services.auth.logout(&account).await;
    }
    signed_in.set(None);
    if let Err(err) = services.registry.disconnect().await {
        notice.show(err.to_string());
    }
    refresh_wallet_status(status, &services.registry);
}

fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[component]
pub fn WalletBar() -> Element {
    let services = use_services();
    let status = use_wallet_status();
    let signed_in = use_signed_in();
    let notice = use_notice();
    let mut busy = use_signal(|| false);

    let current = status.read().clone();
    let wallets: Vec<WalletType> = services.registry.wallets().collect();
    let is_busy = *busy.read() || current.snapshot.activating;
    let needs_login = current
        .account()
        .is_some_and(|account| signed_in.account().as_deref() != Some(account));

    rsx! {
        div { class: "wallet-bar",
            if let Some(account) = current.account() {
                span { class: "wallet-name", "{current.wallet.display_name()}" }
                span { class: "wallet-account mono", title: "{account}", "{short_address(account)}" }
                if let Some(network) = current.snapshot.network_id {
                    span { class: "wallet-network", "{network}" }
                }
                if needs_login {
                    button {
                        disabled: is_busy,
                        onclick: {
                            let services = services.clone();
                            move |_| {
                                let services = services.clone();
                                spawn(async move {
                                    busy.set(true);
                                    sign_in(&services, signed_in, notice).await;
                                    busy.set(false);
                                });
                            }
                        },
                        "Sign in"
                    }
                }
                button {
                    disabled: is_busy,
                    onclick: {
                        let services = services.clone();
                        move |_| {
                            let services = services.clone();
                            spawn(async move {
                                busy.set(true);
                                disconnect(services, status, signed_in, notice).await;
                                busy.set(false);
                            });
                        }
                    },
                    "Disconnect"
                }
            } else if wallets.is_empty() {
                span { class: "wallet-hint", "No supported wallet found in this browser" }
            } else {
                if is_busy {
                    span { class: "wallet-hint", "Waiting for wallet…" }
                }
                for wallet in wallets {
                    button {
                        key: "{wallet.as_str()}",
                        disabled: is_busy,
                        onclick: {
                            let services = services.clone();
                            move |_| {
                                let services = services.clone();
                                spawn(async move {
                                    busy.set(true);
                                    connect(services, wallet, status, signed_in, notice).await;
                                    busy.set(false);
                                });
                            }
                        },
                        "Connect {wallet.display_name()}"
                    }
                }
            }
        }
    }
}
