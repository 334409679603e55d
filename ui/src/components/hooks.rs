use std::rc::Rc;

use dioxus::prelude::*;

use poap_common::registry::ConnectorRegistry;
use poap_common::scope::TaskScope;
use poap_common::state::{StateSnapshot, Subscription};
use poap_common::wallet::WalletType;

/// The selected wallet and its connection state, as seen by components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletStatus {
    pub wallet: WalletType,
    pub snapshot: StateSnapshot,
}

impl WalletStatus {
    pub fn of(registry: &ConnectorRegistry) -> Self {
        Self {
            wallet: registry.selected(),
            snapshot: registry.active().state().snapshot(),
        }
    }

    pub fn account(&self) -> Option<&str> {
        if self.snapshot.is_active() {
            self.snapshot.account.as_deref()
        } else {
            None
        }
    }
}

/// Mirror every connector's state into a `Signal<WalletStatus>` context.
pub fn use_wallet_status_provider(registry: Rc<ConnectorRegistry>) -> Signal<WalletStatus> {
    let status = use_context_provider(|| Signal::new(WalletStatus::of(&registry)));

    use_hook(move || {
        let weak = Rc::downgrade(&registry);
        let subscriptions: Vec<Subscription> = WalletType::ALL
            .iter()
            .filter_map(|wallet| registry.get(*wallet))
            .map(|connector| {
                let weak = weak.clone();
                connector.state().subscribe(move |_| {
                    if let Some(registry) = weak.upgrade() {
                        let mut status = status;
                        status.set(WalletStatus::of(&registry));
                    }
                })
            })
            .collect();
        Rc::new(subscriptions)
    });

    status
}

pub fn use_wallet_status() -> Signal<WalletStatus> {
    use_context::<Signal<WalletStatus>>()
}

/// Re-read the selection after the registry changed it.
pub fn refresh_wallet_status(mut status: Signal<WalletStatus>, registry: &ConnectorRegistry) {
    status.set(WalletStatus::of(registry));
}

/// Account holding a backend token, if any.
#[derive(Clone, Copy)]
pub struct SignedIn(pub Signal<Option<String>>);

impl SignedIn {
    pub fn account(&self) -> Option<String> {
        self.0.read().clone()
    }

    pub fn set(mut self, account: Option<String>) {
        self.0.set(account);
    }
}

pub fn use_signed_in_provider() -> SignedIn {
    use_context_provider(|| SignedIn(Signal::new(None)))
}

pub fn use_signed_in() -> SignedIn {
    use_context::<SignedIn>()
}

/// A [`TaskScope`] closed when the calling component unmounts.
pub fn use_task_scope() -> Rc<TaskScope> {
    let scope = use_hook(|| Rc::new(TaskScope::new()));
    let closing = Rc::clone(&scope);
    use_drop(move || closing.close());
    scope
}

/// Transient message shown at the top of the page.
#[derive(Clone, Copy)]
pub struct Notice(pub Signal<Option<String>>);

impl Notice {
    pub fn show(mut self, message: impl Into<String>) {
        self.0.set(Some(message.into()));
    }

    pub fn dismiss(mut self) {
        self.0.set(None);
    }
}

pub fn use_notice_provider() -> Notice {
    use_context_provider(|| Notice(Signal::new(None)))
}

pub fn use_notice() -> Notice {
    use_context::<Notice>()
}

/// Wait `ms` milliseconds. Never resolves outside the browser.
pub async fn sleep_ms(ms: u32) {
    #[cfg(target_family = "wasm")]
    gloo_timers::future::TimeoutFuture::new(ms).await;
    #[cfg(not(target_family = "wasm"))]
    {
        let _ = ms;
        std::future::pending::<()>().await;
    }
}
