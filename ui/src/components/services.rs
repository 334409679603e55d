use std::rc::Rc;

use dioxus::prelude::*;

use poap_api::{ApiClient, AuthSession};
use poap_common::config::AppConfig;
use poap_common::registry::ConnectorRegistry;
use poap_common::session::{KeyValueStore, MemoryStore, SessionStore};

/// Long-lived objects shared by every component through context.
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub registry: Rc<ConnectorRegistry>,
    pub auth: Rc<AuthSession>,
}

impl Services {
    /// Wire up configuration, storage, the API client and the wallet
    /// connectors.
    pub fn build() -> Result<Self, String> {
        let config = load_config();
        tracing::info!(api = %config.api_url, network = %config.network, "starting");

        let session = SessionStore::new(open_store());
        let api = ApiClient::from_config(&config).map_err(|e| e.to_string())?;
        let auth = AuthSession::new(Rc::new(api), session.clone());
        let registry = register_wallets(ConnectorRegistry::new(session), &config);

        Ok(Self {
            config,
            registry: Rc::new(registry),
            auth: Rc::new(auth),
        })
    }

    pub fn api(&self) -> Rc<ApiClient> {
        Rc::clone(self.auth.client())
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry) && Rc::ptr_eq(&self.auth, &other.auth)
    }
}

/// Compile-time settings, with the API URL overridable by `?api=<url>`.
fn load_config() -> AppConfig {
    let config = AppConfig::from_env();
    #[cfg(target_family = "wasm")]
    if let Some(api) = super::browser::query_param("api") {
        return config.with_api_url(&api);
    }
    config
}

fn open_store() -> Rc<dyn KeyValueStore> {
    #[cfg(target_family = "wasm")]
    if let Some(storage) = super::browser::SessionStorage::open() {
        return Rc::new(storage);
    }
    Rc::new(MemoryStore::new())
}

#[cfg(target_family = "wasm")]
fn register_wallets(registry: ConnectorRegistry, config: &AppConfig) -> ConnectorRegistry {
    use poap_common::gem::GemConnector;
    use poap_common::xumm::XummConnector;

    use super::wallet_sdk::{BrowserGem, BrowserXumm};

    let registry = registry.with_connector(Rc::new(GemConnector::new(BrowserGem)));
    match BrowserXumm::init(config.xumm_api_key.as_deref()) {
        Some(xumm) => registry.with_connector(Rc::new(XummConnector::new(xumm))),
        None => {
            tracing::warn!("Xumm unavailable: SDK not loaded or POAP_XUMM_API_KEY unset");
            registry
        }
    }
}

/// Wallet SDKs only exist in the browser.
#[cfg(not(target_family = "wasm"))]
fn register_wallets(registry: ConnectorRegistry, _config: &AppConfig) -> ConnectorRegistry {
    registry
}

pub fn use_services() -> Services {
    use_context::<Services>()
}
