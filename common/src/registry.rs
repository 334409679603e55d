use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::connector::{Connector, EmptyConnector};
use crate::error::ConnectorError;
use crate::session::SessionStore;
use crate::wallet::WalletType;

/// The application's wallet connectors, built once at start-up and handed to
/// whoever needs them.
///
/// Exactly one connector is selected at a time; [`WalletType::Empty`] when no
/// wallet is in use. The selection is persisted so the next page load can
/// reconnect without prompting.
pub struct ConnectorRegistry {
    connectors: BTreeMap<WalletType, Rc<dyn Connector>>,
    selected: Cell<WalletType>,
    session: SessionStore,
}

impl ConnectorRegistry {
    pub fn new(session: SessionStore) -> Self {
        let mut connectors: BTreeMap<WalletType, Rc<dyn Connector>> = BTreeMap::new();
        connectors.insert(WalletType::Empty, Rc::new(EmptyConnector::new()));
        Self {
            connectors,
            selected: Cell::new(WalletType::Empty),
            session,
        }
    }

    /// Register a connector under its own wallet type, replacing any previous
    /// one of that type.
    pub fn with_connector(mut self, connector: Rc<dyn Connector>) -> Self {
        self.connectors.insert(connector.wallet_type(), connector);
        self
    }

    pub fn get(&self, wallet: WalletType) -> Option<Rc<dyn Connector>> {
        self.connectors.get(&wallet).cloned()
    }

    pub fn wallets(&self) -> impl Iterator<Item = WalletType> + '_ {
        self.connectors
            .keys()
            .copied()
            .filter(|w| *w != WalletType::Empty)
    }

    pub fn selected(&self) -> WalletType {
        self.selected.get()
    }

    /// The selected connector.
    pub fn active(&self) -> Rc<dyn Connector> {
        self.get(self.selected.get())
            .or_else(|| self.get(WalletType::Empty))
            .unwrap_or_else(|| Rc::new(EmptyConnector::new()))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Activate `wallet`, tearing down the previously selected one first.
    /// If a switch fails, the selection falls back to `Empty`.
    pub async fn connect(&self, wallet: WalletType) -> Result<(), ConnectorError> {
        let connector = self.get(wallet).ok_or(ConnectorError::NotInstalled)?;

        let previous = self.selected.get();
        let switching = previous != wallet;
        if switching {
            if let Err(err) = self.active().deactivate().await {
                tracing::warn!(%err, wallet = %previous, "failed to deactivate previous wallet");
            }
        }

        if let Err(err) = connector.activate().await {
            // The previous wallet is gone; nothing is connected any more.
            if switching {
                self.select(WalletType::Empty);
            }
            return Err(err);
        }
        self.select(wallet);
        Ok(())
    }

    /// Reconnect the persisted wallet, if any. Forgets the choice when the
    /// session can no longer be restored.
    pub async fn restore_selection(&self) -> Result<bool, ConnectorError> {
        let Some(wallet) = self.session.last_wallet() else {
            return Ok(false);
        };
        let Some(connector) = self.get(wallet) else {
            self.session.set_last_wallet(None);
            return Ok(false);
        };

        match connector.connect_eagerly().await {
            Ok(true) => {
                tracing::info!(%wallet, "restored wallet session");
                self.selected.set(wallet);
                Ok(true)
            }
            Ok(false) => {
                self.session.set_last_wallet(None);
                Ok(false)
            }
            Err(err) => {
                self.session.set_last_wallet(None);
                Err(err)
            }
        }
    }

    /// Deactivate the selected wallet and forget the choice.
    pub async fn disconnect(&self) -> Result<(), ConnectorError> {
        let result = self.active().deactivate().await;
        self.select(WalletType::Empty);
        result
    }

    /// Mark `wallet` as selected and persist the choice.
    pub fn select(&self, wallet: WalletType) {
        self.selected.set(wallet);
        self.session.set_last_wallet(Some(wallet));
    }
}
